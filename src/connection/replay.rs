//! Saved-log replay

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::{Stream, stream};
use tracing::{debug, info};

use super::{ConsoleControl, SessionEvent};
use crate::Result;
use crate::saved_log::load_records;
use crate::types::LogRecord;

/// A saved console log presented like a live session
///
/// Reports itself as always connected. The console toggles have nothing to act
/// on and are ignored.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    path: PathBuf,
    records: Arc<[LogRecord]>,
}

impl ReplaySource {
    /// Load a saved log
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening saved log: {}", path.display());
        let records = load_records(path)?;
        Ok(Self::from_records(path, records))
    }

    pub fn from_records(path: impl Into<PathBuf>, records: Vec<LogRecord>) -> Self {
        Self { path: path.into(), records: records.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// A connected notice followed by every record, in file order
    ///
    /// Each call replays the log from the start.
    pub fn subscribe(&self) -> impl Stream<Item = SessionEvent> + Send + 'static {
        let records = Arc::clone(&self.records);
        let replay = (0..records.len()).map(move |i| SessionEvent::Record(records[i].clone()));
        stream::iter(std::iter::once(SessionEvent::ConnectionChanged(true)).chain(replay))
    }
}

impl ConsoleControl for ReplaySource {
    fn is_connected(&self) -> bool {
        true
    }

    fn set_discard(&self, discard: bool) {
        debug!(discard, "Ignoring discard toggle for saved log");
    }

    fn set_auto_reconnect(&self, enabled: bool) {
        debug!(enabled, "Ignoring reconnect toggle for saved log");
    }

    fn set_team_number(&self, team_number: u32) {
        debug!(team_number, "Ignoring team number for saved log");
    }

    fn disconnect(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saved_log::save_records;
    use crate::types::PrintRecord;
    use futures::StreamExt;

    fn lines(n: u16) -> Vec<LogRecord> {
        (0..n)
            .map(|i| {
                LogRecord::Print(PrintRecord {
                    timestamp: i as f32 * 0.02,
                    seq_number: i,
                    line: format!("tick {i}"),
                })
            })
            .collect()
    }

    #[tokio::test]
    async fn replays_connected_then_records() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("match.json");
        save_records(&path, &lines(3))?;

        let replay = ReplaySource::open(&path)?;
        assert_eq!(replay.path(), path.as_path());
        assert!(replay.is_connected());

        let events: Vec<_> = replay.subscribe().collect().await;
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], SessionEvent::ConnectionChanged(true));
        assert_eq!(events[3], SessionEvent::Record(lines(3)[2].clone()));
        Ok(())
    }

    #[tokio::test]
    async fn each_subscription_starts_over() {
        let replay = ReplaySource::from_records("memory", lines(2));
        replay.set_discard(true);
        replay.disconnect();

        let first: Vec<_> = replay.subscribe().collect().await;
        let second: Vec<_> = replay.subscribe().collect().await;
        assert_eq!(first, second);
        assert!(replay.is_connected());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ReplaySource::open("/nonexistent/riolog/console.json").unwrap_err();
        assert!(matches!(err, crate::RioLogError::Io(_)));
    }
}
