//! Plain-text display surface

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::bridge::{DisplaySurface, OutboundMessage};
use crate::saved_log::save_records;
use crate::types::{LogRecord, RecordKind};

/// One record as a line of console text
///
/// Errors and warnings add their location and, when present, an indented call
/// stack.
pub fn format_record(record: &LogRecord) -> String {
    match record {
        LogRecord::Print(print) => format!("[{:>9.3}] {}", print.timestamp, print.line),
        LogRecord::Error(error) => {
            let label = match error.kind() {
                RecordKind::Error => "ERROR",
                _ => "WARNING",
            };
            let mut text = format!(
                "[{:>9.3}] {} {}: {} ({})",
                error.timestamp, label, error.error_code, error.details, error.location
            );
            if error.occurrence_count > 1 {
                text.push_str(&format!(" x{}", error.occurrence_count));
            }
            for frame in error.call_stack.lines().filter(|line| !line.trim().is_empty()) {
                text.push_str("\n            ");
                text.push_str(frame.trim());
            }
            text
        }
    }
}

/// Writes console output as text to any async writer
///
/// Keeps every record it has shown so the whole session can be saved at the
/// end. Saves go to the configured path; without one, saving fails.
pub struct TextDisplay<W> {
    writer: W,
    save_path: Option<PathBuf>,
    shown: Vec<LogRecord>,
}

impl<W> TextDisplay<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self { writer, save_path: None, shown: Vec::new() }
    }

    pub fn with_save_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = Some(path.into());
        self
    }

    /// Records written so far, in display order
    pub fn shown(&self) -> &[LogRecord] {
        &self.shown
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    async fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    async fn show(&mut self, record: &LogRecord) -> std::io::Result<()> {
        self.write_line(&format_record(record)).await?;
        self.shown.push(record.clone());
        Ok(())
    }

    async fn render(&mut self, message: &OutboundMessage) -> std::io::Result<()> {
        match message {
            OutboundMessage::New(record) => self.show(record).await,
            OutboundMessage::Batch(records) => {
                for record in records {
                    self.show(record).await?;
                }
                Ok(())
            }
            OutboundMessage::PauseUpdate(held) => {
                self.write_line(&format!("-- paused, {} records held --", held)).await
            }
            OutboundMessage::ConnectionChanged(true) => {
                self.write_line("-- connected to robot --").await
            }
            OutboundMessage::ConnectionChanged(false) => {
                self.write_line("-- disconnected --").await
            }
        }
    }
}

#[async_trait]
impl<W> DisplaySurface for TextDisplay<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn post_message(&mut self, message: &OutboundMessage) -> bool {
        match self.render(message).await {
            Ok(()) => true,
            Err(e) => {
                debug!("Text display write failed: {}", e);
                false
            }
        }
    }

    async fn handle_save(&mut self, records: Vec<LogRecord>) -> bool {
        let Some(path) = &self.save_path else {
            warn!("No save path configured, dropping {} records", records.len());
            return false;
        };
        match save_records(path, &records) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save console log: {}", e);
                false
            }
        }
    }
}
