//! Saved console logs
//!
//! A saved log is a JSON array of records with camelCase field names, the same
//! shape the display sends back when asked to save. Error records carry their
//! error fields; print records carry `line`. Every record is written with its
//! `messageType`, which is ignored when reading.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::types::LogRecord;
use crate::{Result, RioLogError};

/// Write `records` to `path` as pretty-printed JSON
pub fn save_records<P: AsRef<Path>>(path: P, records: &[LogRecord]) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json).map_err(|e| RioLogError::save_failed(path, e))?;
    info!(count = records.len(), "Saved console log to {}", path.display());
    Ok(())
}

/// Read a saved log from `path`
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<LogRecord>> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)?;
    let records: Vec<LogRecord> = serde_json::from_str(&json)?;
    debug!(count = records.len(), "Loaded console log from {}", path.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ErrorRecord, PrintRecord, RecordKind};

    fn sample() -> Vec<LogRecord> {
        vec![
            LogRecord::Print(PrintRecord { timestamp: 1.5, seq_number: 1, line: "hello".into() }),
            LogRecord::Error(ErrorRecord {
                timestamp: 2.25,
                seq_number: 2,
                occurrence_count: 1,
                error_code: -44,
                flags: 1,
                details: "Loop time overrun".into(),
                location: "Robot.java:12".into(),
                call_stack: "at frc.Robot".into(),
            }),
        ]
    }

    #[test]
    fn save_then_load_keeps_records() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("console.json");

        save_records(&path, &sample())?;
        assert_eq!(load_records(&path)?, sample());
        Ok(())
    }

    #[test]
    fn saved_file_uses_camel_case() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("console.json");
        save_records(&path, &sample())?;

        let text = std::fs::read_to_string(&path)?;
        assert!(text.contains("\"seqNumber\""));
        assert!(text.contains("\"numOccur\""));
        assert!(text.contains("\"callStack\""));

        let saved: serde_json::Value = serde_json::from_str(&text)?;
        assert_eq!(saved[0]["messageType"], 2);
        assert_eq!(saved[1]["messageType"], 0);
        Ok(())
    }

    #[test]
    fn loads_logs_with_negative_sequence_numbers() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("long_session.json");
        std::fs::write(
            &path,
            r#"[
                {"timestamp": 1.0, "seqNumber": 5, "line": "early", "messageType": 2},
                {"timestamp": 900.0, "seqNumber": -32000, "line": "wrapped", "messageType": 2}
            ]"#,
        )?;

        let records = load_records(&path)?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].seq_number(), 5);
        assert_eq!(records[1].seq_number(), 33536);
        assert_eq!(records[1].kind(), RecordKind::Print);
        Ok(())
    }

    #[test]
    fn message_type_field_is_ignored() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("external.json");
        std::fs::write(
            &path,
            r#"[{"timestamp": 3.0, "seqNumber": 9, "line": "from the driver station", "messageType": 1}]"#,
        )?;

        let records = load_records(&path)?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind(), RecordKind::Print);
        assert_eq!(records[0].seq_number(), 9);
        Ok(())
    }

    #[test]
    fn save_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("console.json");

        let err = save_records(&path, &sample()).unwrap_err();
        assert!(matches!(err, RioLogError::Save { .. }));
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(load_records(&path), Err(RioLogError::Serialization(_))));
    }
}
