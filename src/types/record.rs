//! Decoded log records

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Severity/category of a log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Error,
    Warning,
    Print,
}

impl RecordKind {
    /// Numeric `messageType` written alongside serialized records
    pub fn message_type(self) -> u8 {
        match self {
            RecordKind::Error => 0,
            RecordKind::Warning => 1,
            RecordKind::Print => 2,
        }
    }
}

/// Counters are unsigned on the wire but some tools save them signed, so any
/// integer is accepted and only its low 16 bits kept.
fn wrapping_u16<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    let value = i64::deserialize(deserializer)?;
    Ok(value as u16)
}

/// A console line printed by robot code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintRecord {
    /// Seconds since robot code started
    pub timestamp: f32,
    #[serde(deserialize_with = "wrapping_u16")]
    pub seq_number: u16,
    pub line: String,
}

/// An error or warning reported by the robot runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    /// Seconds since robot code started
    pub timestamp: f32,
    #[serde(deserialize_with = "wrapping_u16")]
    pub seq_number: u16,
    #[serde(rename = "numOccur", deserialize_with = "wrapping_u16")]
    pub occurrence_count: u16,
    pub error_code: i32,
    /// Bit 0 set for errors, clear for warnings
    pub flags: u8,
    pub details: String,
    pub location: String,
    pub call_stack: String,
}

impl ErrorRecord {
    /// Flag bit distinguishing errors from warnings
    pub const ERROR_FLAG: u8 = 1;

    pub fn is_error(&self) -> bool {
        self.flags & Self::ERROR_FLAG != 0
    }

    pub fn kind(&self) -> RecordKind {
        if self.is_error() { RecordKind::Error } else { RecordKind::Warning }
    }
}

/// A decoded log record
///
/// Serialized as the record object plus a `messageType` code (0 error,
/// 1 warning, 2 print) that displays render by. Saved logs mix both shapes in
/// one array, so deserialization ignores `messageType`, tries the error shape
/// first (it has strictly more required fields) and falls back to a print line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LogRecord {
    Error(ErrorRecord),
    Print(PrintRecord),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Typed<'a, T> {
    #[serde(flatten)]
    record: &'a T,
    message_type: u8,
}

impl Serialize for LogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let message_type = self.kind().message_type();
        match self {
            LogRecord::Print(record) => Typed { record, message_type }.serialize(serializer),
            LogRecord::Error(record) => Typed { record, message_type }.serialize(serializer),
        }
    }
}

impl LogRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            LogRecord::Print(_) => RecordKind::Print,
            LogRecord::Error(record) => record.kind(),
        }
    }

    pub fn timestamp(&self) -> f32 {
        match self {
            LogRecord::Print(record) => record.timestamp,
            LogRecord::Error(record) => record.timestamp,
        }
    }

    pub fn seq_number(&self) -> u16 {
        match self {
            LogRecord::Print(record) => record.seq_number,
            LogRecord::Error(record) => record.seq_number,
        }
    }
}

impl From<PrintRecord> for LogRecord {
    fn from(record: PrintRecord) -> Self {
        LogRecord::Print(record)
    }
}

impl From<ErrorRecord> for LogRecord {
    fn from(record: ErrorRecord) -> Self {
        LogRecord::Error(record)
    }
}
