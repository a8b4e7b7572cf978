//! Core data types shared across the console pipeline

mod frame;
mod record;

pub use frame::{ERROR_TAG, Frame, FrameKind, PRINT_TAG};
pub use record::{ErrorRecord, LogRecord, PrintRecord, RecordKind};
