//! Error types for the console client.
//!
//! Most failures in this crate never reach a caller: network trouble is folded
//! into the reconnect loop and display delivery failures are buffered. The
//! errors below surface from the pieces that can genuinely fail on their own:
//! decoding a frame, loading configuration, and saving or loading a log.
//!
//! ## Error Categories
//!
//! - **Connection Errors**: a single candidate failed to produce a socket
//! - **Decode Errors**: a frame payload was truncated or inconsistent
//! - **Config Errors**: invalid or unreadable configuration
//! - **Save Errors**: writing or reading a saved log failed
//!
//! ```rust
//! use riolog::RioLogError;
//!
//! let error = RioLogError::connection_failed("driver station reports no robot");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for console operations.
pub type Result<T, E = RioLogError> = std::result::Result<T, E>;

/// Main error type for console operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RioLogError {
    #[error("Failed to connect to robot: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Malformed frame while reading {context}: {details}")]
    Decode { context: String, details: String },

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {details}")]
    Config { path: Option<PathBuf>, details: String },

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to save log to {path}")]
    Save {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl RioLogError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            RioLogError::Connection { .. } => true,
            RioLogError::Timeout { .. } => true,
            RioLogError::Io(_) => true,
            RioLogError::Decode { .. } => false,
            RioLogError::Config { .. } => false,
            RioLogError::Serialization(_) => false,
            RioLogError::Save { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            RioLogError::Connection { .. } => vec![
                "Check that the robot is powered on and reachable",
                "Verify the configured team number",
                "Connect over USB or the robot radio",
            ],
            RioLogError::Timeout { .. } => vec![
                "Increase the connection timeout",
                "Check network latency to the robot",
            ],
            RioLogError::Decode { .. } => vec![
                "Check that robot and client protocol versions match",
                "Reconnect to start a fresh stream",
            ],
            RioLogError::Io(_) => vec![
                "Check the network connection",
                "Check file permissions",
            ],
            RioLogError::Config { .. } => vec![
                "Check the configuration file syntax",
                "Remove invalid fields to fall back to defaults",
            ],
            RioLogError::Serialization(_) => vec![
                "Verify the file is a saved RioLog JSON array",
                "Re-save the log from a live session",
            ],
            RioLogError::Save { .. } => vec![
                "Check that the destination directory exists",
                "Ensure sufficient disk space",
                "Check file permissions",
            ],
        }
    }

    /// Helper constructor for connection errors.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        RioLogError::Connection { reason: reason.into(), source: None }
    }

    /// Helper constructor for connection errors with source.
    pub fn connection_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        RioLogError::Connection { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for decode errors.
    pub fn decode_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        RioLogError::Decode { context: context.into(), details: details.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(path: Option<PathBuf>, details: impl Into<String>) -> Self {
        RioLogError::Config { path, details: details.into() }
    }

    /// Helper constructor for save failures.
    pub fn save_failed(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        RioLogError::Save { path: path.into(), source: source.into() }
    }
}
