//! Console client for FRC robot controllers.
//!
//! RioLog connects to the console port a roboRIO exposes, reassembles the
//! framed byte stream into typed print, warning, and error records, and hands
//! them to a display. The connection is long-lived: when the robot reboots or
//! the network drops, the session races every known address for the team
//! again until one answers.
//!
//! # Features
//!
//! - **Connection race**: mDNS names, static addresses, and the driver
//!   station's report are tried in parallel; the first socket wins
//! - **Fragmentation-safe decoding**: frames split across reads, or packed
//!   into one, decode the same
//! - **Display bridge**: pause, hidden-display buffering, and saving, for any
//!   surface that can show a message
//! - **Saved logs**: replay a saved console through the same display path
//!
//! ## Example (live robot)
//!
//! ```rust,no_run
//! use riolog::{RioLog, SessionEvent};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> riolog::Result<()> {
//!     let mut session = RioLog::listen(1234)?;
//!     let mut events = Box::pin(session.subscribe());
//!     session.start_listening();
//!
//!     while let Some(event) = events.next().await {
//!         match event {
//!             SessionEvent::Record(record) => println!("{}", riolog::format_record(&record)),
//!             SessionEvent::ConnectionChanged(up) => println!("connected: {up}"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Wire protocol and connection
pub mod config;
pub mod connector;
pub mod protocol;
pub mod stream;

// Session and presentation
pub mod bridge;
pub mod connection;
pub mod display;
pub(crate) mod driver;
pub mod saved_log;

// Core exports
pub use error::*;
pub use types::*;

pub use bridge::{
    DisplayEvent, DisplaySurface, InboundMessage, OutboundMessage, PresentationBridge,
};
pub use config::ConsoleConfig;
pub use connection::{
    ConsoleControl, ConsoleSession, ReplaySource, SessionEvent, SessionHandle, SessionState,
};
pub use connector::{Connector, RobotConnector};
pub use display::{TextDisplay, format_record};
pub use saved_log::{load_records, save_records};

/// Unified entry point for console sources.
///
/// # Examples
///
/// ## Live robot
/// ```rust,no_run
/// use riolog::RioLog;
///
/// #[tokio::main]
/// async fn main() -> riolog::Result<()> {
///     let mut session = RioLog::listen(1234)?;
///     session.start_listening();
///     Ok(())
/// }
/// ```
///
/// ## Saved log
/// ```rust,no_run
/// use riolog::RioLog;
///
/// fn main() -> riolog::Result<()> {
///     let replay = RioLog::open("console.json")?;
///     println!("{} records", replay.records().len());
///     Ok(())
/// }
/// ```
pub struct RioLog;

impl RioLog {
    /// Session for `team_number` with the default candidate set.
    ///
    /// The session is idle until [`ConsoleSession::start_listening`] is called.
    pub fn listen(team_number: u32) -> Result<ConsoleSession> {
        Self::listen_with(ConsoleConfig { team_number, ..ConsoleConfig::default() })
    }

    /// Session using a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RioLogError::Config`] if the configuration fails validation.
    pub fn listen_with(config: ConsoleConfig) -> Result<ConsoleSession> {
        ConsoleSession::new(config)
    }

    /// Open a saved console log.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a saved log.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<ReplaySource> {
        ReplaySource::open(path)
    }
}
