//! Display message contract
//!
//! Messages cross the display boundary as JSON objects of the form
//! `{"type": <name>, "message": <payload>}`.

use serde::{Deserialize, Serialize};

use crate::types::LogRecord;

/// Session to display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum OutboundMessage {
    /// One record, shown as it arrives
    New(LogRecord),

    /// Records withheld while hidden or paused, oldest first
    Batch(Vec<LogRecord>),

    /// Number of records held by an active pause
    PauseUpdate(usize),

    ConnectionChanged(bool),
}

/// Display to session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum InboundMessage {
    Discard(bool),
    Pause(bool),

    /// Records to save, each serialized as a JSON record object
    Save(Vec<String>),

    /// Connect/disconnect toggle; `false` also drops the live socket
    Reconnect(bool),

    /// New team number; display inputs are numeric and may be fractional
    ChangeNumber(f64),
}

/// Lifecycle events raised by a display
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    /// The display became visible and receptive
    Active,

    /// The display went away; the bridge ends
    Disposed,

    Message(InboundMessage),
}

impl InboundMessage {
    /// Parse one JSON message from a display
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl OutboundMessage {
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
