//! Console sessions: live robot connections and saved-log replay
//!
//! Both kinds of session expose the same two things to a consumer: a stream of
//! [`SessionEvent`]s and a [`ConsoleControl`] surface for the toggles a display
//! offers. The presentation bridge is written against those, so it can show a
//! live robot or a saved log without knowing which.

pub mod live;
pub mod replay;
mod signal;


use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::Result;
use crate::protocol::decode_frame;
use crate::types::{Frame, LogRecord};

pub use live::{ConsoleSession, SessionHandle};
pub use replay::ReplaySource;
pub use signal::ResumeSignal;

/// Events buffered per subscriber before it starts lagging
pub const EVENT_CAPACITY: usize = 4096;

/// Something a session observer is told about
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A decoded record
    Record(LogRecord),

    /// The robot connection opened (`true`) or closed (`false`)
    ConnectionChanged(bool),
}

/// Lifecycle of a live session's reconnect loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not connected; waiting to attempt or suspended with auto-reconnect off
    Idle,
    /// A connection race is in flight
    Connecting,
    /// A socket is open and being read
    Connected,
    /// The socket is being torn down
    Closing,
    /// `stop` was called; the loop has exited for good
    Stopped,
}

/// Toggles a display can flip on a session
pub trait ConsoleControl: Send + Sync {
    fn is_connected(&self) -> bool;

    /// Drop frames before decoding while enabled
    fn set_discard(&self, discard: bool);

    /// Pause (`false`) or resume (`true`) connection attempts
    fn set_auto_reconnect(&self, enabled: bool);

    /// Target for the next connection attempt
    fn set_team_number(&self, team_number: u32);

    /// Close the live socket; the loop may reconnect
    fn disconnect(&self);
}

/// State shared between session handles and the reconnect loop task
#[derive(Debug)]
pub(crate) struct SessionShared {
    pub(crate) auto_reconnect: AtomicBool,
    pub(crate) discard: AtomicBool,
    pub(crate) team_number: AtomicU32,
    pub(crate) resume: ResumeSignal,
    /// Bumped by `disconnect`; a live connection watches for changes
    pub(crate) disconnects: watch::Sender<u64>,
    pub(crate) state: watch::Sender<SessionState>,
    /// Taken on stop so subscriber streams end once the loop finishes
    pub(crate) events: Mutex<Option<broadcast::Sender<SessionEvent>>>,
    pub(crate) cancel: CancellationToken,
}

impl SessionShared {
    pub(crate) fn new(team_number: u32) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            auto_reconnect: AtomicBool::new(true),
            discard: AtomicBool::new(false),
            team_number: AtomicU32::new(team_number),
            resume: ResumeSignal::new(),
            disconnects: watch::channel(0).0,
            state: watch::channel(SessionState::Idle).0,
            events: Mutex::new(Some(events)),
            cancel: CancellationToken::new(),
        }
    }

    pub(crate) fn event_sender(&self) -> Option<broadcast::Sender<SessionEvent>> {
        self.events.lock().ok().and_then(|events| events.clone())
    }

    pub(crate) fn close_events(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.take();
        }
    }

    pub(crate) fn is_connected(&self) -> bool {
        *self.state.borrow() == SessionState::Connected
    }

    /// Decode and publish one frame, honoring discard mode
    pub(crate) fn dispatch(
        &self,
        frame: &Frame,
        events: &broadcast::Sender<SessionEvent>,
    ) -> Result<()> {
        if self.discard.load(Ordering::Relaxed) {
            trace!(tag = frame.tag, "Discarding frame");
            return Ok(());
        }

        match decode_frame(frame)? {
            Some(record) => {
                // No subscribers is fine; records are simply not observed
                let _ = events.send(SessionEvent::Record(record));
            }
            None => debug!(tag = frame.tag, "Ignoring frame with unknown tag"),
        }
        Ok(())
    }
}
