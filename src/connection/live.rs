//! Live console session against a robot

use std::sync::Arc;
use std::sync::atomic::Ordering;

use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tracing::{debug, info, warn};

use super::{ConsoleControl, SessionEvent, SessionShared, SessionState};
use crate::Result;
use crate::config::ConsoleConfig;
use crate::connector::{Connector, RobotConnector};
use crate::driver::Driver;

/// Cloneable control and observation handle for a session
///
/// Handles never keep the reconnect loop alive on their own: stopping the
/// owning [`ConsoleSession`] (or dropping it) ends the loop for every handle.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    shared: Arc<SessionShared>,
}

impl SessionHandle {
    /// Subscribe to records and connectivity changes
    ///
    /// Only events published after this call are delivered. The stream ends
    /// once the session is stopped and its loop has published its final
    /// events. A subscriber that falls more than
    /// [`EVENT_CAPACITY`](super::EVENT_CAPACITY) events behind skips the
    /// oldest ones.
    pub fn subscribe(&self) -> impl Stream<Item = SessionEvent> + Send + 'static {
        let rx = match self.shared.event_sender() {
            Some(events) => events.subscribe(),
            None => {
                // Already stopped: hand out a receiver whose sender is gone
                let (closed, rx) = broadcast::channel(1);
                drop(closed);
                rx
            }
        };

        BroadcastStream::new(rx).filter_map(|event| async move {
            match event {
                Ok(event) => Some(event),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Session subscriber lagged, events dropped");
                    None
                }
            }
        })
    }

    /// Stream of loop state changes, starting with the current state
    pub fn state_updates(&self) -> impl Stream<Item = SessionState> + Send + 'static {
        WatchStream::new(self.shared.state.subscribe())
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.borrow()
    }

    pub fn auto_reconnect(&self) -> bool {
        self.shared.auto_reconnect.load(Ordering::SeqCst)
    }

    pub fn discard(&self) -> bool {
        self.shared.discard.load(Ordering::SeqCst)
    }

    pub fn team_number(&self) -> u32 {
        self.shared.team_number.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// Stop the session for good
    ///
    /// Closes the live socket, ends the reconnect loop, and ends every
    /// subscriber stream. Irreversible.
    pub fn stop(&self) {
        if !self.shared.cancel.is_cancelled() {
            info!("Stopping console session");
        }
        self.shared.cancel.cancel();
        self.shared.close_events();
    }
}

impl ConsoleControl for SessionHandle {
    fn is_connected(&self) -> bool {
        self.shared.is_connected()
    }

    fn set_discard(&self, discard: bool) {
        debug!(discard, "Setting discard mode");
        self.shared.discard.store(discard, Ordering::SeqCst);
    }

    fn set_auto_reconnect(&self, enabled: bool) {
        debug!(enabled, "Setting auto-reconnect");
        self.shared.auto_reconnect.store(enabled, Ordering::SeqCst);
        if enabled {
            self.shared.resume.set();
        }
    }

    fn set_team_number(&self, team_number: u32) {
        debug!(team_number, "Setting team number for next connection");
        self.shared.team_number.store(team_number, Ordering::SeqCst);
    }

    fn disconnect(&self) {
        debug!("Disconnect requested");
        self.shared.disconnects.send_modify(|generation| *generation += 1);
    }
}

/// A long-lived, reconnecting console client
///
/// ```rust,no_run
/// use riolog::{ConsoleConfig, ConsoleSession, SessionEvent};
/// use futures::StreamExt;
///
/// # async fn run() -> riolog::Result<()> {
/// let config = ConsoleConfig { team_number: 254, ..ConsoleConfig::default() };
/// let mut session = ConsoleSession::new(config)?;
/// let mut events = Box::pin(session.subscribe());
/// session.start_listening();
///
/// while let Some(event) = events.next().await {
///     if let SessionEvent::Record(record) = event {
///         println!("{:?}", record);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct ConsoleSession<C: Connector = RobotConnector> {
    handle: SessionHandle,

    /// Consumed when the loop is spawned
    connector: Option<C>,

    task: Option<JoinHandle<()>>,
}

impl ConsoleSession<RobotConnector> {
    /// Session that races the configured candidates for the robot
    pub fn new(config: ConsoleConfig) -> Result<Self> {
        config.validate()?;
        let team_number = config.team_number;
        Ok(Self::with_connector(RobotConnector::new(Arc::new(config)), team_number))
    }
}

impl<C: Connector> ConsoleSession<C> {
    /// Session over any connection source
    pub fn with_connector(connector: C, team_number: u32) -> Self {
        let shared = Arc::new(SessionShared::new(team_number));
        Self { handle: SessionHandle { shared }, connector: Some(connector), task: None }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self) -> impl Stream<Item = SessionEvent> + Send + 'static {
        self.handle.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.handle.state()
    }

    pub fn state_updates(&self) -> impl Stream<Item = SessionState> + Send + 'static {
        self.handle.state_updates()
    }

    /// Start the reconnect loop
    ///
    /// Must be called from within a tokio runtime. Calling it again, or after
    /// `stop`, has no effect.
    pub fn start_listening(&mut self) {
        let Some(connector) = self.connector.take() else {
            debug!("Console session already listening");
            return;
        };
        self.task = Driver::spawn(connector, Arc::clone(&self.handle.shared));
    }

    /// Stop the session for good; see [`SessionHandle::stop`]
    pub fn stop(&self) {
        self.handle.stop();
    }

    /// Stop the session and wait for the loop to finish
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!("Console loop task failed: {}", e);
        }
    }
}

impl<C: Connector> ConsoleControl for ConsoleSession<C> {
    fn is_connected(&self) -> bool {
        self.handle.is_connected()
    }

    fn set_discard(&self, discard: bool) {
        self.handle.set_discard(discard);
    }

    fn set_auto_reconnect(&self, enabled: bool) {
        self.handle.set_auto_reconnect(enabled);
    }

    fn set_team_number(&self, team_number: u32) {
        self.handle.set_team_number(team_number);
    }

    fn disconnect(&self) {
        self.handle.disconnect();
    }
}

impl<C: Connector> Drop for ConsoleSession<C> {
    fn drop(&mut self) {
        debug!("Dropping console session");
        self.handle.stop();
    }
}
