//! Driver spawns and runs a session's reconnect loop

use std::sync::Arc;
use std::sync::atomic::Ordering;

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::connection::{SessionEvent, SessionShared, SessionState};
use crate::connector::Connector;
use crate::stream::FrameStream;

/// Why a live connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    Stopped,
    Disconnected,
    Remote,
    SocketError,
    MalformedFrame,
}

/// Driver spawns and manages the reconnect loop task
///
/// The loop owns the connector and at most one live stream. Everything it
/// publishes goes out on the session's broadcast channel; everything it
/// obeys (auto-reconnect, discard, team number, disconnect, stop) is read from
/// the shared session state.
pub struct Driver;

impl Driver {
    /// Spawn the reconnect loop for `shared`
    ///
    /// Returns `None` when the session was already stopped.
    pub(crate) fn spawn<C>(connector: C, shared: Arc<SessionShared>) -> Option<JoinHandle<()>>
    where
        C: Connector,
    {
        let events = shared.event_sender()?;
        if shared.cancel.is_cancelled() {
            return None;
        }
        Some(tokio::spawn(async move {
            Self::listen_loop(connector, shared, events).await;
        }))
    }

    async fn listen_loop<C>(
        connector: C,
        shared: Arc<SessionShared>,
        events: broadcast::Sender<SessionEvent>,
    ) where
        C: Connector,
    {
        info!("Console listen loop started");
        let mut connections = 0u64;

        loop {
            if !Self::await_auto_reconnect(&shared).await {
                break;
            }

            let team_number = shared.team_number.load(Ordering::SeqCst);
            shared.state.send_replace(SessionState::Connecting);
            trace!(team_number, "Attempting connection");

            let stream = tokio::select! {
                _ = shared.cancel.cancelled() => None,
                stream = connector.connect(team_number) => stream,
            };
            if shared.cancel.is_cancelled() {
                break;
            }

            let Some(stream) = stream else {
                trace!("No connection this cycle");
                shared.state.send_replace(SessionState::Idle);
                continue;
            };

            connections += 1;
            Self::run_connection(stream, &shared, &events).await;
        }

        shared.state.send_replace(SessionState::Stopped);
        info!("Console listen loop ended after {} connections", connections);
    }

    /// Suspend while auto-reconnect is off; `false` means the session stopped
    async fn await_auto_reconnect(shared: &SessionShared) -> bool {
        if shared.cancel.is_cancelled() {
            return false;
        }

        while !shared.auto_reconnect.load(Ordering::SeqCst) {
            shared.state.send_replace(SessionState::Idle);
            debug!("Auto-reconnect disabled, suspending");
            tokio::select! {
                _ = shared.cancel.cancelled() => return false,
                _ = shared.resume.wait() => {}
            }
            shared.resume.reset();
        }

        !shared.cancel.is_cancelled()
    }

    /// Read one live stream until it closes for any reason
    async fn run_connection<S>(
        stream: S,
        shared: &SessionShared,
        events: &broadcast::Sender<SessionEvent>,
    ) where
        S: AsyncRead + Unpin,
    {
        // Subscribing marks the current generation seen, so only a disconnect
        // issued while this connection is live closes it
        let mut disconnects = shared.disconnects.subscribe();
        let mut frames = FrameStream::new(stream);
        let mut frame_count = 0u64;

        shared.state.send_replace(SessionState::Connected);
        let _ = events.send(SessionEvent::ConnectionChanged(true));
        info!("Console connected");

        let reason = loop {
            tokio::select! {
                _ = shared.cancel.cancelled() => break CloseReason::Stopped,
                _ = disconnects.changed() => break CloseReason::Disconnected,
                next = frames.next() => match next {
                    Some(Ok(frame)) => {
                        frame_count += 1;
                        if let Err(e) = shared.dispatch(&frame, events) {
                            warn!("Dropping connection after malformed frame: {}", e);
                            break CloseReason::MalformedFrame;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("Console socket error: {}", e);
                        break CloseReason::SocketError;
                    }
                    None => break CloseReason::Remote,
                },
            }
        };

        shared.state.send_replace(SessionState::Closing);
        let bytes = frames.bytes_read();
        drop(frames);

        shared.state.send_replace(SessionState::Idle);
        let _ = events.send(SessionEvent::ConnectionChanged(false));
        info!(?reason, frames = frame_count, bytes, "Console disconnected");
    }
}
