//! Presentation bridge between a console session and a display
//!
//! The bridge decouples how fast records are produced from whether anyone is
//! looking. Records the display cannot take right now go to a bounded hidden
//! queue and are sent as one batch when the display becomes active. Records
//! that arrive while the user has paused go to a pause queue; the display only
//! sees a running count until the pause is released.

mod messages;

use std::collections::VecDeque;
use std::pin::pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::connection::{ConsoleControl, SessionEvent};
use crate::types::LogRecord;

pub use messages::{DisplayEvent, InboundMessage, OutboundMessage};

/// Default bound on the hidden queue
pub const DEFAULT_HIDDEN_CAPACITY: usize = 10_000;

/// Something that can show console output
#[async_trait]
pub trait DisplaySurface: Send {
    /// Deliver one message; `false` if the display cannot take it now
    async fn post_message(&mut self, message: &OutboundMessage) -> bool;

    /// Persist records the user asked to save; `false` on failure
    async fn handle_save(&mut self, records: Vec<LogRecord>) -> bool;
}

/// Pairs one display with one console for the display's lifetime
pub struct PresentationBridge<D, C> {
    display: D,
    console: C,
    hidden: VecDeque<LogRecord>,
    hidden_capacity: usize,
    hidden_dropped: u64,
    paused: bool,
    pause_queue: Vec<LogRecord>,
}

impl<D, C> PresentationBridge<D, C>
where
    D: DisplaySurface,
    C: ConsoleControl,
{
    pub fn new(display: D, console: C) -> Self {
        Self::with_capacity(display, console, DEFAULT_HIDDEN_CAPACITY)
    }

    pub fn with_capacity(display: D, console: C, hidden_capacity: usize) -> Self {
        Self {
            display,
            console,
            hidden: VecDeque::new(),
            hidden_capacity,
            hidden_dropped: 0,
            paused: false,
            pause_queue: Vec::new(),
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn hidden_len(&self) -> usize {
        self.hidden.len()
    }

    pub fn paused_len(&self) -> usize {
        self.pause_queue.len()
    }

    /// Records evicted from a full hidden queue
    pub fn hidden_dropped(&self) -> u64 {
        self.hidden_dropped
    }

    pub async fn on_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Record(record) => self.on_record(record).await,
            SessionEvent::ConnectionChanged(connected) => {
                self.on_connection_changed(connected).await
            }
        }
    }

    pub async fn on_record(&mut self, record: LogRecord) {
        if self.paused {
            self.pause_queue.push(record);
            let held = self.pause_queue.len();
            self.display.post_message(&OutboundMessage::PauseUpdate(held)).await;
            return;
        }

        let message = OutboundMessage::New(record);
        if !self.display.post_message(&message).await
            && let OutboundMessage::New(record) = message
        {
            self.hide(record);
        }
    }

    pub async fn on_connection_changed(&mut self, connected: bool) {
        self.display.post_message(&OutboundMessage::ConnectionChanged(connected)).await;
    }

    /// Flush the hidden queue, then restate connectivity
    pub async fn on_active(&mut self) {
        let batch = OutboundMessage::Batch(Vec::from(std::mem::take(&mut self.hidden)));
        let delivered = self.display.post_message(&batch).await;
        if let OutboundMessage::Batch(records) = batch {
            if delivered {
                debug!(count = records.len(), "Delivered hidden records");
            } else {
                self.hidden = records.into();
            }
        }

        let connected = self.console.is_connected();
        self.display.post_message(&OutboundMessage::ConnectionChanged(connected)).await;
    }

    pub async fn on_inbound(&mut self, message: InboundMessage) {
        match message {
            InboundMessage::Discard(discard) => self.console.set_discard(discard),
            InboundMessage::Pause(paused) => {
                let released = self.paused && !paused;
                self.paused = paused;
                if released {
                    self.release_paused().await;
                }
            }
            InboundMessage::Save(serialized) => self.save(serialized).await,
            InboundMessage::Reconnect(enabled) => {
                self.console.set_auto_reconnect(enabled);
                if !enabled {
                    self.console.disconnect();
                }
            }
            InboundMessage::ChangeNumber(number) => {
                if number.is_finite() && number >= 0.0 && number <= u32::MAX as f64 {
                    self.console.set_team_number(number.trunc() as u32);
                } else {
                    warn!(number, "Ignoring invalid team number");
                }
            }
        }
    }

    /// Drive the bridge until the display is disposed
    ///
    /// If the display channel closes, session events keep flowing to the
    /// display until the session stream ends too. Returns the display.
    pub async fn run<S>(mut self, events: S, mut display_events: mpsc::Receiver<DisplayEvent>) -> D
    where
        S: Stream<Item = SessionEvent> + Send,
    {
        let mut events = pin!(events);
        let mut session_open = true;
        let mut display_open = true;

        while session_open || display_open {
            tokio::select! {
                event = events.next(), if session_open => match event {
                    Some(event) => self.on_session_event(event).await,
                    None => {
                        debug!("Session event stream ended");
                        session_open = false;
                    }
                },
                event = display_events.recv(), if display_open => match event {
                    Some(DisplayEvent::Active) => self.on_active().await,
                    Some(DisplayEvent::Message(message)) => self.on_inbound(message).await,
                    Some(DisplayEvent::Disposed) => {
                        info!("Display disposed");
                        break;
                    }
                    None => display_open = false,
                },
            }
        }

        if self.hidden_dropped > 0 {
            warn!(dropped = self.hidden_dropped, "Hidden queue overflowed while display was away");
        }
        self.display
    }

    async fn release_paused(&mut self) {
        let batch = OutboundMessage::Batch(std::mem::take(&mut self.pause_queue));
        if !self.display.post_message(&batch).await
            && let OutboundMessage::Batch(records) = batch
        {
            for record in records {
                self.hide(record);
            }
        }
    }

    async fn save(&mut self, serialized: Vec<String>) {
        let mut records = Vec::with_capacity(serialized.len());
        for entry in &serialized {
            match serde_json::from_str::<LogRecord>(entry) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable record in save request: {}", e),
            }
        }

        let count = records.len();
        if self.display.handle_save(records).await {
            info!(count, "Saved console records");
        } else {
            warn!(count, "Display failed to save console records");
        }
    }

    fn hide(&mut self, record: LogRecord) {
        if self.hidden_capacity == 0 {
            self.hidden_dropped += 1;
            return;
        }
        if self.hidden.len() >= self.hidden_capacity {
            self.hidden.pop_front();
            self.hidden_dropped += 1;
            if self.hidden_dropped == 1 {
                warn!(capacity = self.hidden_capacity, "Hidden queue full, dropping oldest records");
            }
        }
        self.hidden.push_back(record);
    }
}
