//! Single-slot resume signal for the reconnect loop

use tokio::sync::watch;

/// A set/reset flag that can be awaited
///
/// `set` latches the flag and wakes every current waiter; `wait` returns
/// immediately while the flag is latched. Repeated `set` calls before the
/// waiter gets around to `reset` collapse into one wake.
#[derive(Debug)]
pub struct ResumeSignal {
    state: watch::Sender<bool>,
}

impl ResumeSignal {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self { state }
    }

    pub fn set(&self) {
        self.state.send_replace(true);
    }

    pub fn reset(&self) {
        self.state.send_replace(false);
    }

    pub fn is_set(&self) -> bool {
        *self.state.borrow()
    }

    /// Wait until the flag is latched
    pub async fn wait(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = rx.wait_for(|set| *set).await;
    }
}

impl Default for ResumeSignal {
    fn default() -> Self {
        Self::new()
    }
}
