//! First-success race over concurrent connection attempts
//!
//! Every attempt runs as its own task in a [`JoinSet`], alongside a timer task.
//! Completions are pulled off the set one at a time: failures are logged and
//! the race continues with whatever is still pending, the first success wins,
//! and the timer firing ends the race with [`RioLogError::Timeout`].
//!
//! Once the outcome is known every remaining task is aborted *and joined*, so
//! each losing attempt has been dropped exactly once by the time [`race`]
//! returns. A loser that happened to connect after the winner is dropped
//! during that drain, which closes its socket.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, trace, warn};

use crate::{Result, RioLogError};

enum Settled<T> {
    Connected(usize, T),
    Failed(usize, RioLogError),
    Expired,
}

/// Race `attempts` against each other and a `timeout`
///
/// Returns the index and value of the first attempt to succeed, or
/// [`RioLogError::Timeout`] when the timer fires first. Attempts that fail
/// before the timer do not end the race early; with every attempt failed the
/// call still waits for the timer.
pub async fn race<T, F>(attempts: Vec<F>, timeout: Duration) -> Result<(usize, T)>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    let mut set = JoinSet::new();
    let mut pending = attempts.len();

    for (index, attempt) in attempts.into_iter().enumerate() {
        set.spawn(async move {
            match attempt.await {
                Ok(value) => Settled::Connected(index, value),
                Err(e) => Settled::Failed(index, e),
            }
        });
    }
    set.spawn(async move {
        tokio::time::sleep(timeout).await;
        Settled::Expired
    });

    let mut winner = Err(RioLogError::Timeout { duration: timeout });
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Settled::Connected(index, value)) => {
                trace!(candidate = index, "Attempt won the race");
                winner = Ok((index, value));
                break;
            }
            Ok(Settled::Failed(index, e)) => {
                pending -= 1;
                debug!(candidate = index, remaining = pending, "Attempt failed: {}", e);
                if pending == 0 {
                    trace!("All attempts failed, waiting out the race timer");
                }
            }
            Ok(Settled::Expired) => {
                debug!(?timeout, "No attempt connected before the timer");
                break;
            }
            Err(e) => {
                pending = pending.saturating_sub(1);
                warn!("Connection attempt task failed: {}", e);
            }
        }
    }

    set.abort_all();
    while let Some(joined) = set.join_next().await {
        if let Ok(Settled::Connected(index, _late)) = joined {
            trace!(candidate = index, "Closing late connection");
        }
    }

    winner
}
