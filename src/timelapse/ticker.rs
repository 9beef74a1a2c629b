//! Cooperative cancellation and the bounded wait between captures.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;

/// Shared flag used to ask a run to stop.
///
/// Cancelling is sticky: once set the token stays cancelled.
#[derive(Debug, Clone)]
pub struct CancelToken {
    flag: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flag: Arc::new(flag),
        }
    }

    /// Request cancellation. Never blocks.
    pub fn cancel(&self) {
        self.flag.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.flag.borrow()
    }

    /// A ticker that waits at most `period` at a time and wakes early on cancel.
    pub fn ticker(&self, period: Duration) -> Ticker {
        Ticker {
            period,
            cancelled: self.flag.subscribe(),
            _token: self.clone(),
        }
    }
}

/// Why a [`Ticker::wait`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Elapsed,
    Cancelled,
}

/// Cancellation-aware wait primitive. The only place a run suspends apart
/// from the capture itself.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    cancelled: watch::Receiver<bool>,
    // keeps the sender alive so `wait_for` cannot fail
    _token: CancelToken,
}

impl Ticker {
    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Sleep for `limit` capped at one tick, returning early when cancelled.
    pub async fn wait(&mut self, limit: Duration) -> Wake {
        let nap = limit.min(self.period);
        match timeout(nap, self.cancelled.wait_for(|cancelled| *cancelled)).await {
            Ok(_) => Wake::Cancelled,
            Err(_) => Wake::Elapsed,
        }
    }
}
