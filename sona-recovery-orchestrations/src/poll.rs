//! Fixed-interval polling with an optional deadline
//!
//! Every wait in a recovery run (pod recreation, app activation) goes through
//! [`poll_until`]. The default policy waits forever; callers that want a
//! bounded wait set a deadline and get a [`PollFailure::TimedOut`] instead of
//! a hang.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Default interval between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How often to poll and for how long
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` waits indefinitely
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            deadline: None,
        }
    }
}

impl PollPolicy {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Build from the millisecond/second fields carried in activity inputs
    pub fn from_input(poll_interval_ms: u64, timeout_seconds: Option<u64>) -> Self {
        Self::every(Duration::from_millis(poll_interval_ms))
            .with_deadline(timeout_seconds.map(Duration::from_secs))
    }
}

/// One observation made by a poll function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness<T> {
    Ready(T),
    /// Not there yet; the string describes what was observed
    Pending(String),
}

/// A successful poll and how many attempts it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polled<T> {
    pub value: T,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollFailure {
    TimedOut {
        waited: Duration,
        attempts: u32,
        last_observed: String,
    },
    Cancelled,
}

/// Poll until `poll_fn` reports ready, the deadline passes, or `cancel` fires.
///
/// Errors returned by `poll_fn` are treated as "not ready yet": they are
/// logged and polling continues.
pub async fn poll_until<T, E, F, Fut>(
    description: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    mut poll_fn: F,
) -> Result<Polled<T>, PollFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Readiness<T>, E>>,
    E: Display,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(PollFailure::Cancelled);
        }

        attempts += 1;
        let last_observed = match poll_fn().await {
            Ok(Readiness::Ready(value)) => return Ok(Polled { value, attempts }),
            Ok(Readiness::Pending(observed)) => {
                tracing::debug!(attempt = attempts, observed = %observed, "Still waiting for {}", description);
                observed
            }
            Err(e) => {
                tracing::warn!(attempt = attempts, error = %e, "Poll error for {}, retrying", description);
                e.to_string()
            }
        };

        let mut pause = policy.interval;
        if let Some(deadline) = policy.deadline {
            let waited = start.elapsed();
            if waited >= deadline {
                return Err(PollFailure::TimedOut {
                    waited,
                    attempts,
                    last_observed,
                });
            }
            // Never sleep past the deadline; the next poll is the last one
            pause = pause.min(deadline - waited);
        }

        tokio::select! {
            _ = cancel.cancelled() => return Err(PollFailure::Cancelled),
            _ = tokio::time::sleep(pause) => {}
        }
    }
}
