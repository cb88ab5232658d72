//! Bounded polling: a fixed number of attempts, a fixed interval between
//! them, and a wall-clock deadline over the whole loop.
use std::{convert::Infallible, future::Future, time::Duration};

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use thiserror::Error;
use tokio::time::{self, Instant};
use tracing::{debug, trace};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    #[serde_as(as = "DurationMilliSeconds")]
    pub interval: Duration,
    #[serde_as(as = "DurationMilliSeconds")]
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RetryError<E> {
    #[error("`{label}` did not succeed after {attempts} attempts in {elapsed:?}")]
    Exhausted {
        label: String,
        attempts: u32,
        elapsed: Duration,
    },
    #[error(transparent)]
    Probe(E),
}

/// Where a polling loop stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryState {
    /// The given attempt (1-based) may run now.
    Attempt(u32),
    /// Sleeping before the given attempt.
    Waiting(u32),
    Exhausted,
}

/// Explicit state machine behind [`poll_until`]. Every path ends either in a
/// successful probe or in [`RetryState::Exhausted`].
#[derive(Clone, Debug)]
pub struct Retry {
    policy: RetryPolicy,
    state: RetryState,
    started: Instant,
    deadline: Instant,
}

impl Retry {
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        let started = Instant::now();
        let state = if policy.max_attempts == 0 {
            RetryState::Exhausted
        } else {
            RetryState::Attempt(1)
        };
        Self {
            policy,
            state,
            started,
            deadline: started + policy.timeout,
        }
    }

    #[must_use]
    pub const fn state(&self) -> RetryState {
        self.state
    }

    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Records a failed attempt.
    pub fn failed(&mut self) {
        self.state = match self.state {
            RetryState::Attempt(n) if n < self.policy.max_attempts && !self.is_past_deadline() => {
                RetryState::Waiting(n + 1)
            }
            RetryState::Waiting(n) => RetryState::Waiting(n),
            _ => RetryState::Exhausted,
        };
    }

    /// Moves from waiting to the next attempt once the interval has elapsed,
    /// or to exhaustion if the deadline comes first.
    pub async fn wait(&mut self) {
        let RetryState::Waiting(next) = self.state else {
            return;
        };
        let wake = Instant::now() + self.policy.interval;
        if wake >= self.deadline {
            time::sleep_until(self.deadline).await;
            self.state = RetryState::Exhausted;
        } else {
            time::sleep_until(wake).await;
            self.state = RetryState::Attempt(next);
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// The deadline passed while an attempt was still running.
    pub fn expire(&mut self) {
        self.state = RetryState::Exhausted;
    }

    fn is_past_deadline(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// Runs `probe` until it yields a value, the attempts run out, or the deadline
/// passes. Probe errors end the loop immediately.
pub async fn poll_until<T, E, F, Fut>(
    mut probe: F,
    label: &str,
    policy: RetryPolicy,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let mut retry = Retry::new(policy);
    let mut attempts = 0;
    loop {
        match retry.state() {
            RetryState::Attempt(n) => {
                attempts = n;
                trace!(label, attempt = n, "Polling");
                match time::timeout_at(retry.deadline(), probe()).await {
                    Ok(Ok(Some(value))) => return Ok(value),
                    Ok(Ok(None)) => retry.failed(),
                    Ok(Err(e)) => return Err(RetryError::Probe(e)),
                    Err(_) => retry.expire(),
                }
            }
            RetryState::Waiting(_) => retry.wait().await,
            RetryState::Exhausted => {
                debug!(label, attempts, "Polling exhausted");
                return Err(RetryError::Exhausted {
                    label: label.to_owned(),
                    attempts,
                    elapsed: retry.elapsed(),
                });
            }
        }
    }
}

/// [`poll_until`] for boolean predicates.
pub async fn retry_until<E, F, Fut>(
    mut predicate: F,
    label: &str,
    policy: RetryPolicy,
) -> Result<(), RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    poll_until(
        || {
            let fut = predicate();
            async move { fut.await.map(|done| done.then_some(())) }
        },
        label,
        policy,
    )
    .await
}

/// [`retry_until`] for predicates that cannot fail.
pub async fn retry_until_infallible<F, Fut>(
    mut predicate: F,
    label: &str,
    policy: RetryPolicy,
) -> Result<(), RetryError<Infallible>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    retry_until(
        || {
            let fut = predicate();
            async move { Ok(fut.await) }
        },
        label,
        policy,
    )
    .await
}
