//! Exponential-backoff polling of long-running external tasks.
//!
//! The check callback reports one of three outcomes. `Pending` keeps the
//! loop going, `Done` returns the value, and `Failed` ends polling at once
//! without spending the remaining attempt budget. Errors returned by the
//! callback itself (transport failures) are never retried here.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info};

/// Outcome of a single poll.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus<T> {
    /// Not finished yet; poll again after the current interval.
    Pending,
    /// Finished with a value.
    Done(T),
    /// Explicit failure reported by the remote side; never retried.
    Failed(String),
}

/// Polling failure.
#[derive(Debug, Error)]
pub enum PollError<E> {
    /// The check callback itself failed (e.g. a network error).
    #[error(transparent)]
    Check(E),

    #[error("Job {job_id} ({job_type}) failed: {message}")]
    Terminal {
        job_id: String,
        job_type: String,
        message: String,
    },

    #[error("Job {job_id} ({job_type}) timed out after {attempts} attempts ({}s)", .elapsed.as_secs())]
    Timeout {
        job_id: String,
        job_type: String,
        attempts: u32,
        elapsed: Duration,
    },
}

/// Backoff configuration.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Sleep after the first pending result
    pub initial_interval: Duration,
    /// Upper bound for any single sleep
    pub max_interval: Duration,
    /// Growth factor applied after every pending result
    pub backoff_multiplier: f64,
    /// Total number of `check()` invocations allowed
    pub max_attempts: u32,
    /// Identifier used only in logs and errors
    pub job_id: String,
    /// Label used only in logs and errors
    pub job_type: String,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(10_000),
            max_interval: Duration::from_millis(60_000),
            backoff_multiplier: 2.0,
            max_attempts: 30,
            job_id: String::new(),
            job_type: String::new(),
        }
    }
}

impl PollConfig {
    pub fn new(job_type: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            job_type: job_type.into(),
            job_id: job_id.into(),
            ..Default::default()
        }
    }

    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Same backoff settings, different diagnostic labels.
    pub fn labeled(&self, job_type: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            job_type: job_type.into(),
            job_id: job_id.into(),
            ..self.clone()
        }
    }

    /// Interval that follows `current`, capped at `max_interval`.
    pub fn next_interval(&self, current: Duration) -> Duration {
        let grown = current.as_secs_f64() * self.backoff_multiplier;
        if !grown.is_finite() || grown >= self.max_interval.as_secs_f64() {
            self.max_interval
        } else {
            Duration::from_secs_f64(grown.max(0.0))
        }
    }

    /// The sequence of sleeps a never-resolving task would go through.
    pub fn intervals(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(Some(self.initial_interval.min(self.max_interval)), |d| {
            Some(self.next_interval(*d))
        })
    }
}

/// Call `check` until it reports `Done` or `Failed`, sleeping with
/// exponential backoff between pending results.
///
/// Exactly one `check()` is in flight at a time. After `max_attempts`
/// pending results the call fails with [`PollError::Timeout`], carrying the
/// attempt count and the elapsed time.
pub async fn poll_until_done<T, E, F, Fut>(
    config: &PollConfig,
    mut check: F,
) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollStatus<T>, E>>,
{
    let started = Instant::now();
    let mut interval = config.initial_interval.min(config.max_interval);
    let mut attempt = 0u32;

    while attempt < config.max_attempts {
        attempt += 1;

        debug!(
            job_id = %config.job_id,
            job_type = %config.job_type,
            attempt,
            next_interval_ms = interval.as_millis() as u64,
            "Polling"
        );

        match check().await.map_err(PollError::Check)? {
            PollStatus::Done(value) => {
                info!(
                    job_id = %config.job_id,
                    job_type = %config.job_type,
                    total_attempts = attempt,
                    total_ms = started.elapsed().as_millis() as u64,
                    "Poll complete"
                );
                return Ok(value);
            }
            PollStatus::Failed(message) => {
                error!(
                    job_id = %config.job_id,
                    job_type = %config.job_type,
                    attempt,
                    error = %message,
                    "Poll failed"
                );
                return Err(PollError::Terminal {
                    job_id: config.job_id.clone(),
                    job_type: config.job_type.clone(),
                    message,
                });
            }
            PollStatus::Pending => {
                if attempt < config.max_attempts {
                    tokio::time::sleep(interval).await;
                    interval = config.next_interval(interval);
                }
            }
        }
    }

    let elapsed = started.elapsed();
    error!(
        job_id = %config.job_id,
        job_type = %config.job_type,
        total_attempts = attempt,
        total_ms = elapsed.as_millis() as u64,
        "Poll timeout"
    );

    Err(PollError::Timeout {
        job_id: config.job_id.clone(),
        job_type: config.job_type.clone(),
        attempts: attempt,
        elapsed,
    })
}
