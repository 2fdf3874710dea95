//! Job supervisor.
//!
//! Every background job routine is spawned through [`JobSupervisor::spawn`].
//! Concurrency is bounded by a semaphore whose permit is acquired inside the
//! spawned task, so submission never waits. A routine that panics, or that
//! is still queued when shutdown begins, has its failure hook invoked so the
//! job never hangs in a non-terminal state.

use std::any::Any;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tracing::{error, info, warn};

use reel_models::JobId;

use crate::metrics;

const SHUTTING_DOWN: &str = "Worker is shutting down";

pub struct JobSupervisor {
    max_concurrent: usize,
    permits: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    shutdown: watch::Sender<bool>,
}

impl JobSupervisor {
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        let (shutdown, _) = watch::channel(false);

        Self {
            max_concurrent,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            shutdown,
        }
    }

    /// Run `work` in the background. `on_failure` receives a message if the
    /// routine panics or never gets to run.
    pub fn spawn<F, H>(&self, job_id: JobId, job_type: &'static str, work: F, on_failure: H)
    where
        F: Future<Output = ()> + Send + 'static,
        H: FnOnce(String) + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let in_flight = Arc::clone(&self.in_flight);
        let shutdown = self.shutdown.subscribe();

        tokio::spawn(async move {
            let permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!(job_id = %job_id, job_type, "Job dropped: supervisor closed");
                    on_failure(SHUTTING_DOWN.to_string());
                    return;
                }
            };

            if *shutdown.borrow() {
                warn!(job_id = %job_id, job_type, "Job dropped: shutdown in progress");
                on_failure(SHUTTING_DOWN.to_string());
                return;
            }

            metrics::set_jobs_in_flight(in_flight.fetch_add(1, Ordering::SeqCst) + 1);
            info!(job_id = %job_id, job_type, "Job routine started");

            match tokio::spawn(work).await {
                Ok(()) => {}
                Err(e) if e.is_panic() => {
                    let message = panic_message(e.into_panic());
                    error!(job_id = %job_id, job_type, panic = %message, "Job routine panicked");
                    on_failure(format!("Job panicked: {}", message));
                }
                Err(_) => {
                    error!(job_id = %job_id, job_type, "Job routine was cancelled");
                    on_failure("Job was cancelled".to_string());
                }
            }

            metrics::set_jobs_in_flight(in_flight.fetch_sub(1, Ordering::SeqCst) - 1);
            drop(permit);
        });
    }

    /// Jobs currently running (not counting those waiting for a permit).
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Stop accepting work and wait up to `timeout` for running jobs.
    ///
    /// Jobs still queued for a permit are failed. Returns `true` if every
    /// running job finished in time.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        let _ = self.shutdown.send(true);
        info!(in_flight = self.in_flight(), "Waiting for in-flight jobs");

        let all = u32::try_from(self.max_concurrent).unwrap_or(u32::MAX);
        match tokio::time::timeout(timeout, self.permits.acquire_many(all)).await {
            Ok(Ok(_permits)) => {
                info!("All jobs finished");
                true
            }
            Ok(Err(_)) => true,
            Err(_) => {
                warn!(
                    in_flight = self.in_flight(),
                    timeout_secs = timeout.as_secs(),
                    "Shutdown timed out with jobs still running"
                );
                false
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
