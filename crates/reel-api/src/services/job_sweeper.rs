//! Background service that drops old job records.
//!
//! Every registry is swept on a fixed interval; jobs older than the maximum
//! age are removed whatever their status.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use reel_jobs::Sweep;
use reel_worker::metrics::record_jobs_swept;

/// Periodic job registry sweeper.
pub struct JobSweeper {
    registries: Vec<Arc<dyn Sweep>>,
    max_age: Duration,
    interval: Duration,
}

impl JobSweeper {
    pub fn new(registries: Vec<Arc<dyn Sweep>>, max_age: Duration, interval: Duration) -> Self {
        Self {
            registries,
            max_age,
            interval,
        }
    }

    /// Run until `shutdown` flips to true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            max_age_secs = self.max_age.as_secs(),
            "Starting job sweeper"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Job sweeper stopped");
                        return;
                    }
                }
            }
        }
    }

    /// Sweep every registry once. Returns the total number of jobs removed.
    pub fn sweep_once(&self) -> usize {
        let mut total = 0;

        for registry in &self.registries {
            let removed = registry.sweep(self.max_age);
            if removed > 0 {
                info!(registry = registry.name(), count = removed, "Cleaned old jobs");
                record_jobs_swept(registry.name(), removed);
            }
            total += removed;
        }

        total
    }
}
