//! Job metrics.
//!
//! Recorded through the `metrics` facade; the API binary installs the
//! Prometheus recorder. Without a recorder these calls are no-ops.

use metrics::{counter, gauge, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_SUBMITTED_TOTAL: &str = "reel_jobs_submitted_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "reel_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "reel_jobs_failed_total";
    pub const JOB_DURATION_SECONDS: &str = "reel_job_duration_seconds";
    pub const JOBS_IN_FLIGHT: &str = "reel_jobs_in_flight";
    pub const SCENE_FAILURES_TOTAL: &str = "reel_scene_failures_total";
    pub const PROVIDER_TASKS_TOTAL: &str = "reel_provider_tasks_total";
    pub const JOBS_SWEPT_TOTAL: &str = "reel_jobs_swept_total";
}

pub fn record_job_submitted(job_type: &str) {
    let labels = [("type", job_type.to_string())];
    counter!(names::JOBS_SUBMITTED_TOTAL, &labels).increment(1);
}

pub fn record_job_completed(job_type: &str, duration_secs: f64) {
    let labels = [("type", job_type.to_string())];
    counter!(names::JOBS_COMPLETED_TOTAL, &labels).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_job_failed(job_type: &str) {
    let labels = [("type", job_type.to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
}

pub fn set_jobs_in_flight(count: usize) {
    gauge!(names::JOBS_IN_FLIGHT).set(count as f64);
}

/// `part` is `visual` or `voiceover`.
pub fn record_scene_failure(part: &str) {
    let labels = [("part", part.to_string())];
    counter!(names::SCENE_FAILURES_TOTAL, &labels).increment(1);
}

pub fn record_provider_task(kind: &str, success: bool) {
    let labels = [
        ("kind", kind.to_string()),
        ("outcome", if success { "success" } else { "failure" }.to_string()),
    ];
    counter!(names::PROVIDER_TASKS_TOTAL, &labels).increment(1);
}

pub fn record_jobs_swept(registry: &str, count: usize) {
    let labels = [("registry", registry.to_string())];
    counter!(names::JOBS_SWEPT_TOTAL, &labels).increment(count as u64);
}
