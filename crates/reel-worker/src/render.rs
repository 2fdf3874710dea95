//! Render orchestration.
//!
//! Drives a render job through `queued → bundling → rendering →
//! completed | failed`. The compositor bundle is prepared once per process
//! and shared by every render. Nothing escapes [`RenderOrchestrator::run`]:
//! errors end up on the job.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{info, warn, Instrument};

use reel_jobs::RenderRegistry;
use reel_models::{JobId, RenderJob, RenderRequest, RenderStatus};
use reel_render::{BundleHandle, Compositor, ProgressFn, RenderResult};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::logging::JobLogger;
use crate::metrics;
use crate::supervisor::JobSupervisor;

const JOB_TYPE: &str = "render";

pub struct RenderOrchestrator {
    registry: Arc<RenderRegistry>,
    compositor: Arc<dyn Compositor>,
    supervisor: Arc<JobSupervisor>,
    bundle: OnceCell<BundleHandle>,
    output_dir: PathBuf,
    base_url: String,
    composition_id: String,
}

impl RenderOrchestrator {
    pub fn new(
        registry: Arc<RenderRegistry>,
        compositor: Arc<dyn Compositor>,
        supervisor: Arc<JobSupervisor>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            registry,
            compositor,
            supervisor,
            bundle: OnceCell::new(),
            output_dir: config.output_dir.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            composition_id: config.composition_id.clone(),
        }
    }

    pub fn registry(&self) -> &Arc<RenderRegistry> {
        &self.registry
    }

    /// Record a queued job and start rendering in the background.
    pub fn submit(self: &Arc<Self>, request: RenderRequest) -> RenderJob {
        let job = self.registry.create(RenderJob::new(&request));
        metrics::record_job_submitted(JOB_TYPE);

        info!(
            job_id = %job.id,
            storyboard_id = %job.storyboard_id,
            scene_count = job.scene_count,
            total_duration_seconds = job.total_duration_seconds,
            "Render job created"
        );

        let orchestrator = Arc::clone(self);
        let registry = Arc::clone(&self.registry);
        let job_id = job.id.clone();
        let failed_id = job.id.clone();

        self.supervisor.spawn(
            job.id.clone(),
            JOB_TYPE,
            async move { orchestrator.run(&job_id, &request).await },
            move |message| {
                metrics::record_job_failed(JOB_TYPE);
                registry.update(&failed_id, |job| {
                    job.status = RenderStatus::Failed;
                    job.error = Some(message);
                    job.completed_at = Some(Utc::now());
                });
            },
        );

        job
    }

    /// Build the bundle ahead of the first render. Failures are logged and
    /// left for the next caller to retry.
    pub async fn prewarm(&self) {
        match self.ensure_bundle().await {
            Ok(bundle) => info!(location = %bundle.serve_url, "Compositor bundle ready"),
            Err(e) => warn!(error = %e, "Compositor bundle pre-warm failed"),
        }
    }

    async fn ensure_bundle(&self) -> RenderResult<BundleHandle> {
        self.bundle
            .get_or_try_init(|| self.compositor.bundle())
            .await
            .cloned()
    }

    /// Render an existing job to completion or failure.
    pub async fn run(&self, job_id: &JobId, request: &RenderRequest) {
        let logger = JobLogger::new(job_id, JOB_TYPE);
        let span = logger.create_span();

        async {
            let started = Instant::now();
            logger.log_start(&format!("storyboard {}", request.storyboard_id));

            match self.render(job_id, request, &logger).await {
                Ok(output_path) => {
                    let download_url = format!("{}/output/{}.mp4", self.base_url, job_id);
                    self.registry.update(job_id, |job| {
                        job.status = RenderStatus::Completed;
                        job.completed_at = Some(Utc::now());
                        job.output_path = Some(output_path.to_string_lossy().into_owned());
                        job.download_url = Some(download_url.clone());
                        job.progress = 100;
                    });
                    metrics::record_job_completed(JOB_TYPE, started.elapsed().as_secs_f64());
                    logger.log_completion(&download_url);
                }
                Err(e) => {
                    let message = e.to_string();
                    logger.log_error(&message);
                    metrics::record_job_failed(JOB_TYPE);
                    self.registry.update(job_id, |job| {
                        job.status = RenderStatus::Failed;
                        job.error = Some(message);
                        job.completed_at = Some(Utc::now());
                    });
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn render(
        &self,
        job_id: &JobId,
        request: &RenderRequest,
        logger: &JobLogger,
    ) -> WorkerResult<PathBuf> {
        self.registry
            .update(job_id, |job| job.status = RenderStatus::Bundling);
        let bundle = self.ensure_bundle().await?;

        self.registry.update(job_id, |job| {
            job.status = RenderStatus::Rendering;
            job.started_at = Some(Utc::now());
        });
        logger.log_progress(&format!("rendering {}", self.composition_id));

        let props = json!({
            "scenes": request.scenes,
            "branding": request.branding,
        });
        let output = self.output_dir.join(format!("{}.mp4", job_id));

        let path = self
            .compositor
            .render(
                &bundle,
                &self.composition_id,
                &props,
                &output,
                self.progress_sink(job_id),
            )
            .await?;

        Ok(path)
    }

    /// Forwards compositor progress into the job as a whole percentage,
    /// only ever moving forward.
    fn progress_sink(&self, job_id: &JobId) -> ProgressFn {
        let registry = Arc::clone(&self.registry);
        let job_id = job_id.clone();
        let last = AtomicU8::new(0);

        Arc::new(move |fraction: f64| {
            let percent = (fraction * 100.0).round().clamp(0.0, 100.0) as u8;
            if last.fetch_max(percent, Ordering::SeqCst) >= percent {
                return;
            }
            registry.update(&job_id, |job| {
                if percent > job.progress {
                    job.progress = percent;
                }
            });
        })
    }
}
