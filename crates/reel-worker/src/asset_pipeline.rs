//! Asset generation for storyboards.
//!
//! Scenes are processed strictly one after another to respect provider rate
//! limits. Within a scene the visual and the voiceover are generated
//! concurrently and both are awaited regardless of failure. A failed
//! sub-task marks only its own sub-status; the job fails as a whole once all
//! scenes are processed if any scene failed, keeping the successful results.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, Instrument};

use reel_jobs::AssetRegistry;
use reel_models::{
    AssetGenerationJob, AssetGenerationRequest, AssetSceneInput, AssetSceneStatus, AssetStatus,
    GenerationStatus, JobId, MotionConfig, VisualType,
};
use reel_provider::{MediaGenerator, PhotoInput, VideoInput};
use reel_storage::AssetStore;

use crate::config::VoiceoverSettings;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::supervisor::JobSupervisor;

const JOB_TYPE: &str = "asset_generation";

pub struct AssetPipeline {
    registry: Arc<AssetRegistry>,
    generator: Arc<dyn MediaGenerator>,
    store: Arc<dyn AssetStore>,
    supervisor: Arc<JobSupervisor>,
    voiceover: VoiceoverSettings,
}

impl AssetPipeline {
    pub fn new(
        registry: Arc<AssetRegistry>,
        generator: Arc<dyn MediaGenerator>,
        store: Arc<dyn AssetStore>,
        supervisor: Arc<JobSupervisor>,
        voiceover: VoiceoverSettings,
    ) -> Self {
        Self {
            registry,
            generator,
            store,
            supervisor,
            voiceover,
        }
    }

    pub fn registry(&self) -> &Arc<AssetRegistry> {
        &self.registry
    }

    /// Record a queued job with every scene pending and start generating in
    /// the background.
    pub fn start(self: &Arc<Self>, request: AssetGenerationRequest) -> AssetGenerationJob {
        let job = self.registry.create(AssetGenerationJob::new(&request));
        metrics::record_job_submitted(JOB_TYPE);

        info!(
            job_id = %job.id,
            storyboard_id = %job.storyboard_id,
            scene_count = job.scenes.len(),
            "Asset generation job created"
        );

        let pipeline = Arc::clone(self);
        let registry = Arc::clone(&self.registry);
        let job_id = job.id.clone();
        let failed_id = job.id.clone();

        self.supervisor.spawn(
            job.id.clone(),
            JOB_TYPE,
            async move { pipeline.run(&job_id, &request).await },
            move |message| {
                metrics::record_job_failed(JOB_TYPE);
                registry.update(&failed_id, |job| {
                    job.status = GenerationStatus::Failed;
                    job.error = Some(message);
                    job.completed_at = Some(Utc::now());
                });
            },
        );

        job
    }

    /// Generate every scene of an existing job, then settle the job status.
    pub async fn run(&self, job_id: &JobId, request: &AssetGenerationRequest) {
        let logger = JobLogger::new(job_id, JOB_TYPE);
        let span = logger.create_span();

        async {
            let started = Instant::now();
            let total = request.scenes.len();
            logger.log_start(&format!(
                "storyboard {} with {} scenes",
                request.storyboard_id, total
            ));
            self.registry
                .update(job_id, |job| job.status = GenerationStatus::Generating);

            for (index, scene) in request.scenes.iter().enumerate() {
                info!(
                    scene_number = scene.scene_number,
                    visual_type = %scene.visual_type,
                    "Processing scene"
                );

                let (visual, voiceover) = tokio::join!(
                    self.generate_visual(job_id, index, scene),
                    self.generate_voiceover(job_id, index, scene),
                );

                if let Err(e) = visual {
                    metrics::record_scene_failure("visual");
                    logger.log_warning(&format!(
                        "scene {} visual failed: {}",
                        scene.scene_number, e
                    ));
                    self.update_scene(job_id, index, |s| {
                        s.set_visual(AssetStatus::Failed);
                        s.push_error(format!("Visual: {}", e));
                    });
                }

                if let Err(e) = voiceover {
                    metrics::record_scene_failure("voiceover");
                    logger.log_warning(&format!(
                        "scene {} voiceover failed: {}",
                        scene.scene_number, e
                    ));
                    self.update_scene(job_id, index, |s| {
                        s.set_voiceover(AssetStatus::Failed);
                        s.push_error(format!("Voiceover: {}", e));
                    });
                }

                logger.log_progress(&format!("scene {}/{} processed", index + 1, total));
            }

            let failed_scenes = self
                .registry
                .get(job_id)
                .map(|job| job.failed_scene_count())
                .unwrap_or(0);

            if failed_scenes == 0 {
                self.registry.update(job_id, |job| {
                    job.status = GenerationStatus::Completed;
                    job.completed_at = Some(Utc::now());
                });
                metrics::record_job_completed(JOB_TYPE, started.elapsed().as_secs_f64());
                logger.log_completion(&format!("{} scenes generated", total));
            } else {
                let message = format!("{} of {} scenes failed", failed_scenes, total);
                logger.log_error(&message);
                metrics::record_job_failed(JOB_TYPE);
                self.registry.update(job_id, |job| {
                    job.status = GenerationStatus::Failed;
                    job.error = Some(message);
                    job.completed_at = Some(Utc::now());
                });
            }
        }
        .instrument(span)
        .await
    }

    fn update_scene<F>(&self, job_id: &JobId, index: usize, mutate: F) -> bool
    where
        F: FnOnce(&mut AssetSceneStatus),
    {
        self.registry.update(job_id, |job| {
            if let Some(scene) = job.scenes.get_mut(index) {
                mutate(scene);
            }
        })
    }

    async fn generate_visual(
        &self,
        job_id: &JobId,
        index: usize,
        scene: &AssetSceneInput,
    ) -> WorkerResult<()> {
        self.update_scene(job_id, index, |s| {
            s.set_visual(AssetStatus::Generating);
        });

        match scene.visual_type {
            VisualType::AiVideo => {
                let input = VideoInput::vertical(scene.ai_prompt.clone());
                let urls = self
                    .tracked("video", self.generator.generate_video(&input))
                    .await?;
                let url = self
                    .persist_first(&urls, &scene_file(job_id, scene, "video.mp4"))
                    .await?;
                info!(scene_number = scene.scene_number, video_url = %url, "AI video generated");
                self.update_scene(job_id, index, |s| {
                    s.video_url = Some(url);
                    s.set_visual(AssetStatus::Done);
                });
            }
            VisualType::AiPhoto => {
                let input = PhotoInput::vertical(scene.ai_prompt.clone());
                let urls = self
                    .tracked("photo", self.generator.generate_photo(&input))
                    .await?;
                let url = self
                    .persist_first(&urls, &scene_file(job_id, scene, "photo.jpg"))
                    .await?;
                info!(scene_number = scene.scene_number, photo_url = %url, "AI photo generated");
                self.update_scene(job_id, index, |s| {
                    s.photo_url = Some(url);
                    s.set_visual(AssetStatus::Done);
                });
            }
            VisualType::MotionGraphics => {
                let config = MotionConfig::for_scene(scene);
                info!(
                    scene_number = scene.scene_number,
                    text = %config.text,
                    "Motion graphics config created"
                );
                self.update_scene(job_id, index, |s| {
                    s.motion_config = Some(config);
                    s.set_visual(AssetStatus::Done);
                });
            }
        }

        Ok(())
    }

    async fn generate_voiceover(
        &self,
        job_id: &JobId,
        index: usize,
        scene: &AssetSceneInput,
    ) -> WorkerResult<()> {
        self.update_scene(job_id, index, |s| {
            s.set_voiceover(AssetStatus::Generating);
        });

        let input = self.voiceover.input_for(scene.narration_text.clone());
        let urls = self
            .tracked("voiceover", self.generator.generate_voiceover(&input))
            .await?;
        let url = self
            .persist_first(&urls, &scene_file(job_id, scene, "voiceover.mp3"))
            .await?;

        info!(scene_number = scene.scene_number, voiceover_url = %url, "Voiceover generated");
        self.update_scene(job_id, index, |s| {
            s.voiceover_url = Some(url);
            s.set_voiceover(AssetStatus::Done);
        });

        Ok(())
    }

    async fn tracked<F>(&self, kind: &str, task: F) -> WorkerResult<Vec<String>>
    where
        F: std::future::Future<Output = reel_provider::ProviderResult<Vec<String>>>,
    {
        let result = task.await;
        metrics::record_provider_task(kind, result.is_ok());
        Ok(result?)
    }

    /// Provider URLs expire, so the first one is persisted right away.
    async fn persist_first(&self, urls: &[String], filename: &str) -> WorkerResult<String> {
        let source = urls.first().ok_or_else(|| {
            WorkerError::no_result(format!("Provider returned no result URL for {}", filename))
        })?;

        let stored = self.store.persist(source, filename).await?;
        Ok(stored.public_url)
    }
}

/// `{jobId}-scene{N}-{suffix}`
fn scene_file(job_id: &JobId, scene: &AssetSceneInput, suffix: &str) -> String {
    format!("{}-scene{}-{}", job_id, scene.scene_number, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_file_names() {
        let job_id = JobId::from_string("job-1");
        let scene = AssetSceneInput {
            scene_number: 3,
            duration_seconds: 8.0,
            visual_type: VisualType::AiPhoto,
            visual_description: "Packed lunch on a desk".to_string(),
            narration_text: "Baon na!".to_string(),
            onscreen_text: None,
            ai_prompt: "Lunch box on office desk".to_string(),
        };

        assert_eq!(scene_file(&job_id, &scene, "photo.jpg"), "job-1-scene3-photo.jpg");
        assert_eq!(
            scene_file(&job_id, &scene, "voiceover.mp3"),
            "job-1-scene3-voiceover.mp3"
        );
    }
}
