//! Storyboard generation jobs.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::Instrument;

use reel_jobs::StoryboardRegistry;
use reel_models::{GenerationStatus, JobId, StoryboardJob, StoryboardRequest, StoryboardScene};
use reel_provider::ChatCompletion;

use crate::config::WorkerConfig;
use crate::duration::{normalize, DraftScene, DurationBounds};
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::prompts::{system_prompt, user_prompt};
use crate::supervisor::JobSupervisor;

const JOB_TYPE: &str = "storyboard";

/// Extract drafted scenes from the model's JSON response.
pub fn parse_storyboard(content: &str) -> WorkerResult<Vec<DraftScene>> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|_| WorkerError::invalid_response("Failed to parse LLM JSON response"))?;

    let scenes = value
        .get("scenes")
        .and_then(|s| s.as_array())
        .ok_or_else(|| WorkerError::invalid_response("LLM response missing scenes array"))?;

    Ok(scenes
        .iter()
        .map(|scene| serde_json::from_value(scene.clone()).unwrap_or_default())
        .collect())
}

/// Turns topics into normalized storyboards via the chat model.
pub struct StoryboardService {
    registry: Arc<StoryboardRegistry>,
    chat: Arc<dyn ChatCompletion>,
    supervisor: Arc<JobSupervisor>,
    brand_name: String,
    target_secs: u32,
    bounds: DurationBounds,
}

impl StoryboardService {
    pub fn new(
        registry: Arc<StoryboardRegistry>,
        chat: Arc<dyn ChatCompletion>,
        supervisor: Arc<JobSupervisor>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            registry,
            chat,
            supervisor,
            brand_name: config.brand_name.clone(),
            target_secs: config.target_duration_secs,
            bounds: config.scene_bounds,
        }
    }

    pub fn registry(&self) -> &Arc<StoryboardRegistry> {
        &self.registry
    }

    /// Record a queued job and start generating in the background.
    pub fn start(self: &Arc<Self>, request: StoryboardRequest) -> StoryboardJob {
        let job = self.registry.create(StoryboardJob::new(&request));
        metrics::record_job_submitted(JOB_TYPE);

        tracing::info!(
            job_id = %job.id,
            topic_id = %job.topic_id,
            storyboard_id = %job.storyboard_id,
            "Storyboard generation job created"
        );

        let service = Arc::clone(self);
        let registry = Arc::clone(&self.registry);
        let job_id = job.id.clone();
        let failed_id = job.id.clone();

        self.supervisor.spawn(
            job.id.clone(),
            JOB_TYPE,
            async move { service.run(&job_id, &request).await },
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

    /// Generate the storyboard for an existing job. Never fails: errors are
    /// recorded on the job.
    pub async fn run(&self, job_id: &JobId, request: &StoryboardRequest) {
        let logger = JobLogger::new(job_id, JOB_TYPE);
        let span = logger.create_span();

        async {
            let started = Instant::now();
            logger.log_start(&format!("topic {} ({})", request.topic_id, request.topic_title));
            self.registry
                .update(job_id, |job| job.status = GenerationStatus::Generating);

            match self.generate(request).await {
                Ok(scenes) => {
                    let count = scenes.len();
                    self.registry.update(job_id, |job| {
                        job.scenes = scenes;
                        job.status = GenerationStatus::Completed;
                        job.completed_at = Some(Utc::now());
                    });
                    metrics::record_job_completed(JOB_TYPE, started.elapsed().as_secs_f64());
                    logger.log_completion(&format!("{} scenes", count));
                }
                Err(e) => {
                    let message = e.to_string();
                    logger.log_error(&message);
                    metrics::record_job_failed(JOB_TYPE);
                    self.registry.update(job_id, |job| {
                        job.status = GenerationStatus::Failed;
                        job.error = Some(message);
                        job.completed_at = Some(Utc::now());
                    });
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn generate(&self, request: &StoryboardRequest) -> WorkerResult<Vec<StoryboardScene>> {
        let system = system_prompt(&self.brand_name, self.target_secs, self.bounds);
        let user = user_prompt(request, self.target_secs);

        let content = self.chat.complete_json(&system, &user).await?;
        let drafts = parse_storyboard(&content)?;

        Ok(normalize(drafts, self.target_secs, self.bounds)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reel_provider::{ProviderError, ProviderResult};
    use serde_json::json;

    struct CannedChat(Result<String, String>);

    #[async_trait]
    impl ChatCompletion for CannedChat {
        async fn complete_json(&self, _system: &str, user: &str) -> ProviderResult<String> {
            assert!(user.contains("Title: Merienda hacks"));
            match &self.0 {
                Ok(s) => Ok(s.clone()),
                Err(m) => Err(ProviderError::request_failed(m.clone())),
            }
        }
    }

    fn request() -> StoryboardRequest {
        StoryboardRequest {
            topic_id: "T-42".to_string(),
            topic_title: "Merienda hacks".to_string(),
            topic_summary: "Quick afternoon snacks in a box".to_string(),
            content_pillar: "Food".to_string(),
        }
    }

    fn scene(n: u32, duration: u32, visual_type: &str) -> serde_json::Value {
        json!({
            "scene_number": n,
            "duration_seconds": duration,
            "visual_description": "Hands opening a meal box",
            "visual_type": visual_type,
            "narration_text": "Gutom ka na ba?",
            "onscreen_text": "HUNGRY?",
            "ai_prompt": "Close-up of hands opening a kraft meal box"
        })
    }

    fn service(chat: CannedChat) -> (Arc<StoryboardService>, Arc<StoryboardRegistry>) {
        let registry = Arc::new(StoryboardRegistry::new("storyboard"));
        let service = Arc::new(StoryboardService::new(
            registry.clone(),
            Arc::new(chat),
            Arc::new(JobSupervisor::new(2)),
            &WorkerConfig::default(),
        ));
        (service, registry)
    }

    #[test]
    fn test_parse_storyboard_requires_scenes_array() {
        let err = parse_storyboard(r#"{"scenes": "nope"}"#).unwrap_err();
        assert_eq!(err.to_string(), "LLM response missing scenes array");

        let err = parse_storyboard("not json").unwrap_err();
        assert_eq!(err.to_string(), "Failed to parse LLM JSON response");

        let drafts = parse_storyboard(r#"{"scenes": [42]}"#).unwrap();
        assert_eq!(drafts.len(), 1);
        assert!(drafts[0].scene_number.is_none());
    }

    #[tokio::test]
    async fn test_run_normalizes_and_completes() {
        let content = json!({
            "scenes": [
                scene(1, 5, "motion-graphics"),
                scene(2, 15, "ai-photo"),
                scene(3, 15, "ai-video"),
                scene(4, 15, "ai-photo"),
                scene(5, 8, "motion-graphics")
            ]
        })
        .to_string();
        let (service, registry) = service(CannedChat(Ok(content)));

        let job = registry.create(StoryboardJob::new(&request()));
        service.run(&job.id, &request()).await;

        let job = registry.get(&job.id).unwrap();
        assert_eq!(job.status, GenerationStatus::Completed);
        assert_eq!(job.storyboard_id, "SB-T-42");
        let total: u32 = job.scenes.iter().map(|s| s.duration_seconds).sum();
        assert_eq!(total, 60);
        assert_eq!(job.scenes[4].duration_seconds, 10);
        assert!(job.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_run_records_provider_error() {
        let (service, registry) = service(CannedChat(Err("OpenAI API error: 500 upstream".to_string())));

        let job = registry.create(StoryboardJob::new(&request()));
        service.run(&job.id, &request()).await;

        let job = registry.get(&job.id).unwrap();
        assert_eq!(job.status, GenerationStatus::Failed);
        assert!(job.error.unwrap().contains("OpenAI API error: 500"));
        assert!(job.scenes.is_empty());
    }

    #[tokio::test]
    async fn test_start_returns_queued_job() {
        let content = json!({ "scenes": [scene(1, 60, "ai-photo")] }).to_string();
        let (service, registry) = service(CannedChat(Ok(content)));

        let job = service.start(request());
        assert_eq!(job.status, GenerationStatus::Queued);

        for _ in 0..100 {
            if registry.get(&job.id).unwrap().status.is_terminal() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        // Already on target, so the oversized scene is left alone.
        let job = registry.get(&job.id).unwrap();
        assert_eq!(job.status, GenerationStatus::Completed);
        assert_eq!(job.scenes[0].duration_seconds, 60);
    }
}
