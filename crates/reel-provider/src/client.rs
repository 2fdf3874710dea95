//! Task-based media generation client.
//!
//! Every generation is two calls: `createTask` returns a task id, then
//! `recordInfo` is polled with exponential backoff until the task succeeds
//! or fails.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use reel_jobs::{poll_until_done, PollConfig, PollStatus};

use crate::error::{ProviderError, ProviderResult};
use crate::types::{
    CreateTaskRequest, CreateTaskResponse, PhotoInput, RecordInfoResponse, TaskDetail, TaskKind,
    VideoInput, VoiceoverInput,
};

/// Something that can turn prompts into media URLs.
///
/// Returned URLs are ephemeral and must be persisted promptly.
#[async_trait]
pub trait MediaGenerator: Send + Sync {
    async fn generate_video(&self, input: &VideoInput) -> ProviderResult<Vec<String>>;
    async fn generate_photo(&self, input: &PhotoInput) -> ProviderResult<Vec<String>>;
    async fn generate_voiceover(&self, input: &VoiceoverInput) -> ProviderResult<Vec<String>>;
}

/// Configuration for the task client.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Bearer token; generation fails fast when absent
    pub api_key: Option<String>,
    /// API base URL (no trailing slash)
    pub base_url: String,
    /// Per-request HTTP timeout
    pub timeout: Duration,
    /// Backoff settings for task polling
    pub poll: PollConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.kie.ai/api/v1".to_string(),
            timeout: Duration::from_secs(30),
            poll: PollConfig::default(),
        }
    }
}

impl ProviderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = PollConfig::default();

        let poll = PollConfig::default()
            .with_initial_interval(Duration::from_millis(
                std::env::var("POLL_INITIAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.initial_interval.as_millis() as u64),
            ))
            .with_max_interval(Duration::from_millis(
                std::env::var("POLL_MAX_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.max_interval.as_millis() as u64),
            ))
            .with_backoff_multiplier(
                std::env::var("POLL_MULTIPLIER")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.backoff_multiplier),
            )
            .with_max_attempts(
                std::env::var("POLL_MAX_ATTEMPTS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.max_attempts),
            );

        Self {
            api_key: std::env::var("KIE_AI_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: std::env::var("KIE_AI_BASE_URL")
                .unwrap_or_else(|_| "https://api.kie.ai/api/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout: Duration::from_secs(
                std::env::var("KIE_AI_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            poll,
        }
    }
}

/// Client for the task-based generation API.
pub struct TaskClient {
    http: Client,
    config: ProviderConfig,
}

impl TaskClient {
    /// Create a new task client.
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::Network)?;

        if config.api_key.is_none() {
            warn!("KIE_AI_API_KEY not set - asset generation will not work");
        }

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        Self::new(ProviderConfig::from_env())
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn api_key(&self) -> ProviderResult<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::not_configured("KIE_AI_API_KEY is not set"))
    }

    /// Create a generation task. Never retried.
    pub async fn create_task<I>(&self, model: &str, input: &I) -> ProviderResult<String>
    where
        I: Serialize + Sync,
    {
        let api_key = self.api_key()?;
        let url = format!("{}/jobs/createTask", self.config.base_url);

        info!(model, "Creating provider task");

        let body = CreateTaskRequest {
            model: model.to_string(),
            call_back_url: None,
            input,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;
        let response = ensure_success("createTask", response).await?;

        let envelope: CreateTaskResponse = response.json().await?;
        if envelope.code != 200 {
            error!(code = envelope.code, message = %envelope.msg, "createTask returned error code");
            return Err(ProviderError::Api {
                operation: "createTask".to_string(),
                code: envelope.code,
                message: envelope.msg,
            });
        }

        let task_id = envelope
            .data
            .map(|d| d.task_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::invalid_response("createTask returned no taskId"))?;

        info!(task_id = %task_id, model, "Provider task created");
        Ok(task_id)
    }

    /// Fetch the current state of a task.
    pub async fn task_detail(&self, task_id: &str) -> ProviderResult<TaskDetail> {
        let api_key = self.api_key()?;
        let url = format!("{}/jobs/recordInfo", self.config.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("taskId", task_id)])
            .bearer_auth(api_key)
            .send()
            .await?;
        let response = ensure_success("recordInfo", response).await?;

        let envelope: RecordInfoResponse = response.json().await?;
        if envelope.code != 200 {
            error!(task_id, code = envelope.code, message = %envelope.message, "recordInfo returned error code");
            return Err(ProviderError::Api {
                operation: "recordInfo".to_string(),
                code: envelope.code,
                message: envelope.message,
            });
        }

        envelope
            .data
            .ok_or_else(|| ProviderError::invalid_response("recordInfo returned no data"))
    }

    /// One poll of a task, mapped onto the poller's outcome type.
    pub async fn check_task(&self, task_id: &str) -> ProviderResult<PollStatus<Vec<String>>> {
        let detail = self.task_detail(task_id).await?;
        debug!(
            task_id,
            state = ?detail.state,
            progress = ?detail.progress,
            "Provider task status"
        );
        detail.poll_status()
    }

    /// Poll a task until it resolves.
    pub async fn wait_for_task(&self, task_id: &str, kind: TaskKind) -> ProviderResult<Vec<String>> {
        let config = self.config.poll.labeled(kind.job_type(), task_id);
        let urls = poll_until_done(&config, || self.check_task(task_id)).await?;
        Ok(urls)
    }

    /// Create a task and wait for its result URLs.
    pub async fn submit<I>(&self, kind: TaskKind, input: &I) -> ProviderResult<Vec<String>>
    where
        I: Serialize + Sync,
    {
        let task_id = self.create_task(kind.model(), input).await?;
        self.wait_for_task(&task_id, kind).await
    }
}

#[async_trait]
impl MediaGenerator for TaskClient {
    async fn generate_video(&self, input: &VideoInput) -> ProviderResult<Vec<String>> {
        self.submit(TaskKind::Video, input).await
    }

    async fn generate_photo(&self, input: &PhotoInput) -> ProviderResult<Vec<String>> {
        self.submit(TaskKind::Photo, input).await
    }

    async fn generate_voiceover(&self, input: &VoiceoverInput) -> ProviderResult<Vec<String>> {
        self.submit(TaskKind::Voiceover, input).await
    }
}

async fn ensure_success(operation: &str, response: Response) -> ProviderResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error!(operation, status = %status, body = %body, "Provider request failed");
    Err(ProviderError::request_failed(format!(
        "{} failed: {} - {}",
        operation, status, body
    )))
}
