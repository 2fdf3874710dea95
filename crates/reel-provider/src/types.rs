//! Wire types for the task-based generation API.

use serde::{Deserialize, Serialize};

use reel_jobs::PollStatus;

use crate::error::{ProviderError, ProviderResult};

/// Media produced by a provider task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Video,
    Photo,
    Voiceover,
}

impl TaskKind {
    /// Provider model id.
    pub fn model(&self) -> &'static str {
        match self {
            TaskKind::Video => "kling-2.6/text-to-video",
            TaskKind::Photo => "flux-2/pro-text-to-image",
            TaskKind::Voiceover => "elevenlabs/text-to-speech-turbo-2-5",
        }
    }

    /// Label used when polling.
    pub fn job_type(&self) -> &'static str {
        match self {
            TaskKind::Video => "video-generation",
            TaskKind::Photo => "photo-generation",
            TaskKind::Voiceover => "voiceover-generation",
        }
    }
}

/// `POST /jobs/createTask` body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest<I> {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_back_url: Option<String>,
    pub input: I,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskResponse {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: Option<CreateTaskData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskData {
    pub task_id: String,
}

/// `GET /jobs/recordInfo` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordInfoResponse {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<TaskDetail>,
}

/// Provider-side task state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Waiting,
    #[serde(alias = "queued")]
    Queuing,
    Generating,
    Success,
    Fail,
    /// Any state this client does not know about is treated as pending.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    pub task_id: String,
    #[serde(default)]
    pub model: String,
    pub state: TaskState,
    /// JSON string with the original input parameters
    #[serde(default)]
    pub param: Option<String>,
    /// JSON string holding `{"resultUrls": [...]}` once the task succeeds
    #[serde(default)]
    pub result_json: Option<String>,
    #[serde(default)]
    pub fail_code: Option<String>,
    #[serde(default)]
    pub fail_msg: Option<String>,
    #[serde(default)]
    pub cost_time: Option<u64>,
    #[serde(default)]
    pub complete_time: Option<u64>,
    #[serde(default)]
    pub create_time: Option<u64>,
    /// 0-100, reported by some models only
    #[serde(default)]
    pub progress: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultJson {
    pub result_urls: Vec<String>,
}

impl TaskDetail {
    /// Map provider state onto a poll outcome.
    pub fn poll_status(&self) -> ProviderResult<PollStatus<Vec<String>>> {
        match self.state {
            TaskState::Success => {
                let raw = self.result_json.as_deref().ok_or_else(|| {
                    ProviderError::invalid_response(format!(
                        "task {} succeeded without resultJson",
                        self.task_id
                    ))
                })?;
                let result: ResultJson = serde_json::from_str(raw)?;
                Ok(PollStatus::Done(result.result_urls))
            }
            TaskState::Fail => Ok(PollStatus::Failed(
                self.fail_msg
                    .clone()
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Generation failed".to_string()),
            )),
            TaskState::Waiting
            | TaskState::Queuing
            | TaskState::Generating
            | TaskState::Unknown => Ok(PollStatus::Pending),
        }
    }
}

/// Text-to-video input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoInput {
    pub prompt: String,
    pub sound: bool,
    pub aspect_ratio: String,
    pub duration: String,
}

impl VideoInput {
    /// Silent 5-second vertical clip.
    pub fn vertical(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            sound: false,
            aspect_ratio: "9:16".to_string(),
            duration: "5".to_string(),
        }
    }
}

/// Text-to-image input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoInput {
    pub prompt: String,
    pub aspect_ratio: String,
    pub resolution: String,
}

impl PhotoInput {
    pub fn vertical(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: "9:16".to_string(),
            resolution: "1K".to_string(),
        }
    }
}

/// Text-to-speech input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceoverInput {
    pub text: String,
    pub voice: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_boost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}
