//! Render submissions and render job records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{Branding, JobId, RenderScene, RenderStatus};

/// Request to render a storyboard into a finished video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct RenderRequest {
    #[validate(length(min = 1))]
    pub storyboard_id: String,
    #[validate(length(min = 1))]
    pub topic_id: String,
    /// Ordered scenes
    #[validate(length(min = 1), nested)]
    pub scenes: Vec<RenderScene>,
    #[validate(nested)]
    pub branding: Branding,
}

impl RenderRequest {
    /// Sum of all scene durations in seconds.
    pub fn total_duration_seconds(&self) -> f64 {
        self.scenes.iter().map(|s| s.duration_seconds).sum()
    }
}

/// A tracked render job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderJob {
    pub id: JobId,
    pub storyboard_id: String,
    pub status: RenderStatus,
    /// Progress percentage (0-100)
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub scene_count: usize,
    pub total_duration_seconds: f64,
}

impl RenderJob {
    /// Create a queued job for a render request.
    pub fn new(request: &RenderRequest) -> Self {
        Self {
            id: JobId::new(),
            storyboard_id: request.storyboard_id.clone(),
            status: RenderStatus::Queued,
            progress: 0,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            output_path: None,
            download_url: None,
            error: None,
            scene_count: request.scenes.len(),
            total_duration_seconds: request.total_duration_seconds(),
        }
    }
}
