//! Storyboard-generation submissions and job records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{GenerationStatus, JobId, StoryboardScene};

/// Topic to turn into a storyboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StoryboardRequest {
    #[validate(length(min = 1))]
    pub topic_id: String,
    #[validate(length(min = 1))]
    pub topic_title: String,
    #[validate(length(min = 1))]
    pub topic_summary: String,
    #[validate(length(min = 1))]
    pub content_pillar: String,
}

impl StoryboardRequest {
    /// Storyboard id derived from the topic.
    pub fn storyboard_id(&self) -> String {
        format!("SB-{}", self.topic_id)
    }
}

/// A tracked storyboard-generation job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoryboardJob {
    pub id: JobId,
    pub topic_id: String,
    pub topic_title: String,
    pub status: GenerationStatus,
    pub storyboard_id: String,
    pub scenes: Vec<StoryboardScene>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StoryboardJob {
    pub fn new(request: &StoryboardRequest) -> Self {
        Self {
            id: JobId::new(),
            topic_id: request.topic_id.clone(),
            topic_title: request.topic_title.clone(),
            status: GenerationStatus::Queued,
            storyboard_id: request.storyboard_id(),
            scenes: Vec::new(),
            created_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }
}
