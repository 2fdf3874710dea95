//! Asset-generation submissions and job records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{AssetSceneInput, AssetStatus, GenerationStatus, JobId, MotionConfig, VisualType};

/// Request to generate media for every scene of a storyboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssetGenerationRequest {
    #[validate(length(min = 1))]
    pub storyboard_id: String,
    #[validate(length(min = 1), nested)]
    pub scenes: Vec<AssetSceneInput>,
}

/// Per-scene generation progress inside an asset-generation job.
///
/// The visual and voiceover sub-statuses advance independently and never
/// move backwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetSceneStatus {
    pub scene_number: u32,
    pub visual_type: VisualType,
    pub visual_status: AssetStatus,
    pub voiceover_status: AssetStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voiceover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motion_config: Option<MotionConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AssetSceneStatus {
    pub fn pending(scene: &AssetSceneInput) -> Self {
        Self {
            scene_number: scene.scene_number,
            visual_type: scene.visual_type,
            visual_status: AssetStatus::Pending,
            voiceover_status: AssetStatus::Pending,
            video_url: None,
            photo_url: None,
            voiceover_url: None,
            motion_config: None,
            error: None,
        }
    }

    /// Advance the visual sub-status. Returns false if the move would regress.
    pub fn set_visual(&mut self, status: AssetStatus) -> bool {
        if self.visual_status.can_advance_to(status) {
            self.visual_status = status;
            true
        } else {
            false
        }
    }

    /// Advance the voiceover sub-status. Returns false if the move would regress.
    pub fn set_voiceover(&mut self, status: AssetStatus) -> bool {
        if self.voiceover_status.can_advance_to(status) {
            self.voiceover_status = status;
            true
        } else {
            false
        }
    }

    /// Append to the scene's error text, `; `-separated.
    pub fn push_error(&mut self, message: impl AsRef<str>) {
        self.error = Some(match self.error.take() {
            Some(existing) => format!("{}; {}", existing, message.as_ref()),
            None => message.as_ref().to_string(),
        });
    }

    /// Both sub-tasks have resolved.
    pub fn is_settled(&self) -> bool {
        self.visual_status.is_terminal() && self.voiceover_status.is_terminal()
    }

    pub fn has_failure(&self) -> bool {
        self.visual_status == AssetStatus::Failed || self.voiceover_status == AssetStatus::Failed
    }
}

/// A tracked asset-generation job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetGenerationJob {
    pub id: JobId,
    pub storyboard_id: String,
    pub status: GenerationStatus,
    pub scenes: Vec<AssetSceneStatus>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AssetGenerationJob {
    /// Create a queued job with every scene pending.
    pub fn new(request: &AssetGenerationRequest) -> Self {
        Self {
            id: JobId::new(),
            storyboard_id: request.storyboard_id.clone(),
            status: GenerationStatus::Queued,
            scenes: request.scenes.iter().map(AssetSceneStatus::pending).collect(),
            created_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }

    pub fn failed_scene_count(&self) -> usize {
        self.scenes.iter().filter(|s| s.has_failure()).count()
    }
}
