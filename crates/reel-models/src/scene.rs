//! Scene definitions shared by storyboards, asset generation and rendering.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::Validate;

use crate::validation::validate_hex_color;

/// How a scene's visual is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum VisualType {
    /// Generated video clip
    AiVideo,
    /// Generated still image
    AiPhoto,
    /// Locally composed text animation, no provider call
    MotionGraphics,
}

impl VisualType {
    pub const ALL: [VisualType; 3] = [
        VisualType::AiVideo,
        VisualType::AiPhoto,
        VisualType::MotionGraphics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VisualType::AiVideo => "ai-video",
            VisualType::AiPhoto => "ai-photo",
            VisualType::MotionGraphics => "motion-graphics",
        }
    }

    /// Whether the visual requires a provider task.
    pub fn is_generated(&self) -> bool {
        !matches!(self, VisualType::MotionGraphics)
    }
}

impl fmt::Display for VisualType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid visual_type: {0}")]
pub struct VisualTypeError(pub String);

impl FromStr for VisualType {
    type Err = VisualTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VisualType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| VisualTypeError(s.to_string()))
    }
}

/// A normalized storyboard scene with a whole-second duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StoryboardScene {
    pub scene_number: u32,
    pub duration_seconds: u32,
    pub visual_description: String,
    pub visual_type: VisualType,
    pub narration_text: String,
    pub onscreen_text: String,
    pub ai_prompt: String,
}

/// Scene input for asset generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct AssetSceneInput {
    #[validate(range(min = 1))]
    pub scene_number: u32,
    #[validate(range(exclusive_min = 0.0))]
    pub duration_seconds: f64,
    pub visual_type: VisualType,
    #[validate(length(min = 1))]
    pub visual_description: String,
    #[validate(length(min = 1))]
    pub narration_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onscreen_text: Option<String>,
    #[validate(length(min = 1))]
    pub ai_prompt: String,
}

impl From<StoryboardScene> for AssetSceneInput {
    fn from(scene: StoryboardScene) -> Self {
        Self {
            scene_number: scene.scene_number,
            duration_seconds: f64::from(scene.duration_seconds),
            visual_type: scene.visual_type,
            visual_description: scene.visual_description,
            narration_text: scene.narration_text,
            onscreen_text: Some(scene.onscreen_text).filter(|t| !t.is_empty()),
            ai_prompt: scene.ai_prompt,
        }
    }
}

/// Configuration for a locally composed motion-graphics scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MotionConfig {
    pub text: String,
    pub duration: f64,
    pub style: String,
}

impl MotionConfig {
    /// Branded motion graphic for a scene: on-screen text when present,
    /// otherwise the visual description.
    pub fn for_scene(scene: &AssetSceneInput) -> Self {
        let text = scene
            .onscreen_text
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&scene.visual_description);

        Self {
            text: text.to_string(),
            duration: scene.duration_seconds,
            style: "branded".to_string(),
        }
    }
}

/// Media references for a scene being rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct SceneAssets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub photo_url: Option<String>,
    #[validate(url)]
    pub voiceover_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion_config: Option<serde_json::Map<String, serde_json::Value>>,
}

/// A fully materialized scene handed to the compositor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct RenderScene {
    #[validate(range(min = 1))]
    pub scene_number: u32,
    #[validate(range(exclusive_min = 0.0))]
    pub duration_seconds: f64,
    pub visual_type: VisualType,
    #[validate(length(min = 1))]
    pub visual_description: String,
    #[validate(length(min = 1))]
    pub narration_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onscreen_text: Option<String>,
    #[validate(nested)]
    pub assets: SceneAssets,
}

/// Brand styling applied to every rendered video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct Branding {
    #[validate(url)]
    pub logo_url: String,
    #[validate(custom(function = "validate_hex_color"))]
    pub primary_color: String,
    #[validate(custom(function = "validate_hex_color"))]
    pub secondary_color: String,
    #[validate(length(min = 1))]
    pub font_family: String,
}
