//! Shared data models for the reel generation engine.
//!
//! This crate provides Serde-serializable types for:
//! - Job identifiers and per-kind status enums
//! - Storyboard scenes and visual types
//! - Render, asset-generation and storyboard-generation jobs
//! - Validated submission payloads

pub mod asset;
pub mod job;
pub mod render;
pub mod scene;
pub mod status;
pub mod storyboard;
pub mod validation;

// Re-export common types
pub use asset::{AssetGenerationJob, AssetGenerationRequest, AssetSceneStatus};
pub use job::JobId;
pub use render::{RenderJob, RenderRequest};
pub use scene::{
    AssetSceneInput, Branding, MotionConfig, RenderScene, SceneAssets, StoryboardScene,
    VisualType, VisualTypeError,
};
pub use status::{AssetStatus, GenerationStatus, RenderStatus};
pub use storyboard::{StoryboardJob, StoryboardRequest};
