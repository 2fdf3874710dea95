//! Background job processing.
//!
//! This crate provides:
//! - Storyboard generation with duration normalization
//! - Per-scene asset generation with failure isolation
//! - Render orchestration against the compositor
//! - A supervisor bounding concurrency and capturing job panics
//! - Structured job logging and job metrics

pub mod asset_pipeline;
pub mod config;
pub mod duration;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod prompts;
pub mod render;
pub mod storyboard;
pub mod supervisor;

pub use asset_pipeline::AssetPipeline;
pub use config::{VoiceoverSettings, WorkerConfig};
pub use duration::{normalize, DraftScene, DurationBounds, NormalizeError};
pub use error::{WorkerError, WorkerResult};
pub use logging::JobLogger;
pub use render::RenderOrchestrator;
pub use storyboard::{parse_storyboard, StoryboardService};
pub use supervisor::JobSupervisor;
