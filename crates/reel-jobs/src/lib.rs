//! Job lifecycle primitives.
//!
//! This crate provides:
//! - `JobRegistry`: a per-kind, in-memory job store with monotonic status
//!   enforcement and age-based sweeping
//! - `poll_until_done`: exponential-backoff polling of long-running
//!   external tasks with a terminal-failure short-circuit

pub mod kinds;
pub mod poller;
pub mod registry;

pub use poller::{poll_until_done, PollConfig, PollError, PollStatus};
pub use registry::{JobRegistry, Lifecycle, Sweep, TrackedJob};

/// Registry of render jobs.
pub type RenderRegistry = JobRegistry<reel_models::RenderJob>;
/// Registry of asset-generation jobs.
pub type AssetRegistry = JobRegistry<reel_models::AssetGenerationJob>;
/// Registry of storyboard-generation jobs.
pub type StoryboardRegistry = JobRegistry<reel_models::StoryboardJob>;
