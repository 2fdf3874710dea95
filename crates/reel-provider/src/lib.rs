//! Clients for external generation providers.
//!
//! This crate provides:
//! - `TaskClient`: create-task / poll-task client for the media generation
//!   API (video, photo and speech), built on `reel_jobs::poll_until_done`
//! - `ChatClient`: JSON-mode chat completions used for storyboard writing
//!
//! Both clients sit behind traits (`MediaGenerator`, `ChatCompletion`) so
//! the pipelines can be exercised with in-process fakes.

pub mod client;
pub mod error;
pub mod llm;
pub mod types;

pub use client::{MediaGenerator, ProviderConfig, TaskClient};
pub use error::{ProviderError, ProviderResult};
pub use llm::{ChatClient, ChatCompletion, ChatConfig};
pub use types::{PhotoInput, TaskDetail, TaskKind, TaskState, VideoInput, VoiceoverInput};
