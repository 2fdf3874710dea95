//! Compositor integration for rendering reels.
//!
//! This crate provides:
//! - The `Compositor` trait the render orchestrator drives
//! - A CLI-backed compositor that bundles once and renders with progress
//! - Progress line parsing for the compositor's console output

pub mod cli;
pub mod compositor;
pub mod error;
pub mod progress;

pub use cli::{check_compositor, CliCompositor, CompositorConfig};
pub use compositor::{BundleHandle, Compositor, ProgressFn};
pub use error::{RenderError, RenderResult};
pub use progress::parse_progress_line;
