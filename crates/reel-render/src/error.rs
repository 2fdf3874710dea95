//! Error types for compositor operations.

use thiserror::Error;

/// Result type for compositor operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while bundling or rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Compositor binary not found in PATH: {0}")]
    CompositorNotFound(String),

    #[error("Bundle failed: {message}")]
    BundleFailed {
        message: String,
        exit_code: Option<i32>,
    },

    #[error("Render failed: {message}")]
    RenderFailed {
        message: String,
        exit_code: Option<i32>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RenderError {
    pub fn bundle_failed(message: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::BundleFailed {
            message: message.into(),
            exit_code,
        }
    }

    pub fn render_failed(message: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::RenderFailed {
            message: message.into(),
            exit_code,
        }
    }
}
