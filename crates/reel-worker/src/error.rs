//! Worker error types.

use thiserror::Error;

use crate::duration::NormalizeError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Provider(#[from] reel_provider::ProviderError),

    #[error(transparent)]
    Storage(#[from] reel_storage::StorageError),

    #[error(transparent)]
    Render(#[from] reel_render::RenderError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("{0}")]
    InvalidResponse(String),

    #[error("{0}")]
    NoResult(String),

    #[error("Job failed: {0}")]
    JobFailed(String),
}

impl WorkerError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn no_result(msg: impl Into<String>) -> Self {
        Self::NoResult(msg.into())
    }

    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Provider(e) => e.is_retryable(),
            WorkerError::Storage(_) => true,
            _ => false,
        }
    }
}
