//! Provider client error types.

use thiserror::Error;

use reel_jobs::PollError;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("{operation} error: {message} (code: {code})")]
    Api {
        operation: String,
        code: i64,
        message: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Task {task_id} ({job_type}) failed: {message}")]
    TaskFailed {
        task_id: String,
        job_type: String,
        message: String,
    },

    #[error("Task {task_id} ({job_type}) timed out after {attempts} attempts ({elapsed_secs}s)")]
    PollTimeout {
        task_id: String,
        job_type: String,
        attempts: u32,
        elapsed_secs: u64,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    pub fn not_configured(msg: impl Into<String>) -> Self {
        Self::NotConfigured(msg.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Transient failures worth retrying at a higher level.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Network(_) | ProviderError::PollTimeout { .. })
    }

    /// The provider explicitly reported the task as failed.
    pub fn is_task_failure(&self) -> bool {
        matches!(self, ProviderError::TaskFailed { .. })
    }
}

impl From<PollError<ProviderError>> for ProviderError {
    fn from(err: PollError<ProviderError>) -> Self {
        match err {
            PollError::Check(inner) => inner,
            PollError::Terminal {
                job_id,
                job_type,
                message,
            } => ProviderError::TaskFailed {
                task_id: job_id,
                job_type,
                message,
            },
            PollError::Timeout {
                job_id,
                job_type,
                attempts,
                elapsed,
            } => ProviderError::PollTimeout {
                task_id: job_id,
                job_type,
                attempts,
                elapsed_secs: elapsed.as_secs(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_poll_error_conversion() {
        let err: ProviderError = PollError::<ProviderError>::Timeout {
            job_id: "t-1".to_string(),
            job_type: "photo-generation".to_string(),
            attempts: 30,
            elapsed: Duration::from_secs(1500),
        }
        .into();
        assert!(err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Task t-1 (photo-generation) timed out after 30 attempts (1500s)"
        );

        let err: ProviderError =
            PollError::Check(ProviderError::request_failed("503 Service Unavailable")).into();
        assert!(matches!(err, ProviderError::RequestFailed(_)));
    }
}
