//! Render job handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use validator::Validate;

use reel_models::{JobId, RenderJob, RenderRequest, RenderStatus};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Response for an accepted render submission.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderAcceptedResponse {
    pub job_id: JobId,
    pub status: RenderStatus,
    pub message: String,
    pub storyboard_id: String,
    pub scene_count: usize,
    pub total_duration_seconds: f64,
    pub status_url: String,
}

/// Render job status.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderStatusResponse {
    pub job_id: JobId,
    pub storyboard_id: String,
    pub status: RenderStatus,
    pub progress: u8,
    pub scene_count: usize,
    pub total_duration_seconds: f64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<RenderJob> for RenderStatusResponse {
    fn from(job: RenderJob) -> Self {
        Self {
            job_id: job.id,
            storyboard_id: job.storyboard_id,
            status: job.status,
            progress: job.progress,
            scene_count: job.scene_count,
            total_duration_seconds: job.total_duration_seconds,
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
            download_url: job.download_url,
            error: job.error,
        }
    }
}

/// Queue a storyboard for rendering.
pub async fn submit_render(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> ApiResult<(StatusCode, Json<RenderAcceptedResponse>)> {
    request.validate()?;

    let job = state.renders.submit(request);

    info!(
        job_id = %job.id,
        storyboard_id = %job.storyboard_id,
        scene_count = job.scene_count,
        "Render request accepted"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(RenderAcceptedResponse {
            status_url: format!("/render/{}", job.id),
            job_id: job.id,
            status: job.status,
            message: "Render job queued".to_string(),
            storyboard_id: job.storyboard_id,
            scene_count: job.scene_count,
            total_duration_seconds: job.total_duration_seconds,
        }),
    ))
}

/// Get render job status.
pub async fn get_render_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<RenderStatusResponse>> {
    let job = state
        .renders
        .registry()
        .get(&JobId::from_string(job_id))
        .ok_or_else(ApiError::job_not_found)?;

    Ok(Json(job.into()))
}
