//! Storyboard generation handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use validator::Validate;

use reel_models::{GenerationStatus, JobId, StoryboardRequest, StoryboardScene};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryboardAcceptedResponse {
    pub job_id: JobId,
    pub status: GenerationStatus,
    pub message: String,
    pub topic_id: String,
    pub status_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryboardStatusResponse {
    pub job_id: JobId,
    pub topic_id: String,
    pub topic_title: String,
    pub storyboard_id: String,
    pub status: GenerationStatus,
    pub scenes: Vec<StoryboardScene>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Start storyboard generation for a topic.
pub async fn start_storyboard_generation(
    State(state): State<AppState>,
    Json(request): Json<StoryboardRequest>,
) -> ApiResult<(StatusCode, Json<StoryboardAcceptedResponse>)> {
    request.validate()?;

    let job = state.storyboards.start(request);

    info!(
        job_id = %job.id,
        topic_id = %job.topic_id,
        topic_title = %job.topic_title,
        "Storyboard generation job started"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(StoryboardAcceptedResponse {
            status_url: format!("/storyboard/generate/{}", job.id),
            job_id: job.id,
            status: job.status,
            message: "Storyboard generation started".to_string(),
            topic_id: job.topic_id,
        }),
    ))
}

/// Get storyboard generation job status.
pub async fn get_storyboard_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<StoryboardStatusResponse>> {
    let job = state
        .storyboards
        .registry()
        .get(&JobId::from_string(job_id))
        .ok_or_else(ApiError::job_not_found)?;

    Ok(Json(StoryboardStatusResponse {
        job_id: job.id,
        topic_id: job.topic_id,
        topic_title: job.topic_title,
        storyboard_id: job.storyboard_id,
        status: job.status,
        scenes: job.scenes,
        created_at: job.created_at,
        completed_at: job.completed_at,
        error: job.error,
    }))
}
