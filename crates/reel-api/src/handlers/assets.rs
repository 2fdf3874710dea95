//! Asset generation handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use validator::Validate;

use reel_models::{AssetGenerationRequest, AssetSceneStatus, GenerationStatus, JobId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetsAcceptedResponse {
    pub job_id: JobId,
    pub status: GenerationStatus,
    pub message: String,
    pub storyboard_id: String,
    pub scene_count: usize,
    pub status_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetsStatusResponse {
    pub job_id: JobId,
    pub storyboard_id: String,
    pub status: GenerationStatus,
    pub scenes: Vec<AssetSceneStatus>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Start asset generation for a storyboard.
pub async fn start_asset_generation(
    State(state): State<AppState>,
    Json(request): Json<AssetGenerationRequest>,
) -> ApiResult<(StatusCode, Json<AssetsAcceptedResponse>)> {
    request.validate()?;

    let job = state.assets.start(request);

    info!(
        job_id = %job.id,
        storyboard_id = %job.storyboard_id,
        scene_count = job.scenes.len(),
        "Asset generation job started"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(AssetsAcceptedResponse {
            status_url: format!("/assets/generate/{}", job.id),
            scene_count: job.scenes.len(),
            job_id: job.id,
            status: job.status,
            message: "Asset generation started".to_string(),
            storyboard_id: job.storyboard_id,
        }),
    ))
}

/// Get asset generation job status.
pub async fn get_asset_generation_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<AssetsStatusResponse>> {
    let job = state
        .assets
        .registry()
        .get(&JobId::from_string(job_id))
        .ok_or_else(ApiError::job_not_found)?;

    Ok(Json(AssetsStatusResponse {
        job_id: job.id,
        storyboard_id: job.storyboard_id,
        status: job.status,
        scenes: job.scenes,
        created_at: job.created_at,
        completed_at: job.completed_at,
        error: job.error,
    }))
}
