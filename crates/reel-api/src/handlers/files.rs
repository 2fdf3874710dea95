//! Persisted asset downloads.
//!
//! Served per file rather than through a nested directory service so that
//! `/assets/generate` stays routable alongside `/assets/:filename`.

use axum::extract::{Path, Request, State};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::error::ApiError;
use crate::state::AppState;

/// Serve a persisted asset from the assets directory.
pub async fn serve_asset(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    request: Request,
) -> Response {
    if !is_plain_filename(&filename) {
        return ApiError::not_found("Asset not found").into_response();
    }

    let path = state.worker.assets_dir.join(&filename);
    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_filenames() {
        assert!(is_plain_filename("abc-scene1-photo.jpg"));
        assert!(!is_plain_filename(""));
        assert!(!is_plain_filename("../secrets.env"));
        assert!(!is_plain_filename(".env"));
        assert!(!is_plain_filename("a\\b.jpg"));
    }
}
