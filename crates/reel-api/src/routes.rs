//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use crate::handlers::{
    get_asset_generation_status, get_render_status, get_storyboard_status, health, serve_asset,
    start_asset_generation, start_storyboard_generation, submit_render,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let job_routes = Router::new()
        .route("/render", post(submit_render))
        .route("/render/:job_id", get(get_render_status))
        .route("/assets/generate", post(start_asset_generation))
        .route("/assets/generate/:job_id", get(get_asset_generation_status))
        .route("/storyboard/generate", post(start_storyboard_generation))
        .route("/storyboard/generate/:job_id", get(get_storyboard_status));

    let file_routes = Router::new()
        .route("/assets/:filename", get(serve_asset))
        .nest_service("/output", ServeDir::new(&state.worker.output_dir));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .route("/health", get(health))
        .merge(job_routes)
        .merge(file_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
