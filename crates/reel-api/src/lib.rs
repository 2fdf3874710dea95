//! Axum HTTP API server.
//!
//! This crate provides:
//! - Submission and status endpoints for render, asset-generation and
//!   storyboard-generation jobs
//! - Static serving of rendered videos and persisted assets
//! - Periodic sweeping of old job records
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::JobSweeper;
pub use state::{AppState, Collaborators};
