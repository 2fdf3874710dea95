//! The compositor collaborator.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RenderResult;

/// Receives fractional render progress in `0.0..=1.0`.
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

/// A prepared compositor bundle, reusable across renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleHandle {
    /// Location the renderer serves the bundle from
    pub serve_url: String,
}

impl BundleHandle {
    pub fn new(serve_url: impl Into<String>) -> Self {
        Self {
            serve_url: serve_url.into(),
        }
    }
}

/// Declarative scene-to-video renderer.
#[async_trait]
pub trait Compositor: Send + Sync {
    /// Prepare the composition bundle. Callers memoize the result.
    async fn bundle(&self) -> RenderResult<BundleHandle>;

    /// Render `composition_id` with `props` into `output`.
    async fn render(
        &self,
        bundle: &BundleHandle,
        composition_id: &str,
        props: &serde_json::Value,
        output: &Path,
        on_progress: ProgressFn,
    ) -> RenderResult<PathBuf>;
}
