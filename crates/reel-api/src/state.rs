//! Application state.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tracing::{info, warn};

use reel_jobs::{AssetRegistry, RenderRegistry, StoryboardRegistry, Sweep};
use reel_provider::{ChatClient, ChatCompletion, MediaGenerator, TaskClient};
use reel_render::{check_compositor, CliCompositor, Compositor};
use reel_storage::{AssetStore, LocalAssetStore, R2AssetStore};
use reel_worker::{
    AssetPipeline, JobSupervisor, RenderOrchestrator, StoryboardService, WorkerConfig,
};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub worker: Arc<WorkerConfig>,
    pub supervisor: Arc<JobSupervisor>,
    pub renders: Arc<RenderOrchestrator>,
    pub assets: Arc<AssetPipeline>,
    pub storyboards: Arc<StoryboardService>,
    pub started_at: Instant,
}

/// External collaborators behind the job services.
pub struct Collaborators {
    pub generator: Arc<dyn MediaGenerator>,
    pub store: Arc<dyn AssetStore>,
    pub chat: Arc<dyn ChatCompletion>,
    pub compositor: Arc<dyn Compositor>,
}

impl AppState {
    /// Create new application state from the environment.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let worker = WorkerConfig::from_env();

        let generator = TaskClient::from_env().context("Failed to create provider client")?;
        let chat = ChatClient::from_env().context("Failed to create chat client")?;

        let store: Arc<dyn AssetStore> = match std::env::var("ASSET_STORE")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "r2" => {
                info!("Persisting assets to R2");
                Arc::new(R2AssetStore::from_env().context("Failed to create R2 asset store")?)
            }
            _ => {
                let base_url = format!("{}/assets", worker.base_url.trim_end_matches('/'));
                info!(dir = %worker.assets_dir.display(), "Persisting assets to local disk");
                Arc::new(
                    LocalAssetStore::new(&worker.assets_dir, base_url)
                        .context("Failed to create local asset store")?,
                )
            }
        };

        let compositor = CliCompositor::from_env();
        if let Err(e) = check_compositor(&compositor.config().bin) {
            warn!(error = %e, "Compositor not available - renders will fail");
        }

        tokio::fs::create_dir_all(&worker.output_dir)
            .await
            .with_context(|| format!("Failed to create {}", worker.output_dir.display()))?;

        Ok(Self::from_parts(
            config,
            worker,
            Collaborators {
                generator: Arc::new(generator),
                store,
                chat: Arc::new(chat),
                compositor: Arc::new(compositor),
            },
        ))
    }

    /// Wire the job services around the given collaborators.
    pub fn from_parts(config: ApiConfig, worker: WorkerConfig, parts: Collaborators) -> Self {
        let supervisor = Arc::new(JobSupervisor::new(worker.max_concurrent_jobs));

        let renders = Arc::new(RenderOrchestrator::new(
            Arc::new(RenderRegistry::new("render")),
            parts.compositor,
            Arc::clone(&supervisor),
            &worker,
        ));
        let assets = Arc::new(AssetPipeline::new(
            Arc::new(AssetRegistry::new("asset_generation")),
            parts.generator,
            parts.store,
            Arc::clone(&supervisor),
            worker.voiceover.clone(),
        ));
        let storyboards = Arc::new(StoryboardService::new(
            Arc::new(StoryboardRegistry::new("storyboard")),
            parts.chat,
            Arc::clone(&supervisor),
            &worker,
        ));

        Self {
            config,
            worker: Arc::new(worker),
            supervisor,
            renders,
            assets,
            storyboards,
            started_at: Instant::now(),
        }
    }

    /// Every job registry, for the periodic sweep.
    pub fn registries(&self) -> Vec<Arc<dyn Sweep>> {
        vec![
            Arc::clone(self.renders.registry()) as Arc<dyn Sweep>,
            Arc::clone(self.assets.registry()) as Arc<dyn Sweep>,
            Arc::clone(self.storyboards.registry()) as Arc<dyn Sweep>,
        ]
    }
}
