//! Compositor driven through its command-line interface.

use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::compositor::{BundleHandle, Compositor, ProgressFn};
use crate::error::{RenderError, RenderResult};
use crate::progress::parse_progress_line;

/// Lines of stderr kept for failure messages.
const STDERR_TAIL: usize = 20;

/// Configuration for the CLI compositor.
#[derive(Debug, Clone)]
pub struct CompositorConfig {
    /// Executable to launch (e.g. `npx`)
    pub bin: String,
    /// Leading arguments before the subcommand (e.g. `remotion`)
    pub args: Vec<String>,
    /// Composition entry point
    pub entry: PathBuf,
    /// Where the bundle is written
    pub bundle_dir: PathBuf,
    /// Output codec
    pub codec: String,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            bin: "npx".to_string(),
            args: vec!["remotion".to_string()],
            entry: PathBuf::from("src/remotion/index.ts"),
            bundle_dir: PathBuf::from("./.bundle"),
            codec: "h264".to_string(),
        }
    }
}

impl CompositorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bin: std::env::var("COMPOSITOR_BIN").unwrap_or(defaults.bin),
            args: std::env::var("COMPOSITOR_ARGS")
                .map(|s| s.split_whitespace().map(String::from).collect())
                .unwrap_or(defaults.args),
            entry: std::env::var("COMPOSITOR_ENTRY")
                .map(PathBuf::from)
                .unwrap_or(defaults.entry),
            bundle_dir: std::env::var("COMPOSITOR_BUNDLE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.bundle_dir),
            codec: std::env::var("COMPOSITOR_CODEC").unwrap_or(defaults.codec),
        }
    }

    /// Arguments for the bundle subcommand.
    pub fn bundle_args(&self) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("bundle".to_string());
        args.push(self.entry.to_string_lossy().to_string());
        args.push("--out-dir".to_string());
        args.push(self.bundle_dir.to_string_lossy().to_string());
        args
    }

    /// Arguments for the render subcommand.
    pub fn render_args(
        &self,
        bundle: &BundleHandle,
        composition_id: &str,
        output: &Path,
        props_file: &Path,
    ) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("render".to_string());
        args.push(bundle.serve_url.clone());
        args.push(composition_id.to_string());
        args.push(output.to_string_lossy().to_string());
        args.push(format!("--props={}", props_file.to_string_lossy()));
        args.push(format!("--codec={}", self.codec));
        args
    }
}

/// Check if the compositor executable is available.
pub fn check_compositor(bin: &str) -> RenderResult<PathBuf> {
    which::which(bin).map_err(|_| RenderError::CompositorNotFound(bin.to_string()))
}

/// Runs the compositor CLI as a child process.
pub struct CliCompositor {
    config: CompositorConfig,
}

impl CliCompositor {
    pub fn new(config: CompositorConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(CompositorConfig::from_env())
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Run the compositor, forwarding parsed progress from both output
    /// streams. A non-zero exit is turned into an error by `fail`, given the
    /// stderr tail and exit code.
    async fn run(
        &self,
        args: &[String],
        on_progress: ProgressFn,
        fail: fn(String, Option<i32>) -> RenderError,
    ) -> RenderResult<()> {
        let bin = check_compositor(&self.config.bin)?;
        debug!("Running compositor: {} {}", self.config.bin, args.join(" "));

        let mut child = Command::new(bin)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("compositor stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("compositor stderr not captured"))?;

        let stdout_handle = tokio::spawn(read_lines(stdout, on_progress.clone()));
        let stderr_handle = tokio::spawn(read_lines(stderr, on_progress));

        let status = child.wait().await?;

        let _ = stdout_handle.await;
        let tail = stderr_handle.await.unwrap_or_default();

        if status.success() {
            return Ok(());
        }

        warn!(exit_code = ?status.code(), "Compositor exited with non-zero status");
        let message = if tail.is_empty() {
            "compositor exited with non-zero status".to_string()
        } else {
            tail
        };
        Err(fail(message, status.code()))
    }
}

/// Parse progress from every line; keep the last few for diagnostics.
async fn read_lines<R>(stream: R, on_progress: ProgressFn) -> String
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream).lines();
    let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL);

    while let Ok(Some(line)) = reader.next_line().await {
        if let Some(progress) = parse_progress_line(&line) {
            on_progress(progress);
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        if tail.len() == STDERR_TAIL {
            tail.pop_front();
        }
        tail.push_back(line);
    }

    tail.into_iter().collect::<Vec<_>>().join("\n")
}

#[async_trait]
impl Compositor for CliCompositor {
    async fn bundle(&self) -> RenderResult<BundleHandle> {
        info!(entry = %self.config.entry.display(), "Creating compositor bundle");
        tokio::fs::create_dir_all(&self.config.bundle_dir).await?;

        let args = self.config.bundle_args();
        self.run(&args, Arc::new(|_: f64| {}), |message, code| {
            RenderError::bundle_failed(message, code)
        })
        .await?;

        let location = self.config.bundle_dir.to_string_lossy().to_string();
        info!(location = %location, "Compositor bundle created");
        Ok(BundleHandle::new(location))
    }

    async fn render(
        &self,
        bundle: &BundleHandle,
        composition_id: &str,
        props: &serde_json::Value,
        output: &Path,
        on_progress: ProgressFn,
    ) -> RenderResult<PathBuf> {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // The props file must outlive the child process.
        let mut props_file = tempfile::Builder::new()
            .prefix("reel-props-")
            .suffix(".json")
            .tempfile()?;
        props_file.write_all(&serde_json::to_vec(props)?)?;
        props_file.flush()?;

        let args = self
            .config
            .render_args(bundle, composition_id, output, props_file.path());

        info!(composition = composition_id, output = %output.display(), "Rendering composition");

        self.run(&args, on_progress, |message, code| {
            RenderError::render_failed(message, code)
        })
        .await?;

        drop(props_file);
        Ok(output.to_path_buf())
    }
}
