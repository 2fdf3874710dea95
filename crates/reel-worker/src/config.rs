//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use reel_provider::VoiceoverInput;

use crate::duration::DurationBounds;

/// Voice settings applied to every narration.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceoverSettings {
    pub voice: String,
    pub stability: f64,
    pub similarity_boost: f64,
    pub speed: f64,
    pub language_code: Option<String>,
}

impl Default for VoiceoverSettings {
    fn default() -> Self {
        Self {
            voice: "Rachel".to_string(),
            stability: 0.5,
            similarity_boost: 0.75,
            speed: 1.0,
            language_code: None,
        }
    }
}

impl VoiceoverSettings {
    /// Provider input narrating `text` with these settings.
    pub fn input_for(&self, text: impl Into<String>) -> VoiceoverInput {
        VoiceoverInput {
            text: text.into(),
            voice: self.voice.clone(),
            stability: Some(self.stability),
            similarity_boost: Some(self.similarity_boost),
            speed: Some(self.speed),
            language_code: self.language_code.clone(),
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Public base URL for downloads and persisted assets
    pub base_url: String,
    /// Directory rendered videos are written to
    pub output_dir: PathBuf,
    /// Directory the local asset store writes to
    pub assets_dir: PathBuf,
    /// Storyboard target length in seconds
    pub target_duration_secs: u32,
    /// Per-scene duration bounds
    pub scene_bounds: DurationBounds,
    /// Maximum jobs running at once (all kinds)
    pub max_concurrent_jobs: usize,
    /// Jobs older than this are swept
    pub job_max_age: Duration,
    /// How often registries are swept
    pub sweep_interval: Duration,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
    /// Brand named in storyboard prompts
    pub brand_name: String,
    /// Compositor composition to render
    pub composition_id: String,
    pub voiceover: VoiceoverSettings,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            output_dir: PathBuf::from("./output"),
            assets_dir: PathBuf::from("./assets"),
            target_duration_secs: 60,
            scene_bounds: DurationBounds::default(),
            max_concurrent_jobs: 8,
            job_max_age: Duration::from_secs(24 * 60 * 60),
            sweep_interval: Duration::from_secs(60 * 60),
            shutdown_timeout: Duration::from_secs(30),
            brand_name: "Katbox".to_string(),
            composition_id: "KatboxVideo".to_string(),
            voiceover: VoiceoverSettings::default(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("RENDER_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./output")),
            assets_dir: std::env::var("ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./assets")),
            target_duration_secs: std::env::var("TARGET_DURATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            scene_bounds: DurationBounds {
                min: std::env::var("SCENE_MIN_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3),
                max: std::env::var("SCENE_MAX_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(15),
            },
            max_concurrent_jobs: std::env::var("MAX_CONCURRENT_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(8),
            job_max_age: Duration::from_secs(
                std::env::var("JOB_MAX_AGE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(86_400),
            ),
            sweep_interval: Duration::from_secs(
                std::env::var("SWEEP_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|n| *n > 0)
                    .unwrap_or(3_600),
            ),
            shutdown_timeout: Duration::from_secs(
                std::env::var("WORKER_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            brand_name: std::env::var("BRAND_NAME").unwrap_or_else(|_| "Katbox".to_string()),
            composition_id: std::env::var("COMPOSITION_ID")
                .unwrap_or_else(|_| "KatboxVideo".to_string()),
            voiceover: VoiceoverSettings {
                voice: std::env::var("VOICEOVER_VOICE").unwrap_or_else(|_| "Rachel".to_string()),
                stability: std::env::var("VOICEOVER_STABILITY")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.5),
                similarity_boost: std::env::var("VOICEOVER_SIMILARITY_BOOST")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.75),
                speed: std::env::var("VOICEOVER_SPEED")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1.0),
                language_code: std::env::var("VOICEOVER_LANGUAGE")
                    .ok()
                    .filter(|s| !s.is_empty()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voiceover_input() {
        let input = VoiceoverSettings::default().input_for("Tara, kain na!");
        assert_eq!(input.voice, "Rachel");
        assert_eq!(input.stability, Some(0.5));
        assert_eq!(input.similarity_boost, Some(0.75));
        assert_eq!(input.speed, Some(1.0));
        assert!(input.language_code.is_none());
    }

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.target_duration_secs, 60);
        assert_eq!(config.scene_bounds, DurationBounds { min: 3, max: 15 });
        assert_eq!(config.job_max_age, Duration::from_secs(86_400));
    }
}
