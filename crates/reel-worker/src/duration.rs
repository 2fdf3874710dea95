//! Scene duration normalization.
//!
//! LLM storyboards rarely add up to the target length. [`normalize`]
//! validates the drafted scenes and repairs their durations so the total is
//! exact: first by adjusting only the last scene when that keeps it within
//! bounds, otherwise by scaling every scene proportionally and letting the
//! last scene absorb the rounding residual. The residual may push the last
//! scene outside its bounds, and rounding may shrink a tiny scene to zero;
//! both are accepted with a warning.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::{info, warn};

use reel_models::{StoryboardScene, VisualType};

/// Inclusive per-scene duration bounds, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationBounds {
    pub min: u32,
    pub max: u32,
}

impl Default for DurationBounds {
    fn default() -> Self {
        Self { min: 3, max: 15 }
    }
}

impl DurationBounds {
    pub fn contains(&self, seconds: i64) -> bool {
        seconds >= i64::from(self.min) && seconds <= i64::from(self.max)
    }
}

/// A scene as drafted by the LLM. Fields of the wrong JSON type read as
/// missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftScene {
    #[serde(default, deserialize_with = "lenient")]
    pub scene_number: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub duration_seconds: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub visual_description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub visual_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub narration_text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub onscreen_text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub ai_prompt: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    #[error("Storyboard has no scenes")]
    Empty,

    #[error("Scene {scene} is missing required fields")]
    MissingFields { scene: String },

    #[error("Scene {scene} has invalid visual_type: {visual_type}")]
    InvalidVisualType { scene: u32, visual_type: String },

    #[error("Scene {scene} has a non-positive duration: {duration}")]
    NonPositiveDuration { scene: u32, duration: f64 },
}

impl DraftScene {
    fn label(&self) -> String {
        self.scene_number
            .filter(|n| n.is_finite())
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".to_string())
    }

    /// Validate into a whole-second scene.
    fn into_scene(self) -> Result<StoryboardScene, NormalizeError> {
        let missing = || NormalizeError::MissingFields {
            scene: self.label(),
        };

        let scene_number = match self.scene_number {
            Some(n) if n.is_finite() && n >= 1.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) => {
                n as u32
            }
            _ => return Err(missing()),
        };
        let (Some(duration), Some(visual_description), Some(visual_type), Some(narration_text), Some(onscreen_text), Some(ai_prompt)) = (
            self.duration_seconds,
            self.visual_description.clone(),
            self.visual_type.clone(),
            self.narration_text.clone(),
            self.onscreen_text.clone(),
            self.ai_prompt.clone(),
        ) else {
            return Err(missing());
        };

        let visual_type: VisualType =
            visual_type
                .parse()
                .map_err(|_| NormalizeError::InvalidVisualType {
                    scene: scene_number,
                    visual_type: visual_type.clone(),
                })?;

        let rounded = duration.round();
        if !duration.is_finite() || rounded < 1.0 || rounded > f64::from(u32::MAX) {
            return Err(NormalizeError::NonPositiveDuration {
                scene: scene_number,
                duration,
            });
        }

        Ok(StoryboardScene {
            scene_number,
            duration_seconds: rounded as u32,
            visual_description,
            visual_type,
            narration_text,
            onscreen_text,
            ai_prompt,
        })
    }
}

/// Validate drafted scenes and make their durations sum to `target` seconds.
///
/// Fails without partial results if any scene is invalid.
pub fn normalize(
    drafts: Vec<DraftScene>,
    target: u32,
    bounds: DurationBounds,
) -> Result<Vec<StoryboardScene>, NormalizeError> {
    if drafts.is_empty() {
        return Err(NormalizeError::Empty);
    }

    let mut scenes = drafts
        .into_iter()
        .map(DraftScene::into_scene)
        .collect::<Result<Vec<_>, _>>()?;

    let durations: Vec<i64> = scenes.iter().map(|s| i64::from(s.duration_seconds)).collect();
    let adjusted = fit_durations(&durations, i64::from(target), bounds);

    for (scene, duration) in scenes.iter_mut().zip(adjusted) {
        if duration < 1 {
            warn!(
                scene_number = scene.scene_number,
                duration,
                "Scene rounded below one second after redistribution"
            );
        }
        scene.duration_seconds = u32::try_from(duration.max(0)).unwrap_or(u32::MAX);
    }

    Ok(scenes)
}

/// Durations summing to `target`. `durations` must be non-empty and positive.
fn fit_durations(durations: &[i64], target: i64, bounds: DurationBounds) -> Vec<i64> {
    let total: i64 = durations.iter().sum();
    let difference = target - total;
    let mut fitted = durations.to_vec();

    if difference == 0 {
        info!(scene_count = durations.len(), "Storyboard already hits target duration");
        return fitted;
    }

    warn!(total, target, difference, "Adjusting storyboard duration");

    let last = fitted.len() - 1;
    let adjusted_last = fitted[last] + difference;
    if bounds.contains(adjusted_last) {
        info!(
            old_duration = fitted[last],
            new_duration = adjusted_last,
            "Adjusted last scene duration"
        );
        fitted[last] = adjusted_last;
        return fitted;
    }

    info!(scene_count = fitted.len(), "Redistributing duration proportionally");

    for duration in fitted.iter_mut() {
        *duration = ((*duration as f64 / total as f64) * target as f64).round() as i64;
    }
    let residual = target - fitted.iter().sum::<i64>();
    fitted[last] += residual;

    if !bounds.contains(fitted[last]) {
        warn!(
            duration = fitted[last],
            min = bounds.min,
            max = bounds.max,
            "Last scene outside bounds after redistribution"
        );
    }

    fitted
}
