//! Status enums for the three job kinds and per-scene asset tasks.
//!
//! Every enum exposes a `rank()`: statuses only ever move to a strictly
//! higher rank, and terminal statuses share the highest rank so a job can
//! never leave `completed`/`failed` once it gets there.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Render job status: `queued → bundling → rendering → {completed | failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderStatus {
    /// Job accepted, nothing started yet
    #[default]
    Queued,
    /// Compositor bundle is being prepared
    Bundling,
    /// Compositor is producing frames
    Rendering,
    /// Output file is ready for download
    Completed,
    /// Bundling or rendering failed
    Failed,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::Queued => "queued",
            RenderStatus::Bundling => "bundling",
            RenderStatus::Rendering => "rendering",
            RenderStatus::Completed => "completed",
            RenderStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RenderStatus::Completed | RenderStatus::Failed)
    }

    pub fn rank(&self) -> u8 {
        match self {
            RenderStatus::Queued => 0,
            RenderStatus::Bundling => 1,
            RenderStatus::Rendering => 2,
            RenderStatus::Completed | RenderStatus::Failed => 3,
        }
    }
}

impl fmt::Display for RenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status shared by asset-generation and storyboard-generation jobs:
/// `queued → generating → {completed | failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    #[default]
    Queued,
    Generating,
    Completed,
    Failed,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Queued => "queued",
            GenerationStatus::Generating => "generating",
            GenerationStatus::Completed => "completed",
            GenerationStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationStatus::Completed | GenerationStatus::Failed)
    }

    pub fn rank(&self) -> u8 {
        match self {
            GenerationStatus::Queued => 0,
            GenerationStatus::Generating => 1,
            GenerationStatus::Completed | GenerationStatus::Failed => 2,
        }
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of one per-scene sub-task (visual or voiceover):
/// `pending → generating → {done | failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    #[default]
    Pending,
    Generating,
    Done,
    Failed,
}

impl AssetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Pending => "pending",
            AssetStatus::Generating => "generating",
            AssetStatus::Done => "done",
            AssetStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AssetStatus::Done | AssetStatus::Failed)
    }

    pub fn rank(&self) -> u8 {
        match self {
            AssetStatus::Pending => 0,
            AssetStatus::Generating => 1,
            AssetStatus::Done | AssetStatus::Failed => 2,
        }
    }

    /// Whether moving from `self` to `next` respects the lifecycle.
    pub fn can_advance_to(&self, next: AssetStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_status_serde() {
        assert_eq!(
            serde_json::to_string(&RenderStatus::Bundling).unwrap(),
            "\"bundling\""
        );
        let status: RenderStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, RenderStatus::Completed);
    }

    #[test]
    fn test_terminal_statuses_share_rank() {
        assert_eq!(RenderStatus::Completed.rank(), RenderStatus::Failed.rank());
        assert_eq!(
            GenerationStatus::Completed.rank(),
            GenerationStatus::Failed.rank()
        );
        assert!(RenderStatus::Failed.is_terminal());
        assert!(!GenerationStatus::Generating.is_terminal());
    }

    #[test]
    fn test_asset_status_advance() {
        assert!(AssetStatus::Pending.can_advance_to(AssetStatus::Generating));
        assert!(AssetStatus::Generating.can_advance_to(AssetStatus::Failed));
        assert!(!AssetStatus::Done.can_advance_to(AssetStatus::Failed));
        assert!(!AssetStatus::Generating.can_advance_to(AssetStatus::Pending));
    }
}
