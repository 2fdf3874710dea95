//! Registry bindings for the three job kinds.

use chrono::{DateTime, Utc};

use reel_models::{
    AssetGenerationJob, GenerationStatus, JobId, RenderJob, RenderStatus, StoryboardJob,
};

use crate::registry::{Lifecycle, TrackedJob};

impl Lifecycle for RenderStatus {
    fn rank(&self) -> u8 {
        RenderStatus::rank(self)
    }

    fn is_terminal(&self) -> bool {
        RenderStatus::is_terminal(self)
    }

    fn label(&self) -> &'static str {
        self.as_str()
    }
}

impl Lifecycle for GenerationStatus {
    fn rank(&self) -> u8 {
        GenerationStatus::rank(self)
    }

    fn is_terminal(&self) -> bool {
        GenerationStatus::is_terminal(self)
    }

    fn label(&self) -> &'static str {
        self.as_str()
    }
}

impl TrackedJob for RenderJob {
    type Status = RenderStatus;

    fn id(&self) -> &JobId {
        &self.id
    }

    fn status(&self) -> RenderStatus {
        self.status
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl TrackedJob for AssetGenerationJob {
    type Status = GenerationStatus;

    fn id(&self) -> &JobId {
        &self.id
    }

    fn status(&self) -> GenerationStatus {
        self.status
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl TrackedJob for StoryboardJob {
    type Status = GenerationStatus;

    fn id(&self) -> &JobId {
        &self.id
    }

    fn status(&self) -> GenerationStatus {
        self.status
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use reel_models::{StoryboardRequest, StoryboardJob};

    use crate::StoryboardRegistry;
    use super::*;

    #[test]
    fn test_storyboard_job_lifecycle_in_registry() {
        let registry = StoryboardRegistry::new("storyboard");
        let job = registry.create(StoryboardJob::new(&StoryboardRequest {
            topic_id: "T-1".to_string(),
            topic_title: "Title".to_string(),
            topic_summary: "Summary".to_string(),
            content_pillar: "pillar".to_string(),
        }));

        assert!(registry.update(&job.id, |j| j.status = GenerationStatus::Generating));
        assert!(registry.update(&job.id, |j| {
            j.status = GenerationStatus::Failed;
            j.error = Some("no scenes".to_string());
            j.completed_at = Some(Utc::now());
        }));
        assert!(!registry.update(&job.id, |j| j.status = GenerationStatus::Completed));

        let stored = registry.get(&job.id).unwrap();
        assert_eq!(stored.status, GenerationStatus::Failed);
        assert_eq!(stored.error.as_deref(), Some("no scenes"));
    }
}
