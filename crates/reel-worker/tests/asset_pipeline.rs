//! Asset pipeline tests against in-process provider and storage fakes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Barrier;

use reel_jobs::AssetRegistry;
use reel_models::{
    AssetGenerationJob, AssetGenerationRequest, AssetSceneInput, AssetStatus, GenerationStatus,
    VisualType,
};
use reel_provider::{
    MediaGenerator, PhotoInput, ProviderError, ProviderResult, VideoInput, VoiceoverInput,
};
use reel_storage::{AssetStore, StorageError, StorageResult, StoredAsset};
use reel_worker::{AssetPipeline, JobSupervisor, VoiceoverSettings};

/// Fails the voiceover for any narration containing "FAIL"; returns no URLs
/// for prompts containing "EMPTY".
#[derive(Default)]
struct FakeGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl MediaGenerator for FakeGenerator {
    async fn generate_video(&self, input: &VideoInput) -> ProviderResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if input.prompt.contains("EMPTY") {
            return Ok(vec![]);
        }
        Ok(vec!["https://provider.example.com/v.mp4".to_string()])
    }

    async fn generate_photo(&self, input: &PhotoInput) -> ProviderResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if input.prompt.contains("EMPTY") {
            return Ok(vec![]);
        }
        Ok(vec!["https://provider.example.com/p.jpg".to_string()])
    }

    async fn generate_voiceover(&self, input: &VoiceoverInput) -> ProviderResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if input.text.contains("FAIL") {
            return Err(ProviderError::request_failed("voice quota exceeded"));
        }
        Ok(vec!["https://provider.example.com/a.mp3".to_string()])
    }
}

/// Records start/end events per scene and sub-task. Both sub-tasks of a
/// scene must reach the barrier before either can finish, so a scene only
/// completes if its visual and voiceover run at the same time.
///
/// Scenes are tagged by the first word of their prompt and narration. A
/// narration containing "FAIL" fails right after the barrier while the photo
/// is still running.
struct RecordingGenerator {
    events: Mutex<Vec<(String, &'static str, &'static str)>>,
    rendezvous: Barrier,
}

impl RecordingGenerator {
    fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            rendezvous: Barrier::new(2),
        }
    }

    fn record(&self, text: &str, phase: &'static str, kind: &'static str) {
        let tag = text.split_whitespace().next().unwrap_or_default().to_string();
        self.events.lock().unwrap().push((tag, phase, kind));
    }

    fn position(&self, tag: &str, phase: &str, kind: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .position(|(t, p, k)| t == tag && *p == phase && *k == kind)
            .unwrap()
    }
}

#[async_trait]
impl MediaGenerator for RecordingGenerator {
    async fn generate_video(&self, _input: &VideoInput) -> ProviderResult<Vec<String>> {
        Err(ProviderError::request_failed("video not expected"))
    }

    async fn generate_photo(&self, input: &PhotoInput) -> ProviderResult<Vec<String>> {
        self.record(&input.prompt, "start", "visual");
        self.rendezvous.wait().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.record(&input.prompt, "end", "visual");
        Ok(vec!["https://provider.example.com/p.jpg".to_string()])
    }

    async fn generate_voiceover(&self, input: &VoiceoverInput) -> ProviderResult<Vec<String>> {
        self.record(&input.text, "start", "voiceover");
        self.rendezvous.wait().await;
        self.record(&input.text, "end", "voiceover");
        if input.text.contains("FAIL") {
            return Err(ProviderError::request_failed("voice quota exceeded"));
        }
        Ok(vec!["https://provider.example.com/a.mp3".to_string()])
    }
}

/// Fails to persist any filename ending with `fail_suffix`.
#[derive(Default)]
struct FakeStore {
    persisted: Mutex<Vec<String>>,
    fail_suffix: Option<&'static str>,
}

impl FakeStore {
    fn failing_on(suffix: &'static str) -> Self {
        Self {
            fail_suffix: Some(suffix),
            ..Default::default()
        }
    }
}

#[async_trait]
impl AssetStore for FakeStore {
    async fn persist(&self, _source_url: &str, filename: &str) -> StorageResult<StoredAsset> {
        if self.fail_suffix.is_some_and(|suffix| filename.ends_with(suffix)) {
            return Err(StorageError::upload_failed("disk full"));
        }
        self.persisted.lock().unwrap().push(filename.to_string());
        Ok(StoredAsset {
            local_ref: format!("/data/assets/{}", filename),
            public_url: format!("https://cdn.example.com/assets/{}", filename),
        })
    }
}

struct Harness {
    pipeline: Arc<AssetPipeline>,
    registry: Arc<AssetRegistry>,
    generator: Arc<FakeGenerator>,
    store: Arc<FakeStore>,
}

fn pipeline(
    generator: Arc<dyn MediaGenerator>,
    store: Arc<dyn AssetStore>,
) -> (Arc<AssetPipeline>, Arc<AssetRegistry>) {
    let registry = Arc::new(AssetRegistry::new("asset_generation"));
    let pipeline = Arc::new(AssetPipeline::new(
        registry.clone(),
        generator,
        store,
        Arc::new(JobSupervisor::new(2)),
        VoiceoverSettings::default(),
    ));
    (pipeline, registry)
}

fn harness() -> Harness {
    harness_with_store(FakeStore::default())
}

fn harness_with_store(store: FakeStore) -> Harness {
    let generator = Arc::new(FakeGenerator::default());
    let store = Arc::new(store);
    let (pipeline, registry) = pipeline(generator.clone(), store.clone());

    Harness {
        pipeline,
        registry,
        generator,
        store,
    }
}

fn scene(n: u32, visual_type: VisualType, narration: &str, prompt: &str) -> AssetSceneInput {
    AssetSceneInput {
        scene_number: n,
        duration_seconds: 10.0,
        visual_type,
        visual_description: "Meal box on a picnic blanket".to_string(),
        narration_text: narration.to_string(),
        onscreen_text: Some(format!("SCENE {}", n)),
        ai_prompt: prompt.to_string(),
    }
}

fn request(scenes: Vec<AssetSceneInput>) -> AssetGenerationRequest {
    AssetGenerationRequest {
        storyboard_id: "SB-T-9".to_string(),
        scenes,
    }
}

async fn run(h: &Harness, request: AssetGenerationRequest) -> AssetGenerationJob {
    let job = h.registry.create(AssetGenerationJob::new(&request));
    h.pipeline.run(&job.id, &request).await;
    h.registry.get(&job.id).unwrap()
}

#[tokio::test]
async fn test_all_scenes_succeed() {
    let h = harness();
    let job = run(
        &h,
        request(vec![
            scene(1, VisualType::AiVideo, "Gutom ka na?", "Steam rising from rice"),
            scene(2, VisualType::AiPhoto, "Ito na!", "Bento box flat lay"),
        ]),
    )
    .await;

    assert_eq!(job.status, GenerationStatus::Completed);
    assert!(job.error.is_none());
    assert!(job.completed_at.is_some());

    let first = &job.scenes[0];
    assert_eq!(first.visual_status, AssetStatus::Done);
    assert_eq!(first.voiceover_status, AssetStatus::Done);
    assert_eq!(
        first.video_url.as_deref(),
        Some(format!("https://cdn.example.com/assets/{}-scene1-video.mp4", job.id).as_str())
    );
    assert!(first.photo_url.is_none());

    let second = &job.scenes[1];
    assert_eq!(
        second.photo_url.as_deref(),
        Some(format!("https://cdn.example.com/assets/{}-scene2-photo.jpg", job.id).as_str())
    );
    assert_eq!(
        second.voiceover_url.as_deref(),
        Some(format!("https://cdn.example.com/assets/{}-scene2-voiceover.mp3", job.id).as_str())
    );

    assert_eq!(h.store.persisted.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn test_failed_scene_is_isolated() {
    let h = harness();
    let job = run(
        &h,
        request(vec![
            scene(1, VisualType::AiPhoto, "Simula", "Sunrise over Manila"),
            scene(2, VisualType::AiPhoto, "FAIL here", "Office desk lunch"),
            scene(3, VisualType::MotionGraphics, "Order na!", "unused"),
        ]),
    )
    .await;

    assert_eq!(job.status, GenerationStatus::Failed);
    assert_eq!(job.error.as_deref(), Some("1 of 3 scenes failed"));

    for i in [0, 2] {
        assert_eq!(job.scenes[i].visual_status, AssetStatus::Done);
        assert_eq!(job.scenes[i].voiceover_status, AssetStatus::Done);
        assert!(job.scenes[i].error.is_none());
    }

    let failed = &job.scenes[1];
    assert_eq!(failed.visual_status, AssetStatus::Done);
    assert!(failed.photo_url.is_some());
    assert_eq!(failed.voiceover_status, AssetStatus::Failed);
    assert!(failed.voiceover_url.is_none());
    assert_eq!(
        failed.error.as_deref(),
        Some("Voiceover: Request failed: voice quota exceeded")
    );
}

#[tokio::test]
async fn test_both_subtasks_failing_count_once() {
    let h = harness();
    let job = run(
        &h,
        request(vec![
            scene(1, VisualType::AiVideo, "FAIL", "EMPTY result"),
            scene(2, VisualType::AiPhoto, "Okay", "Fine prompt"),
        ]),
    )
    .await;

    assert_eq!(job.error.as_deref(), Some("1 of 2 scenes failed"));

    let failed = &job.scenes[0];
    assert_eq!(failed.visual_status, AssetStatus::Failed);
    assert_eq!(failed.voiceover_status, AssetStatus::Failed);
    let error = failed.error.as_deref().unwrap();
    assert!(error.contains("Visual: Provider returned no result URL"));
    assert!(error.contains("Voiceover: Request failed"));
    assert!(error.contains("; "));
}

#[tokio::test]
async fn test_motion_graphics_skip_provider() {
    let h = harness();
    let job = run(
        &h,
        request(vec![scene(1, VisualType::MotionGraphics, "Tara!", "unused")]),
    )
    .await;

    assert_eq!(job.status, GenerationStatus::Completed);
    let config = job.scenes[0].motion_config.as_ref().unwrap();
    assert_eq!(config.text, "SCENE 1");
    assert_eq!(config.style, "branded");
    assert_eq!(config.duration, 10.0);
    // Only the voiceover hits the provider.
    assert_eq!(h.generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_start_runs_in_background() {
    let h = harness();
    let job = h.pipeline.start(request(vec![
        scene(1, VisualType::AiPhoto, "Isa", "One"),
        scene(2, VisualType::AiPhoto, "Dalawa", "Two"),
    ]));

    assert_eq!(job.status, GenerationStatus::Queued);
    assert!(job
        .scenes
        .iter()
        .all(|s| s.visual_status == AssetStatus::Pending));

    let mut current = h.registry.get(&job.id).unwrap();
    for _ in 0..200 {
        if current.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        current = h.registry.get(&job.id).unwrap();
    }

    assert_eq!(current.status, GenerationStatus::Completed);
    assert!(current.scenes.iter().all(|s| s.is_settled()));
}

#[tokio::test]
async fn test_scenes_run_in_order_with_concurrent_subtasks() {
    let generator = Arc::new(RecordingGenerator::new());
    let (pipeline, registry) = pipeline(generator.clone(), Arc::new(FakeStore::default()));

    let request = request(vec![
        scene(1, VisualType::AiPhoto, "s1 FAIL", "s1 rice bowl"),
        scene(2, VisualType::AiPhoto, "s2 okay", "s2 bento"),
        scene(3, VisualType::AiPhoto, "s3 okay", "s3 dessert"),
    ]);
    let job = registry.create(AssetGenerationJob::new(&request));

    // Sub-tasks awaited one after the other would never pass the barrier.
    tokio::time::timeout(Duration::from_secs(5), pipeline.run(&job.id, &request))
        .await
        .expect("scene sub-tasks did not run concurrently");

    let events = generator.events.lock().unwrap().len();
    assert_eq!(events, 12);

    for tag in ["s1", "s2", "s3"] {
        let starts = [
            generator.position(tag, "start", "visual"),
            generator.position(tag, "start", "voiceover"),
        ];
        let ends = [
            generator.position(tag, "end", "visual"),
            generator.position(tag, "end", "voiceover"),
        ];
        assert!(starts.iter().max() < ends.iter().min(), "{} overlaps", tag);
    }

    // The failed voiceover does not release the next scene before the photo ends.
    for (previous, next) in [("s1", "s2"), ("s2", "s3")] {
        let finished = generator
            .position(previous, "end", "visual")
            .max(generator.position(previous, "end", "voiceover"));
        let started = generator
            .position(next, "start", "visual")
            .min(generator.position(next, "start", "voiceover"));
        assert!(finished < started, "{} started before {} finished", next, previous);
    }

    let job = registry.get(&job.id).unwrap();
    assert_eq!(job.error.as_deref(), Some("1 of 3 scenes failed"));
    assert_eq!(job.scenes[0].visual_status, AssetStatus::Done);
    assert_eq!(job.scenes[0].voiceover_status, AssetStatus::Failed);
}

#[tokio::test]
async fn test_persist_failure_fails_only_that_subtask() {
    let h = harness_with_store(FakeStore::failing_on("scene2-voiceover.mp3"));
    let job = run(
        &h,
        request(vec![
            scene(1, VisualType::AiPhoto, "Una", "Breakfast tray"),
            scene(2, VisualType::AiPhoto, "Pangalawa", "Lunch tray"),
            scene(3, VisualType::AiPhoto, "Pangatlo", "Dinner tray"),
        ]),
    )
    .await;

    assert_eq!(job.status, GenerationStatus::Failed);
    assert_eq!(job.error.as_deref(), Some("1 of 3 scenes failed"));

    let failed = &job.scenes[1];
    assert_eq!(failed.visual_status, AssetStatus::Done);
    assert!(failed.photo_url.is_some());
    assert_eq!(failed.voiceover_status, AssetStatus::Failed);
    assert!(failed.voiceover_url.is_none());
    assert_eq!(failed.error.as_deref(), Some("Voiceover: Upload failed: disk full"));

    for i in [0, 2] {
        assert_eq!(job.scenes[i].visual_status, AssetStatus::Done);
        assert_eq!(job.scenes[i].voiceover_status, AssetStatus::Done);
    }
    assert_eq!(h.store.persisted.lock().unwrap().len(), 5);
}
