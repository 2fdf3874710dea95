//! API integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use reel_api::{create_router, ApiConfig, AppState, Collaborators};
use reel_provider::{
    ChatCompletion, MediaGenerator, PhotoInput, ProviderResult, VideoInput, VoiceoverInput,
};
use reel_render::{BundleHandle, Compositor, ProgressFn, RenderResult};
use reel_storage::{AssetStore, StorageResult, StoredAsset};
use reel_worker::WorkerConfig;

struct FakeGenerator;

#[async_trait]
impl MediaGenerator for FakeGenerator {
    async fn generate_video(&self, _input: &VideoInput) -> ProviderResult<Vec<String>> {
        Ok(vec!["https://provider.example.com/v.mp4".to_string()])
    }

    async fn generate_photo(&self, _input: &PhotoInput) -> ProviderResult<Vec<String>> {
        Ok(vec!["https://provider.example.com/p.jpg".to_string()])
    }

    async fn generate_voiceover(&self, _input: &VoiceoverInput) -> ProviderResult<Vec<String>> {
        Ok(vec!["https://provider.example.com/a.mp3".to_string()])
    }
}

struct FakeStore;

#[async_trait]
impl AssetStore for FakeStore {
    async fn persist(&self, _source_url: &str, filename: &str) -> StorageResult<StoredAsset> {
        Ok(StoredAsset {
            local_ref: filename.to_string(),
            public_url: format!("http://localhost:3000/assets/{}", filename),
        })
    }
}

struct FakeChat;

#[async_trait]
impl ChatCompletion for FakeChat {
    async fn complete_json(&self, _system: &str, _user: &str) -> ProviderResult<String> {
        let scenes: Vec<Value> = (1..=4)
            .map(|n| {
                json!({
                    "scene_number": n,
                    "duration_seconds": 15,
                    "visual_description": "Meal box reveal",
                    "visual_type": "ai-photo",
                    "narration_text": "Sarap!",
                    "onscreen_text": "YUM",
                    "ai_prompt": "Kraft meal box on a wooden table"
                })
            })
            .collect();
        Ok(json!({ "scenes": scenes }).to_string())
    }
}

/// Writes a placeholder video so `/output` can serve it.
struct FakeCompositor;

#[async_trait]
impl Compositor for FakeCompositor {
    async fn bundle(&self) -> RenderResult<BundleHandle> {
        Ok(BundleHandle::new("/tmp/bundle"))
    }

    async fn render(
        &self,
        _bundle: &BundleHandle,
        _composition_id: &str,
        _props: &Value,
        output: &Path,
        on_progress: ProgressFn,
    ) -> RenderResult<PathBuf> {
        on_progress(0.5);
        tokio::fs::write(output, b"fake mp4").await?;
        on_progress(1.0);
        Ok(output.to_path_buf())
    }
}

struct TestApp {
    router: Router,
    _dir: TempDir,
    assets_dir: PathBuf,
}

fn create_test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("output");
    let assets_dir = dir.path().join("assets");
    std::fs::create_dir_all(&output_dir).unwrap();
    std::fs::create_dir_all(&assets_dir).unwrap();

    let worker = WorkerConfig {
        output_dir,
        assets_dir: assets_dir.clone(),
        ..Default::default()
    };

    let state = AppState::from_parts(
        ApiConfig::default(),
        worker,
        Collaborators {
            generator: Arc::new(FakeGenerator),
            store: Arc::new(FakeStore),
            chat: Arc::new(FakeChat),
            compositor: Arc::new(FakeCompositor),
        },
    );

    TestApp {
        router: create_router(state, None),
        _dir: dir,
        assets_dir,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Poll a status URL until the job leaves its in-progress states.
async fn wait_for_terminal(app: &Router, uri: &str) -> Value {
    let mut body = Value::Null;
    for _ in 0..200 {
        let (status, current) = send(app, get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        body = current;
        if body["status"] == "completed" || body["status"] == "failed" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    body
}

fn render_body() -> Value {
    json!({
        "storyboard_id": "SB-T-1",
        "topic_id": "T-1",
        "scenes": [
            {
                "scene_number": 1,
                "duration_seconds": 30,
                "visual_type": "ai-photo",
                "visual_description": "Meal box",
                "narration_text": "Tara, kain!",
                "assets": {
                    "photo_url": "https://cdn.example.com/p.jpg",
                    "voiceover_url": "https://cdn.example.com/v.mp3"
                }
            },
            {
                "scene_number": 2,
                "duration_seconds": 30,
                "visual_type": "motion-graphics",
                "visual_description": "Call to action",
                "narration_text": "Order na!",
                "onscreen_text": "ORDER NOW",
                "assets": {
                    "voiceover_url": "https://cdn.example.com/v2.mp3",
                    "motion_config": { "text": "ORDER NOW" }
                }
            }
        ],
        "branding": {
            "logo_url": "https://cdn.example.com/logo.png",
            "primary_color": "#FF6B00",
            "secondary_color": "#1A1A1A",
            "font_family": "Inter"
        }
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let (status, body) = send(&app.router, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["uptime"].is_number());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_render_submit_and_complete() {
    let app = create_test_app();

    let (status, body) = send(&app.router, post("/render", render_body())).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "queued");
    assert_eq!(body["sceneCount"], 2);
    assert_eq!(body["totalDurationSeconds"], 60.0);

    let job_id = body["jobId"].as_str().unwrap().to_string();
    assert_eq!(body["statusUrl"], format!("/render/{}", job_id));

    let job = wait_for_terminal(&app.router, &format!("/render/{}", job_id)).await;
    assert_eq!(job["status"], "completed");
    assert_eq!(job["progress"], 100);
    assert_eq!(
        job["downloadUrl"],
        format!("http://localhost:3000/output/{}.mp4", job_id)
    );

    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/output/{}.mp4", job_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_render_validation_errors() {
    let app = create_test_app();

    let mut body = render_body();
    body["scenes"] = json!([]);
    let (status, response) = send(&app.router, post("/render", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["detail"], "Invalid request");
    assert!(response["details"].is_object());

    let mut body = render_body();
    body["branding"]["primary_color"] = json!("orange");
    let (status, _) = send(&app.router, post("/render", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = render_body();
    body["scenes"][0]["visual_type"] = json!("hologram");
    let (status, _) = send(&app.router, post("/render", body)).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_unknown_jobs_are_not_found() {
    let app = create_test_app();

    for uri in [
        "/render/missing",
        "/assets/generate/missing",
        "/storyboard/generate/missing",
    ] {
        let (status, body) = send(&app.router, get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["detail"], "Job not found");
    }
}

#[tokio::test]
async fn test_asset_generation_flow() {
    let app = create_test_app();

    let request = json!({
        "storyboardId": "SB-T-1",
        "scenes": [
            {
                "scene_number": 1,
                "duration_seconds": 10,
                "visual_type": "ai-photo",
                "visual_description": "Packed lunch",
                "narration_text": "Baon time!",
                "ai_prompt": "Packed lunch in a kraft box"
            },
            {
                "scene_number": 2,
                "duration_seconds": 5,
                "visual_type": "motion-graphics",
                "visual_description": "Logo",
                "narration_text": "Katbox!",
                "onscreen_text": "KATBOX",
                "ai_prompt": "logo"
            }
        ]
    });

    let (status, body) = send(&app.router, post("/assets/generate", request)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["message"], "Asset generation started");
    assert_eq!(body["storyboardId"], "SB-T-1");
    assert_eq!(body["sceneCount"], 2);

    let status_url = body["statusUrl"].as_str().unwrap().to_string();
    assert!(status_url.starts_with("/assets/generate/"));

    let job = wait_for_terminal(&app.router, &status_url).await;
    assert_eq!(job["status"], "completed");
    assert_eq!(job["scenes"][0]["visualStatus"], "done");
    assert_eq!(job["scenes"][1]["motionConfig"]["text"], "KATBOX");
}

#[tokio::test]
async fn test_storyboard_generation_flow() {
    let app = create_test_app();

    let request = json!({
        "topicId": "T-42",
        "topicTitle": "Merienda hacks",
        "topicSummary": "Quick afternoon snacks",
        "contentPillar": "Food"
    });

    let (status, body) = send(&app.router, post("/storyboard/generate", request)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["topicId"], "T-42");

    let job = wait_for_terminal(&app.router, body["statusUrl"].as_str().unwrap()).await;
    assert_eq!(job["status"], "completed");
    assert_eq!(job["storyboardId"], "SB-T-42");

    let total: u64 = job["scenes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["duration_seconds"].as_u64().unwrap())
        .sum();
    assert_eq!(total, 60);

    let (status, _) = send(
        &app.router,
        post("/storyboard/generate", json!({ "topicId": "" })),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_serves_persisted_assets() {
    let app = create_test_app();
    std::fs::write(app.assets_dir.join("job-scene1-photo.jpg"), b"jpeg").unwrap();

    let response = app
        .router
        .clone()
        .oneshot(get("/assets/job-scene1-photo.jpg"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .clone()
        .oneshot(get("/assets/missing.jpg"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("X-Request-ID", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["X-Request-ID"], "req-123");
}
