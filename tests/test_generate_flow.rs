//! End-to-end runs against an in-process fake backend.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::{Json, Query, State};
use axum::http::{StatusCode, header::CONTENT_TYPE};
use axum::response::IntoResponse;
use codebeast::backend::{GenerationBackend, HttpBackend};
use codebeast::compositor::Compositor;
use codebeast::error::PipelineError;
use codebeast::pipeline::{Display, Outcome, Pipeline, PipelineConfig};
use codebeast::progress::{ProgressBoard, ProgressSnapshot};
use image::{ImageFormat, Rgba, RgbaImage};
use serde_json::{Value, json};
use tokio::sync::RwLock;
use url::Url;

#[derive(Clone, Default)]
struct FakeBackend {
    process_calls: Arc<AtomicUsize>,
    image_calls: Arc<AtomicUsize>,
    fetch_calls: Arc<AtomicUsize>,
    process_reply: Arc<std::sync::Mutex<Option<(StatusCode, Value)>>>,
    serve_garbage: bool,
}

impl FakeBackend {
    fn replying_to_process(self, status: StatusCode, body: Value) -> Self {
        *self.process_reply.lock().unwrap() = Some((status, body));
        self
    }
}

async fn process(State(fake): State<FakeBackend>, Json(body): Json<Value>) -> impl IntoResponse {
    fake.process_calls.fetch_add(1, Ordering::SeqCst);
    let canned = fake.process_reply.lock().unwrap().clone();
    if let Some((status, reply)) = canned {
        return (status, Json(reply));
    }
    let handle = body["message"].as_str().unwrap_or_default().to_string();
    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "response": format!("a pixel art beast for {handle}"),
            "github_url": format!("https://github.com/{handle}"),
            "num_repositories": 7,
            "languages": ["Rust", "Go", "Python", "C", "Zig", "Lua", "Nix"],
        })),
    )
}

async fn generate_image(
    State(fake): State<FakeBackend>,
    Json(body): Json<Value>,
) -> Json<Value> {
    fake.image_calls.fetch_add(1, Ordering::SeqCst);
    assert!(body["prompt"].as_str().unwrap().starts_with("a pixel art beast"));
    Json(json!({"status": "success", "image_url": "static/temp/generated.png"}))
}

async fn generated_png(
    State(fake): State<FakeBackend>,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> impl IntoResponse {
    fake.fetch_calls.fetch_add(1, Ordering::SeqCst);
    assert!(params.contains_key("t"), "image fetch should be cache-busted");
    if fake.serve_garbage {
        return ([(CONTENT_TYPE, "image/png")], b"definitely not a png".to_vec());
    }
    let image = RgbaImage::from_pixel(512, 384, Rgba([40, 90, 160, 255]));
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    ([(CONTENT_TYPE, "image/png")], png)
}

async fn spawn_backend(fake: FakeBackend) -> Url {
    let app = Router::new()
        .route("/chat/process", axum::routing::post(process))
        .route("/chat/generate-image", axum::routing::post(generate_image))
        .route("/static/temp/generated.png", axum::routing::get(generated_png))
        .with_state(fake);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/")).unwrap()
}

fn http_backend(base_url: Url) -> HttpBackend {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    HttpBackend::with_client(client, base_url)
}

fn pipeline(base_url: Url) -> Pipeline {
    Pipeline::new(
        Arc::new(http_backend(base_url)),
        Compositor::bundled().unwrap(),
        PipelineConfig {
            pacing: Duration::ZERO,
        },
    )
}

#[tokio::test]
async fn generates_and_saves_png() {
    let fake = FakeBackend::default();
    let base_url = spawn_backend(fake.clone()).await;
    let board = ProgressBoard::new();
    let display = RwLock::new(Display::new());

    let outcome = pipeline(base_url.clone())
        .run("octocat", &board, &display)
        .await
        .expect("run succeeds");
    let Outcome::Rendered(artifact) = outcome else {
        panic!("expected a rendered artifact");
    };

    assert_eq!(artifact.caption, "Generated for octocat");
    assert_eq!(artifact.panel.repo_label, "7 repos");
    assert_eq!(artifact.panel.profile.label, "@octocat");
    let sizes: Vec<usize> = artifact.panel.language_rows.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![3, 3, 1]);
    let expected_link = format!("{base_url}static/temp/generated.png");
    let encoded: String = url::form_urlencoded::byte_serialize(expected_link.as_bytes()).collect();
    assert!(artifact.panel.share.url.ends_with(&format!("url={encoded}")));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("codebeast.png");
    std::fs::write(&path, &artifact.png).unwrap();
    let saved = image::open(&path).unwrap();
    assert_eq!((saved.width(), saved.height()), (512, 384));

    let snapshot = board.snapshot().await;
    assert_eq!(snapshot.fraction, 1.0);
    assert!(!snapshot.active);
    assert_eq!(fake.process_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fake.image_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fake.fetch_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn processing_http_error_skips_image_endpoint() {
    let fake = FakeBackend::default()
        .replying_to_process(StatusCode::INTERNAL_SERVER_ERROR, json!({"status": "error"}));
    let base_url = spawn_backend(fake.clone()).await;
    let board = ProgressBoard::new();
    let display = RwLock::new(Display::new());

    let result = pipeline(base_url).run("octocat", &board, &display).await;

    assert!(matches!(result, Err(PipelineError::NetworkFailure(_))));
    assert_eq!(fake.process_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fake.image_calls.load(Ordering::SeqCst), 0);
    assert_eq!(board.snapshot().await, ProgressSnapshot::default());
}

#[tokio::test]
async fn processing_failure_envelope_skips_image_endpoint() {
    let fake = FakeBackend::default().replying_to_process(
        StatusCode::OK,
        json!({"status": "error", "error": "Langflow timed out"}),
    );
    let base_url = spawn_backend(fake.clone()).await;
    let display = RwLock::new(Display::new());

    let result = pipeline(base_url)
        .run("octocat", &ProgressBoard::new(), &display)
        .await;

    assert_eq!(
        result.err(),
        Some(PipelineError::ApplicationFailure("Langflow timed out".to_string()))
    );
    assert_eq!(fake.image_calls.load(Ordering::SeqCst), 0);
    assert!(display.read().await.artifact().is_none());
}

#[tokio::test]
async fn undecodable_image_leaves_display_empty() {
    let fake = FakeBackend {
        serve_garbage: true,
        ..FakeBackend::default()
    };
    let base_url = spawn_backend(fake.clone()).await;
    let board = ProgressBoard::new();
    let display = RwLock::new(Display::new());

    let result = pipeline(base_url).run("octocat", &board, &display).await;

    assert!(matches!(result, Err(PipelineError::ImageLoadFailure(_))));
    assert_eq!(fake.fetch_calls.load(Ordering::SeqCst), 1);
    assert_eq!(board.snapshot().await, ProgressSnapshot::default());
    assert!(display.read().await.artifact().is_none());
}

#[tokio::test]
async fn unreachable_backend_is_a_network_failure() {
    let backend = http_backend(Url::parse("http://127.0.0.1:9/").unwrap());
    let result = backend.process("octocat").await;
    assert!(matches!(result, Err(PipelineError::NetworkFailure(_))));
}
