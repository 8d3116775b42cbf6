//! Web UI: a form for the handle, the generated image and its panel.

use std::num::NonZeroU16;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Form, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE, LAST_MODIFIED};
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum::Router;
use httpdate::fmt_http_date;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::constants::{DOWNLOAD_CONTENT_DISPOSITION, PROGRESS_REFRESH_SECONDS};
use crate::error::CodebeastError;
use crate::pipeline::{Display, Outcome, Pipeline};
use crate::progress::{ProgressBoard, ProgressSnapshot};

mod views;

use views::{GenerateForm, HomeTemplate};

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    pipeline: Arc<Pipeline>,
    display: Arc<RwLock<Display>>,
    progress: ProgressBoard,
}

impl AppState {
    fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            display: Arc::new(RwLock::new(Display::new())),
            progress: ProgressBoard::new(),
        }
    }
}

async fn root_handler(State(state): State<AppState>) -> HomeTemplate {
    let progress = state.progress.snapshot().await;
    let artifact = state.display.read().await.artifact().cloned();
    HomeTemplate {
        progress,
        artifact,
        refresh_seconds: PROGRESS_REFRESH_SECONDS,
    }
}

/// Starts a run for the submitted handle and sends the browser straight back
/// home, where the page follows the run's progress.
async fn generate_handler(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> Redirect {
    // the run owns its state so it finishes even if the browser gives up
    tokio::spawn(async move {
        let outcome = state
            .pipeline
            .run(&form.message, &state.progress, &state.display)
            .await;
        match outcome {
            Ok(Outcome::Skipped) => debug!("Empty submission, nothing to do"),
            Ok(Outcome::Superseded) => debug!("Run was superseded by a newer submission"),
            Ok(Outcome::Rendered(artifact)) => {
                debug!("Rendered artifact for {:?}", artifact.submission)
            }
            // already logged by the pipeline, the progress board has been reset
            Err(_) => {}
        }
    });
    Redirect::to("/")
}

async fn progress_handler(State(state): State<AppState>) -> Json<ProgressSnapshot> {
    Json(state.progress.snapshot().await)
}

async fn download_handler(State(state): State<AppState>) -> Result<Response, CodebeastError> {
    let Some(artifact) = state.display.read().await.artifact().cloned() else {
        return Err(CodebeastError::NotFound("/download".to_string()));
    };

    Response::builder()
        .header(CONTENT_TYPE, "image/png")
        .header(CONTENT_DISPOSITION, DOWNLOAD_CONTENT_DISPOSITION.as_str())
        .header(CACHE_CONTROL, "no-store")
        .header(LAST_MODIFIED, fmt_http_date(artifact.created_at))
        .body(Body::from(artifact.png.clone()))
        .map_err(CodebeastError::from)
}

async fn styles_handler() -> impl IntoResponse {
    const STYLES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/styles.css"));
    ([(CONTENT_TYPE, "text/css")], STYLES)
}

fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::get(root_handler))
        .route("/generate", axum::routing::post(generate_handler))
        .route("/progress", axum::routing::get(progress_handler))
        .route("/download", axum::routing::get(download_handler))
        .route("/static/styles.css", axum::routing::get(styles_handler))
}

/// Serves the UI until the listener fails.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    pipeline: Pipeline,
) -> Result<(), anyhow::Error> {
    let app = create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(pipeline));

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app).await {
        error!("Server error: {}", err);
    }
    Ok(())
}
