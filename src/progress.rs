//! Progress reporting for generation runs.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

/// The checkpoints a run reports as it goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Profile data is being collected
    Collecting,
    /// The prompt came back from the processing endpoint
    Received,
    /// The image generator has been asked for a picture
    RequestingImage,
    /// The generated image is being downloaded and decoded
    LoadingImage,
    /// The artifact is on display
    Complete,
}

impl Stage {
    /// How far along the run is at this stage.
    pub fn fraction(self) -> f32 {
        match self {
            Stage::Collecting => 0.1,
            Stage::Received => 0.4,
            Stage::RequestingImage => 0.6,
            Stage::LoadingImage => 0.8,
            Stage::Complete => 1.0,
        }
    }

    /// Status line shown to the user.
    pub fn message(self, handle: &str) -> String {
        match self {
            Stage::Collecting => format!("Collecting data from GitHub for handle {handle}..."),
            Stage::Received => "Received AI response...".to_string(),
            Stage::RequestingImage => "Sending request to the image generator...".to_string(),
            Stage::LoadingImage => "Loading generated image...".to_string(),
            Stage::Complete => "CodeBeast generation complete!".to_string(),
        }
    }
}

/// Something that shows progress to a user.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Shows `status` with the run `fraction` complete.
    async fn update(&self, status: &str, fraction: f32);

    /// Stops the indicator and hides the status.
    async fn reset(&self);
}

/// What the progress indicator currently shows.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    /// Status line
    pub status: String,
    /// Completed fraction, 0.0 to 1.0
    pub fraction: f32,
    /// Whether a run is still in flight
    pub active: bool,
}

impl ProgressSnapshot {
    /// Completed fraction as a whole percentage, for the progress bar.
    pub fn percent(&self) -> u32 {
        (self.fraction.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}

/// Shared progress display, read by the web UI.
#[derive(Clone, Debug, Default)]
pub struct ProgressBoard {
    inner: Arc<RwLock<ProgressSnapshot>>,
}

impl ProgressBoard {
    /// An idle board.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state of the board.
    pub async fn snapshot(&self) -> ProgressSnapshot {
        self.inner.read().await.clone()
    }
}

#[async_trait]
impl ProgressSink for ProgressBoard {
    async fn update(&self, status: &str, fraction: f32) {
        let mut board = self.inner.write().await;
        board.status = status.to_owned();
        board.fraction = fraction;
        board.active = fraction < 1.0;
    }

    async fn reset(&self) {
        *self.inner.write().await = ProgressSnapshot::default();
    }
}

/// Writes progress to the log, for the command line.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogProgress;

#[async_trait]
impl ProgressSink for LogProgress {
    async fn update(&self, status: &str, fraction: f32) {
        info!("[{:>3}%] {status}", (fraction * 100.0).round() as u32);
    }

    async fn reset(&self) {
        info!("Generation stopped");
    }
}
