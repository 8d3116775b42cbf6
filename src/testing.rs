//! Test doubles shared by the unit tests.

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{ImageFormat, Rgba, RgbaImage};
use tokio::sync::Notify;

use crate::backend::GenerationBackend;
use crate::envelope::{ImageResult, ProcessingResult};
use crate::error::PipelineError;
use crate::progress::ProgressSink;

/// Encodes a solid teal PNG.
pub(crate) fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([0, 128, 128, 255]));
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .expect("encode fixture");
    png
}

/// Backend with canned answers that records every call.
pub(crate) struct StubBackend {
    calls: Mutex<Vec<String>>,
    process_error: Option<PipelineError>,
    image_bytes: Vec<u8>,
    fetch_gate: Option<Arc<Notify>>,
}

impl StubBackend {
    pub(crate) fn succeeding(width: u32, height: u32) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            process_error: None,
            image_bytes: png_fixture(width, height),
            fetch_gate: None,
        }
    }

    pub(crate) fn with_process_error(mut self, err: PipelineError) -> Self {
        self.process_error = Some(err);
        self
    }

    pub(crate) fn with_image_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.image_bytes = bytes;
        self
    }

    /// Holds every image fetch until `gate` is notified.
    pub(crate) fn with_fetch_gate(mut self, gate: Arc<Notify>) -> Self {
        self.fetch_gate = Some(gate);
        self
    }

    pub(crate) fn processing_result() -> ProcessingResult {
        ProcessingResult {
            prompt_text: "a pixel art crab".to_string(),
            profile_url: "https://github.com/octocat".to_string(),
            repository_count: 12,
            language_tags: vec![
                "Rust".to_string(),
                "Go".to_string(),
                "Python".to_string(),
                "C".to_string(),
            ],
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

#[async_trait]
impl GenerationBackend for StubBackend {
    async fn process(&self, handle: &str) -> Result<ProcessingResult, PipelineError> {
        self.record(format!("process:{handle}"));
        match &self.process_error {
            Some(err) => Err(err.clone()),
            None => Ok(Self::processing_result()),
        }
    }

    async fn generate_image(&self, prompt: &str) -> Result<ImageResult, PipelineError> {
        self.record(format!("generate:{prompt}"));
        Ok(ImageResult {
            image_url: "static/temp/generated.png".to_string(),
        })
    }

    async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>, PipelineError> {
        self.record(format!("fetch:{image_url}"));
        if let Some(gate) = &self.fetch_gate {
            gate.notified().await;
        }
        Ok(self.image_bytes.clone())
    }
}

/// A progress event seen by [`RecordingSink`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Recorded {
    Update(String, f32),
    Reset,
}

/// Progress sink that keeps everything it is told.
#[derive(Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<Recorded>>,
}

impl RecordingSink {
    pub(crate) fn events(&self) -> Vec<Recorded> {
        self.events.lock().expect("events lock").clone()
    }
}

#[async_trait]
impl ProgressSink for RecordingSink {
    async fn update(&self, status: &str, fraction: f32) {
        self.events
            .lock()
            .expect("events lock")
            .push(Recorded::Update(status.to_owned(), fraction));
    }

    async fn reset(&self) {
        self.events.lock().expect("events lock").push(Recorded::Reset);
    }
}
