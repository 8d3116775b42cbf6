//! The generation pipeline: handle in, captioned image and panel out.
//!
//! A run goes: processing endpoint, pacing pause, image endpoint, image
//! fetch and decode, composite, then install the artifact on the
//! [`Display`]. Each step waits for the previous one. Any failure stops the
//! run and resets the progress indicator.
//!
//! Every run takes a [`RunToken`] from the display when it starts. A newer
//! submission bumps the token, after which the older run can no longer touch
//! the progress indicator or the display.

use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use image::ImageFormat;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::backend::GenerationBackend;
use crate::compositor::{Compositor, caption_for};
use crate::constants::PACING_DELAY;
use crate::envelope::ProcessingResult;
use crate::error::PipelineError;
use crate::panel::{Panel, build_panel};
use crate::progress::{ProgressSink, Stage};

/// Tunables for a pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Pause between receiving the prompt and requesting the image
    pub pacing: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pacing: PACING_DELAY,
        }
    }
}

/// Identifies one run; only the newest token may change the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RunToken(u64);

/// A finished, captioned image and its panel.
#[derive(Clone, Debug)]
pub struct Artifact {
    /// The handle this was generated for
    pub submission: String,
    /// Caption drawn on the image
    pub caption: String,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
    /// The composite, PNG encoded
    pub png: Vec<u8>,
    /// Info and actions shown alongside
    pub panel: Panel,
    /// When the artifact was rendered
    pub created_at: SystemTime,
}

/// What the user currently sees. At most one artifact is visible.
#[derive(Debug, Default)]
pub struct Display {
    token: u64,
    artifact: Option<Arc<Artifact>>,
}

impl Display {
    /// An empty display.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a run: supersedes any run in flight and clears the artifact.
    pub fn begin_run(&mut self) -> RunToken {
        self.token += 1;
        self.artifact = None;
        RunToken(self.token)
    }

    /// Whether `token` belongs to the newest run.
    pub fn is_current(&self, token: RunToken) -> bool {
        token.0 == self.token
    }

    /// Replaces the visible artifact, unless the run has been superseded.
    pub fn apply(&mut self, token: RunToken, artifact: Arc<Artifact>) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.artifact = Some(artifact);
        true
    }

    /// The visible artifact, if any.
    pub fn artifact(&self) -> Option<&Arc<Artifact>> {
        self.artifact.as_ref()
    }
}

/// How a run ended when nothing went wrong.
#[derive(Clone, Debug)]
pub enum Outcome {
    /// The submission was empty; nothing happened
    Skipped,
    /// The artifact is now on display
    Rendered(Arc<Artifact>),
    /// A newer submission started while this one was running; its result was dropped
    Superseded,
}

/// Runs submissions against a backend.
pub struct Pipeline {
    backend: Arc<dyn GenerationBackend>,
    compositor: Compositor,
    config: PipelineConfig,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("compositor", &self.compositor)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Creates a pipeline.
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        compositor: Compositor,
        config: PipelineConfig,
    ) -> Self {
        Self {
            backend,
            compositor,
            config,
        }
    }

    /// Runs one submission to completion.
    ///
    /// An empty submission returns [`Outcome::Skipped`] without calling the
    /// backend, touching `display` or reporting progress. Anything else is
    /// passed through exactly as submitted.
    pub async fn run(
        &self,
        submission: &str,
        sink: &dyn ProgressSink,
        display: &RwLock<Display>,
    ) -> Result<Outcome, PipelineError> {
        if submission.is_empty() {
            debug!("Ignoring empty submission");
            return Ok(Outcome::Skipped);
        }

        let token = display.write().await.begin_run();
        info!("Starting generation for {submission:?}");

        match self.execute(submission, token, sink, display).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                error!("Generation for {submission:?} failed: {err}");
                if display.read().await.is_current(token) {
                    sink.reset().await;
                }
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        handle: &str,
        token: RunToken,
        sink: &dyn ProgressSink,
        display: &RwLock<Display>,
    ) -> Result<Outcome, PipelineError> {
        report(sink, display, token, Stage::Collecting, handle).await;
        let processed = self.backend.process(handle).await?;
        debug!(
            "Received prompt for {handle}: {} repos, languages {:?}",
            processed.repository_count, processed.language_tags
        );

        report(sink, display, token, Stage::Received, handle).await;
        tokio::time::sleep(self.config.pacing).await;

        report(sink, display, token, Stage::RequestingImage, handle).await;
        let generated = self.backend.generate_image(&processed.prompt_text).await?;

        report(sink, display, token, Stage::LoadingImage, handle).await;
        let bytes = self.backend.fetch_image(&generated.image_url).await?;
        let image_link = self.backend.public_image_link(&generated.image_url);
        let artifact = Arc::new(self.render(handle, &processed, &bytes, &image_link)?);

        if !display.write().await.apply(token, artifact.clone()) {
            info!("Discarding result for {handle}, a newer submission is running");
            return Ok(Outcome::Superseded);
        }
        report(sink, display, token, Stage::Complete, handle).await;
        info!("Generation for {handle} complete");
        Ok(Outcome::Rendered(artifact))
    }

    /// Decodes the fetched image, captions it and builds the panel.
    fn render(
        &self,
        handle: &str,
        processed: &ProcessingResult,
        bytes: &[u8],
        image_link: &str,
    ) -> Result<Artifact, PipelineError> {
        let bitmap = image::load_from_memory(bytes)?;
        let caption = caption_for(handle);
        let surface = self.compositor.composite(&bitmap, &caption);

        let mut png = Vec::new();
        surface.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        let panel = build_panel(processed, &png, handle, image_link);
        Ok(Artifact {
            submission: handle.to_owned(),
            caption,
            width: surface.width(),
            height: surface.height(),
            png,
            panel,
            created_at: SystemTime::now(),
        })
    }
}

/// Reports `stage`, unless the run has been superseded.
async fn report(
    sink: &dyn ProgressSink,
    display: &RwLock<Display>,
    token: RunToken,
    stage: Stage,
    handle: &str,
) {
    if !display.read().await.is_current(token) {
        return;
    }
    sink.update(&stage.message(handle), stage.fraction()).await;
}
