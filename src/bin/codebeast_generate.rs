//! Generate a single CodeBeast from the command line.
//!
//!   codebeast_generate octocat --output octocat.png

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use codebeast::backend::HttpBackend;
use codebeast::compositor::Compositor;
use codebeast::config::setup_logging;
use codebeast::constants::{DEFAULT_PACING_MS, DOWNLOAD_FILENAME};
use codebeast::pipeline::{Display, Outcome, Pipeline, PipelineConfig};
use codebeast::progress::LogProgress;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "codebeast_generate")]
#[command(about = "Generate a captioned CodeBeast for a GitHub handle")]
struct Args {
    /// GitHub handle to generate for
    handle: String,

    /// Base URL of the processing/image backend
    #[arg(long, default_value = "http://localhost:5000/", env = "CODEBEAST_BACKEND_URL")]
    backend_url: Url,

    /// Where to write the PNG
    #[arg(long, short, default_value = DOWNLOAD_FILENAME)]
    output: PathBuf,

    /// Pause between receiving the prompt and requesting the image, in milliseconds
    #[arg(long, default_value_t = DEFAULT_PACING_MS, env = "CODEBEAST_PACING_MS")]
    pacing_ms: u64,

    /// Enable debug logging
    #[arg(long, env = "CODEBEAST_DEBUG")]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.debug).map_err(|err| anyhow!("Failed to set up logging: {err}"))?;

    let compositor = Compositor::bundled().context("Failed to load caption font")?;
    let pipeline = Pipeline::new(
        Arc::new(HttpBackend::new(args.backend_url)),
        compositor,
        PipelineConfig {
            pacing: Duration::from_millis(args.pacing_ms),
        },
    );
    let display = RwLock::new(Display::new());

    let outcome = pipeline
        .run(&args.handle, &LogProgress, &display)
        .await
        .with_context(|| format!("Generation for {} failed", args.handle))?;

    let artifact = match outcome {
        Outcome::Rendered(artifact) => artifact,
        Outcome::Skipped => return Err(anyhow!("Handle is empty, nothing to generate")),
        Outcome::Superseded => return Err(anyhow!("Run was superseded")),
    };

    fs::write(&args.output, &artifact.png)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    let panel = &artifact.panel;
    eprintln!("Saved: {}", args.output.display());
    eprintln!("{} ({}) - {}", panel.profile.label, panel.profile.url, panel.repo_label);
    for row in &panel.language_rows {
        let names: Vec<&str> = row.iter().map(|tag| tag.name.as_str()).collect();
        eprintln!("  {}", names.join(" | "));
    }
    eprintln!("Share: {}", panel.share.url);
    Ok(())
}
