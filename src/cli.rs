//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;
use std::time::Duration;
use url::Url;

use crate::constants::DEFAULT_PACING_MS;

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "CODEBEAST_DEBUG")]
    /// Enable debug logging. Env: CODEBEAST_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "9000", env = "CODEBEAST_PORT")]
    /// http listener, defaults to `9000`.
    /// Env: CODEBEAST_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "CODEBEAST_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: CODEBEAST_LISTEN_ADDRESS
    pub listen_address: String,
    #[clap(
        long,
        short,
        default_value = "http://localhost:5000/",
        env = "CODEBEAST_BACKEND_URL"
    )]
    /// Base URL of the backend serving `chat/process` and `chat/generate-image`.
    /// Env: CODEBEAST_BACKEND_URL
    pub backend_url: Url,
    #[clap(long, default_value_t = DEFAULT_PACING_MS, env = "CODEBEAST_PACING_MS")]
    /// Pause between receiving the prompt and requesting the image, in milliseconds.
    /// Env: CODEBEAST_PACING_MS
    pub pacing_ms: u64,
}

impl CliOptions {
    /// The configured pacing delay.
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}
