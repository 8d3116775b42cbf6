use std::sync::Arc;

use clap::Parser;
use codebeast::backend::HttpBackend;
use codebeast::compositor::Compositor;
use codebeast::config::setup_logging;
use codebeast::pipeline::{Pipeline, PipelineConfig};
use tracing::{error, info};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = codebeast::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let compositor = match Compositor::bundled() {
        Ok(compositor) => compositor,
        Err(err) => {
            error!("Failed to load caption font: {}", err);
            return;
        }
    };

    info!("Using backend at {}", cli.backend_url);
    let pipeline = Pipeline::new(
        Arc::new(HttpBackend::new(cli.backend_url.clone())),
        compositor,
        PipelineConfig {
            pacing: cli.pacing(),
        },
    );

    if let Err(err) = codebeast::web::setup_server(&cli.listen_address, cli.port, pipeline).await {
        error!("Application error: {}", err);
    }
}
