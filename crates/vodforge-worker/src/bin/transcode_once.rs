//! Single-shot worker binary.
//!
//! Reads one storage-event payload from the TRANSCODE_EVENT environment
//! variable (the externally-triggered invocation path), runs the pipeline
//! once per record, and exits non-zero if any job failed.

use anyhow::Context;
use tracing::{error, info};

use vodforge_media::Transcoder;
use vodforge_notifier::NotifierClient;
use vodforge_storage::ObjectStoreClient;
use vodforge_worker::consumer::parse_jobs;
use vodforge_worker::{telemetry, TranscodePipeline, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let event = std::env::var("TRANSCODE_EVENT").context("TRANSCODE_EVENT not set")?;
    let jobs = parse_jobs(&event).context("parse storage event")?;

    let config = WorkerConfig::from_env();
    let store = ObjectStoreClient::from_env()
        .await
        .context("create object store client")?;
    let notifier = NotifierClient::from_env().context("create notifier client")?;
    let encoder = Transcoder::new(config.format);

    let pipeline = TranscodePipeline::new(store, encoder, notifier, config);

    let mut failed = false;
    for job in jobs {
        if let Err(e) = pipeline.process(&job).await {
            error!(video_id = %job.video_id, "Job failed: {}", e);
            failed = true;
        }
    }

    if failed {
        anyhow::bail!("one or more jobs failed");
    }

    info!("Video processing completed successfully");
    Ok(())
}
