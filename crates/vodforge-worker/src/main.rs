//! Long-polling transcoding worker binary.

use anyhow::Context;
use tokio::sync::watch;
use tracing::info;

use vodforge_media::Transcoder;
use vodforge_notifier::NotifierClient;
use vodforge_queue::JobQueue;
use vodforge_storage::ObjectStoreClient;
use vodforge_worker::{telemetry, ConsumerLoop, TranscodePipeline, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    info!("Starting vodforge-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let queue = JobQueue::from_env().await.context("create job queue")?;
    let store = ObjectStoreClient::from_env()
        .await
        .context("create object store client")?;
    let notifier = NotifierClient::from_env().context("create notifier client")?;
    let encoder = Transcoder::new(config.format);

    let pipeline = TranscodePipeline::new(store, encoder, notifier, config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    ConsumerLoop::new(queue, pipeline, shutdown_rx).run().await?;

    info!("Worker shutdown complete");
    Ok(())
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(_) => {
                tokio::signal::ctrl_c().await.ok();
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
}
