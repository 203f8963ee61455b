//! Daemon entry point for the PDF question answering server.
//!
//! Loads configuration from CLI arguments and the environment, opens the
//! document store, selects the answering backend, and serves the HTTP API.

mod backend;
mod config;

use pdfqa_core::control::QaControlPlane;
use pdfqa_core::store::{DocStoreConfig, MemoryDocStore};
use pdfqa_http::{QaServer, QaServerConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::backend::build_engine;
use crate::config::QaConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = QaConfig::from_args()?;
    init_tracing(config.debug);

    let mut store_config =
        DocStoreConfig::new(config.upload_dir.clone()).with_parse_workers(config.parse_workers);
    if let Some(timeout) = config.parse_timeout {
        store_config = store_config.with_parse_timeout(timeout);
    }
    let store = MemoryDocStore::open(store_config).await?;

    let engine = build_engine(&config);
    info!(
        backend = engine.strategy_name(),
        upload_dir = %config.upload_dir.display(),
        "pdfqa starting"
    );

    let control = QaControlPlane::new(store, engine);
    let server_config = QaServerConfig::new(config.addr)
        .with_max_upload_bytes(config.max_upload_bytes)
        .with_request_timeout(config.request_timeout)
        .with_cors_origins(config.cors_origins);

    QaServer::new(control, server_config)
        .serve(wait_for_shutdown(tokio::signal::ctrl_c()))
        .await
}

/// Resolves once `signal` fires. If the signal cannot be installed the
/// server keeps running instead of stopping at once.
async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => {
            error!(error = %err, "failed to listen for ctrl-c; running until killed");
            std::future::pending::<()>().await;
        }
    }
}

fn init_tracing(debug: bool) {
    let fallback = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
