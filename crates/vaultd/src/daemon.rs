//! Daemon lifecycle: open stores, start the metrics listener, serve the API

use anyhow::{Context, Result};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tracing::{error, info};
use vault_auth::CredentialStore;
use vault_core::config::VaultConfig;
use vault_storage::BlobStore;

use crate::metrics::{ApiMetrics, HealthState};
use crate::protocol::{Limits, VaultService};
use crate::routes::AppState;

pub async fn run(config: VaultConfig) -> Result<()> {
    info!("daemon starting");

    let credentials = CredentialStore::open(&config.auth.data_dir)
        .await
        .with_context(|| format!("opening user registry in {}", config.auth.data_dir.display()))?;
    info!(users = credentials.user_count().await, "credential store ready");

    let blobs = BlobStore::open(&config.storage.root)
        .await
        .with_context(|| format!("opening storage root {}", config.storage.root.display()))?;
    vault_storage::check_health(&blobs)
        .await
        .with_context(|| format!("storage root {} not writable", config.storage.root.display()))?;

    // Metrics are registered before the registry is shared read-only
    let mut registry = Registry::default();
    let metrics = ApiMetrics::new(&mut registry);
    let registry = Arc::new(registry);

    if let Some(addr) = config.daemon.metrics_addr.clone() {
        let state = HealthState {
            registry: registry.clone(),
            store: blobs.clone(),
        };
        tokio::spawn(async move {
            if let Err(e) = crate::metrics::serve(addr, state).await {
                error!("metrics server failed: {e:#}");
            }
        });
    }

    let service = VaultService::new(credentials, blobs, Limits::from(&config.auth));
    let state = AppState {
        service: Arc::new(service),
        metrics,
    };
    let app = crate::routes::router(state, config.storage.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.daemon.listen)
        .await
        .with_context(|| format!("binding {}", config.daemon.listen))?;
    info!(
        addr = %config.daemon.listen,
        storage = %config.storage.root.display(),
        "API: listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server")?;

    info!("daemon stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to register SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl-C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
