//! Prometheus /metrics + health check HTTP endpoints
//!
//! Endpoints:
//!   GET /metrics  - Prometheus text format
//!   GET /healthz  - Liveness probe (always 200 if process is running)
//!   GET /readyz   - Readiness probe (200 if the storage root is writable)

use anyhow::{Context, Result};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus_client::{
    encoding::text::encode,
    metrics::{counter::Counter, family::Family, gauge::Gauge},
    registry::Registry,
};
use std::sync::Arc;
use vault_core::VaultResult;
use vault_storage::BlobStore;

type Labels = Vec<(String, String)>;

/// Counters updated by the API handlers
#[derive(Clone, Default)]
pub struct ApiMetrics {
    requests: Family<Labels, Counter>,
    bytes_uploaded: Counter,
    bytes_downloaded: Counter,
    active_sessions: Gauge,
}

impl ApiMetrics {
    pub fn new(registry: &mut Registry) -> Self {
        let metrics = Self::default();
        registry.register(
            "vault_requests",
            "API requests by operation and outcome",
            metrics.requests.clone(),
        );
        registry.register(
            "vault_uploaded_bytes",
            "Ciphertext bytes accepted by upload",
            metrics.bytes_uploaded.clone(),
        );
        registry.register(
            "vault_downloaded_bytes",
            "Ciphertext bytes served by download",
            metrics.bytes_downloaded.clone(),
        );
        registry.register(
            "vault_active_sessions",
            "Sessions currently held in memory",
            metrics.active_sessions.clone(),
        );
        metrics
    }

    /// Count one request. The outcome label is `ok` or the error kind.
    pub fn observe<T>(&self, operation: &str, result: &VaultResult<T>) {
        let outcome = match result {
            Ok(_) => "ok",
            Err(e) => e.kind().as_str(),
        };
        self.requests
            .get_or_create(&vec![
                ("operation".to_string(), operation.to_string()),
                ("outcome".to_string(), outcome.to_string()),
            ])
            .inc();
    }

    pub fn uploaded(&self, bytes: usize) {
        self.bytes_uploaded.inc_by(bytes as u64);
    }

    pub fn downloaded(&self, bytes: usize) {
        self.bytes_downloaded.inc_by(bytes as u64);
    }

    pub fn set_sessions(&self, count: usize) {
        self.active_sessions.set(count as i64);
    }

    #[cfg(test)]
    pub fn request_count(&self, operation: &str, outcome: &str) -> u64 {
        self.requests
            .get_or_create(&vec![
                ("operation".to_string(), operation.to_string()),
                ("outcome".to_string(), outcome.to_string()),
            ])
            .get()
    }
}

/// Shared health state for the metrics listener
#[derive(Clone)]
pub struct HealthState {
    pub registry: Arc<Registry>,
    pub store: BlobStore,
}

pub fn router(state: HealthState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .with_state(state)
}

/// Serve Prometheus metrics and health endpoints on `addr` (e.g. "127.0.0.1:9100")
pub async fn serve(addr: String, state: HealthState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("metrics bind {addr}"))?;

    tracing::info!(addr = %addr, "metrics: listening on /metrics, /healthz, /readyz");

    axum::serve(listener, router(state))
        .await
        .context("metrics server")
}

async fn metrics_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let mut body = String::new();
    match encode(&mut body, &state.registry) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            tracing::error!("metrics encode failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                e.to_string(),
            )
        }
    }
}

async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn readyz_handler(State(state): State<HealthState>) -> impl IntoResponse {
    match vault_storage::check_health(&state.store).await {
        Ok(()) => (StatusCode::OK, "ready"),
        Err(e) => {
            tracing::warn!("readiness check failed: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, "storage not writable")
        }
    }
}
