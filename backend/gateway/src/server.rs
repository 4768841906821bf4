//! HTTP server for the scheduling API.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use medibook_intake::RequestOrchestrator;

use crate::schedule_api;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub orchestrator: RequestOrchestrator,
    /// Used when a request carries no `user_timezone`.
    pub default_timezone: String,
    /// Where image uploads are staged while OCR runs.
    pub uploads_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl GatewayState {
    pub fn new(
        orchestrator: RequestOrchestrator,
        default_timezone: impl Into<String>,
        uploads_dir: impl AsRef<Path>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            orchestrator,
            default_timezone: default_timezone.into(),
            uploads_dir: uploads_dir.as_ref().to_path_buf(),
            max_upload_bytes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler for `GET /api/health`
pub async fn health() -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        service: "medibook",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn build_router(state: GatewayState) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/api/schedule", post(schedule_api::schedule))
        .route("/api/vocabulary", get(schedule_api::vocabulary))
        .route("/api/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl+C or SIGTERM.
#[instrument(skip(state))]
pub async fn start_server(addr: &str, state: GatewayState) -> Result<()> {
    tokio::fs::create_dir_all(&state.uploads_dir)
        .await
        .with_context(|| format!("Failed to create {}", state.uploads_dir.display()))?;

    let app = build_router(state);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Medibook server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Medibook server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
