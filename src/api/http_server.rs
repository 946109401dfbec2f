// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::analyze::analyze_handler;
use crate::config::NodeConfig;
use crate::vision::{ModelStatus, XrayPipeline};

/// Banner returned by the status endpoint
pub const STATUS_MESSAGE: &str = "OrthoAI Backend is running";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: XrayPipeline,
}

impl AppState {
    pub fn new(pipeline: XrayPipeline) -> Self {
        Self { pipeline }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub message: String,
    pub models_loaded: ModelStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
}

/// Assemble the router: API routes, static uploads, CORS and tracing
pub fn build_router(state: AppState, upload_dir: &Path, max_upload_bytes: usize) -> Router {
    Router::new()
        // Model status
        .route("/", get(status_handler))
        .route("/health", get(health_handler))
        // Analysis endpoint
        .route("/analyze", post(analyze_handler))
        // Stored uploads, referenced by imageUrl
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(state: AppState, config: &NodeConfig) -> anyhow::Result<()> {
    let app = build_router(state, &config.upload_dir, config.max_upload_bytes);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        message: STATUS_MESSAGE.to_string(),
        models_loaded: state.pipeline.registry().status(),
    })
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
