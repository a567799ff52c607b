// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::{get, get_service, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::info;
use url::Url;

use super::detect::detect_handler;
use crate::config::ServerConfig;
use crate::storage::ImageStore;
use crate::vision::{Annotator, ModelState};

/// Shared state of the HTTP server
#[derive(Debug)]
pub struct AppState {
    pub store: ImageStore,
    pub model: ModelState,
    pub annotator: Arc<Annotator>,
    /// Base for image URLs; the Host header is used when unset
    pub public_base_url: Option<Url>,
    /// Listening port, used for fallback URLs
    pub port: u16,
    /// Served as the fallback for unmatched GETs
    pub app_root: PathBuf,
    pub landing_page: PathBuf,
    pub max_upload_bytes: Option<usize>,
}

impl AppState {
    pub fn new(config: &ServerConfig, model: ModelState, annotator: Annotator) -> Self {
        Self {
            store: ImageStore::new(config.upload_dir(), config.result_dir()),
            model,
            annotator: Arc::new(annotator),
            public_base_url: config.public_base_url.clone(),
            port: config.port,
            app_root: config.app_root.clone(),
            landing_page: config.landing_page(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// "ready" or "unavailable"
    pub model: String,
}

/// Build the router with all routes and layers
pub fn create_app(state: Arc<AppState>) -> Router {
    let body_limit = match state.max_upload_bytes {
        Some(max) => DefaultBodyLimit::max(max),
        None => DefaultBodyLimit::disable(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // Detection endpoint
        .route("/detect", post(detect_handler))
        // Health check
        .route("/health", get(health_handler))
        // Stored images
        .nest_service("/images/uploads", ServeDir::new(state.store.upload_dir()))
        .nest_service("/images/results", ServeDir::new(state.store.result_dir()))
        // Landing page and everything else under the app root
        .route("/", get_service(ServeFile::new(&state.landing_page)))
        .fallback_service(ServeDir::new(&state.app_root))
        .layer(body_limit)
        .layer(cors)
        // Outside CORS so preflight answers get it too
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl+C
pub async fn start_server(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("🚀 Detection server listening on http://{}", actual_addr);
    info!("   POST /detect");
    info!("   GET  /images/uploads/<name>, /images/results/<name>");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = signal::ctrl_c().await;
            info!("Shutting down...");
        })
        .await?;

    Ok(())
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.model.status_str().to_string(),
    })
}
