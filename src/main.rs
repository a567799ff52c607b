// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use yolo_detect_server::{
    api::{start_server, AppState},
    config::ServerConfig,
    storage::ImageStore,
    vision::{Annotator, ModelState},
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::load();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🚀 Starting YOLO detection server...");
    info!("📦 Version: {}", env!("CARGO_PKG_VERSION"));

    let addr = config.listen_addr().context("Invalid listen address")?;

    // Image folders
    ImageStore::new(config.upload_dir(), config.result_dir())
        .ensure_dirs()
        .await
        .context("Failed to create image directories")?;

    if let Some(model_dir) = config.model_dir() {
        tokio::fs::create_dir_all(model_dir)
            .await
            .with_context(|| format!("Failed to create model directory {}", model_dir.display()))?;
    }

    // Detection model; the server keeps running without it
    info!("🧠 Loading detection model...");
    let model = ModelState::load(&config.yolo_config()).await;
    if let ModelState::Unavailable { reason } = &model {
        error!("Detection model unavailable, /detect will fail: {}", reason);
    }

    let annotator = match &config.label_font {
        Some(path) => match Annotator::with_font_file(path) {
            Ok(annotator) => annotator,
            Err(e) => {
                warn!("⚠️ {}; using the bundled label font", e);
                Annotator::new()
            }
        },
        None => Annotator::new(),
    };
    if !annotator.has_font() {
        warn!("⚠️ No usable label font; boxes will be drawn without text");
    }

    if !config.landing_page().exists() {
        warn!(
            "Landing page {} not found; GET / will return 404",
            config.landing_page().display()
        );
    }

    let state = Arc::new(AppState::new(&config, model, annotator));
    start_server(addr, state).await?;

    info!("👋 Goodbye!");
    Ok(())
}
