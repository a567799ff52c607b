// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Process-wide detection model state
//!
//! The model is loaded once at startup. A failed load does not stop the
//! server; it runs degraded and every detection request is refused.

use std::sync::Arc;
use tracing::{error, info};

use super::detector::Detector;
use super::yolo::{YoloConfig, YoloDetector};

/// Outcome of loading the detection model
#[derive(Clone)]
pub enum ModelState {
    /// Model loaded and ready for inference
    Ready(Arc<dyn Detector>),
    /// Model failed to load; `reason` is kept for logs
    Unavailable { reason: String },
}

impl std::fmt::Debug for ModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(detector) => f.debug_tuple("Ready").field(&detector.name()).finish(),
            Self::Unavailable { reason } => f
                .debug_struct("Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}

impl ModelState {
    /// Load the YOLO model described by `config`
    ///
    /// Session construction is CPU heavy, so it runs on a blocking thread.
    /// Never fails: load errors produce [`ModelState::Unavailable`].
    pub async fn load(config: &YoloConfig) -> Self {
        let config = config.clone();
        let path = config.model_path.display().to_string();

        let loaded = tokio::task::spawn_blocking(move || YoloDetector::new(config)).await;

        match loaded {
            Ok(Ok(detector)) => {
                info!("✅ Detection model loaded from {}", path);
                Self::ready(Arc::new(detector))
            }
            Ok(Err(e)) => {
                error!("❌ Failed to load detection model from {}: {:#}", path, e);
                Self::unavailable(format!("{:#}", e))
            }
            Err(e) => {
                error!("❌ Model loading task failed: {}", e);
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn ready(detector: Arc<dyn Detector>) -> Self {
        Self::Ready(detector)
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// The detector, if the model is loaded
    pub fn detector(&self) -> Option<Arc<dyn Detector>> {
        match self {
            Self::Ready(detector) => Some(detector.clone()),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// `"ready"` or `"unavailable"`, as reported by the health endpoint
    pub fn status_str(&self) -> &'static str {
        match self {
            Self::Ready(_) => "ready",
            Self::Unavailable { .. } => "unavailable",
        }
    }
}
