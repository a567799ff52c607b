// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Server configuration
//!
//! Every option can be given as a CLI flag or an environment variable.
//! A `.env` file in the working directory is loaded before parsing.

use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use url::Url;

use crate::vision::YoloConfig;

/// Landing page served at `/`
pub const LANDING_PAGE: &str = "detect.html";

/// Smallest accepted model input size; YOLO strides go down to 32
pub const MIN_INPUT_SIZE: i64 = 32;

/// YOLO detection server
#[derive(Parser, Debug, Clone)]
#[command(name = "yolo-detect-server")]
#[command(about = "Upload an image, get it back with detections drawn on it", long_about = None)]
pub struct ServerConfig {
    /// Interface to bind
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Listening port
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Application directory; static files, the landing page and the image
    /// folders live under it
    #[arg(long, env = "APP_ROOT", default_value = "public")]
    pub app_root: PathBuf,

    /// ONNX export of the YOLO model
    #[arg(long, env = "MODEL_PATH", default_value = "model/model.onnx")]
    pub model_path: PathBuf,

    /// Class names, one per line, in class-id order. Defaults to the names
    /// stored in the model metadata
    #[arg(long, env = "LABELS_PATH")]
    pub labels_path: Option<PathBuf>,

    /// TrueType font for box labels, replacing the bundled DejaVu Sans
    #[arg(long, env = "LABEL_FONT")]
    pub label_font: Option<PathBuf>,

    /// Square model input size in pixels (at least 32)
    #[arg(
        long,
        env = "MODEL_INPUT_SIZE",
        default_value_t = 640,
        value_parser = clap::value_parser!(u32).range(MIN_INPUT_SIZE..)
    )]
    pub input_size: u32,

    /// Minimum class score for a detection (0.0 - 1.0)
    #[arg(long, env = "CONFIDENCE_THRESHOLD", default_value_t = 0.25)]
    pub confidence: f32,

    /// NMS IoU threshold (0.0 - 1.0)
    #[arg(long, env = "IOU_THRESHOLD", default_value_t = 0.7)]
    pub iou: f32,

    /// Maximum detections kept per image
    #[arg(long, env = "MAX_DETECTIONS", default_value_t = 300)]
    pub max_detections: usize,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "INFERENCE_THREADS", default_value_t = 4)]
    pub intra_threads: usize,

    /// Base used for image URLs in responses, e.g. `https://detect.example.com`.
    /// Defaults to the request's Host header
    #[arg(long, env = "PUBLIC_BASE_URL")]
    pub public_base_url: Option<Url>,

    /// Upper bound on the request body. Unlimited when unset
    #[arg(long, env = "MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: Option<usize>,
}

impl ServerConfig {
    /// Load `.env` (if present) and parse flags and environment
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        Self::parse()
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.app_root.join("images").join("uploads")
    }

    pub fn result_dir(&self) -> PathBuf {
        self.app_root.join("images").join("results")
    }

    pub fn landing_page(&self) -> PathBuf {
        self.app_root.join(LANDING_PAGE)
    }

    pub fn model_dir(&self) -> Option<&Path> {
        self.model_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn yolo_config(&self) -> YoloConfig {
        YoloConfig {
            model_path: self.model_path.clone(),
            labels_path: self.labels_path.clone(),
            input_size: self.input_size,
            confidence_threshold: self.confidence.clamp(0.0, 1.0),
            iou_threshold: self.iou.clamp(0.0, 1.0),
            max_detections: self.max_detections,
            intra_threads: self.intra_threads.max(1),
        }
    }
}
