// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod storage;
pub mod vision;

// Re-export main types
pub use api::{create_app, start_server, ApiError, AppState};
pub use config::ServerConfig;
pub use storage::{sanitize_filename, ImageStore, StorageError};
pub use vision::{
    Annotator, Detection, Detector, DetectorError, ModelState, YoloConfig, YoloDetector,
};
