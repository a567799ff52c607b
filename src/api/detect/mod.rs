// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection API endpoint module
//!
//! Provides POST /detect for running object detection on uploaded images.

pub mod handler;
pub mod pipeline;
pub mod response;

pub use handler::{detect_handler, Upload, FILE_FIELD};
pub use pipeline::{run_detection, PipelineOutput};
pub use response::{
    image_url, public_base, DetectResponse, DetectedObject, RESULTS_PATH, UPLOADS_PATH,
};
