// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing module for CPU-based object detection
//!
//! This module provides:
//! - The `Detector` abstraction used by the HTTP layer
//! - A YOLO detector on ONNX Runtime
//! - Annotation of detections onto result images

pub mod annotate;
pub mod detector;
pub mod image_utils;
pub mod model_manager;
pub mod yolo;

pub use annotate::{class_color, AnnotateError, Annotator};
pub use detector::{Detection, Detector, DetectorError};
pub use image_utils::{
    decode_image_bytes, decode_image_file, detect_format, encode_image, output_format, ImageError,
};
pub use model_manager::ModelState;
pub use yolo::{YoloConfig, YoloDetector};
