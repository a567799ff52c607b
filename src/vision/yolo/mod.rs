// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO object detection over ONNX Runtime
//!
//! Pipeline: letterbox preprocessing, a single session run, then decoding of
//! the raw predictions and per-class NMS.

pub mod labels;
pub mod model;
pub mod postprocess;
pub mod preprocessing;

pub use labels::ClassLabels;
pub use model::{YoloConfig, YoloDetector};
pub use postprocess::{decode, non_max_suppression, prediction_rows};
pub use preprocessing::{preprocess, Letterbox, DEFAULT_INPUT_SIZE, PAD_VALUE};
