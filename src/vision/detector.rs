// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detector abstraction
//!
//! The HTTP layer only knows this trait. The ONNX YOLO model implements it in
//! production; tests plug in fixed-output detectors.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::image_utils::{decode_image_file, ImageError};

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("failed to load image: {0}")]
    Image(#[from] ImageError),

    #[error("ONNX Runtime error: {0}")]
    Runtime(#[from] ort::Error),

    #[error("unexpected model output: {0}")]
    OutputShape(String),

    #[error("inference session poisoned by an earlier panic")]
    Poisoned,
}

/// One detected object, in source-image pixel coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_id: usize,
    pub label: String,
    pub confidence: f32,
    /// `[x_min, y_min, x_max, y_max]`
    pub bbox: [f32; 4],
}

impl Detection {
    pub fn width(&self) -> f32 {
        (self.bbox[2] - self.bbox[0]).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.bbox[3] - self.bbox[1]).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union with `other`
    pub fn iou(&self, other: &Detection) -> f32 {
        let x1 = self.bbox[0].max(other.bbox[0]);
        let y1 = self.bbox[1].max(other.bbox[1]);
        let x2 = self.bbox[2].min(other.bbox[2]);
        let y2 = self.bbox[3].min(other.bbox[3]);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

/// An object detector usable from any thread
pub trait Detector: Send + Sync {
    /// Short model name for logs and health output
    fn name(&self) -> &str;

    /// Run detection on a decoded image. Blocking.
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>, DetectorError>;

    /// Load the image at `path` and run detection on it. Blocking.
    ///
    /// Returns the decoded image as well so callers can render on it without
    /// reading the file twice.
    fn detect_path(&self, path: &Path) -> Result<(DynamicImage, Vec<Detection>), DetectorError> {
        let image = decode_image_file(path)?;
        let detections = self.detect(&image)?;
        Ok((image, detections))
    }
}
