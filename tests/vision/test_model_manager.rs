// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Model state tests
//!
//! These tests verify that ModelState:
//! - Loads the YOLO model when present
//! - Degrades to Unavailable for missing or corrupt model files
//! - Exposes the detector only when ready

use std::path::PathBuf;
use std::sync::Arc;
use yolo_detect_server::vision::{
    Detection, Detector, DetectorError, ModelState, YoloConfig, YoloDetector,
};

// Exported with `yolo export model=<weights>.pt format=onnx`
const MODEL_PATH: &str = "model/model.onnx";

struct NoopDetector;

impl Detector for NoopDetector {
    fn name(&self) -> &str {
        "noop"
    }

    fn detect(&self, _image: &image::DynamicImage) -> Result<Vec<Detection>, DetectorError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod model_state_tests {
    use super::*;

    // =============================================================================
    // Degraded mode
    // =============================================================================

    #[tokio::test]
    async fn test_missing_model_file() {
        let config = YoloConfig {
            model_path: PathBuf::from("/nonexistent/model.onnx"),
            ..Default::default()
        };

        let state = ModelState::load(&config).await;

        assert!(!state.is_ready());
        assert!(state.detector().is_none());
        assert_eq!(state.status_str(), "unavailable");
    }

    #[tokio::test]
    async fn test_corrupt_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"this is not an onnx graph").unwrap();

        let state = ModelState::load(&YoloConfig {
            model_path: path,
            ..Default::default()
        })
        .await;

        assert!(!state.is_ready());
        match state {
            ModelState::Unavailable { reason } => assert!(!reason.is_empty()),
            ModelState::Ready(_) => panic!("corrupt model must not load"),
        }
    }

    #[tokio::test]
    async fn test_unreadable_labels_file() {
        let state = ModelState::load(&YoloConfig {
            model_path: PathBuf::from("/nonexistent/model.onnx"),
            labels_path: Some(PathBuf::from("/nonexistent/labels.txt")),
            ..Default::default()
        })
        .await;
        assert!(!state.is_ready());
    }

    // =============================================================================
    // Ready state
    // =============================================================================

    #[test]
    fn test_ready_exposes_detector() {
        let state = ModelState::ready(Arc::new(NoopDetector));

        assert!(state.is_ready());
        assert_eq!(state.status_str(), "ready");
        assert_eq!(state.detector().unwrap().name(), "noop");
    }

    #[test]
    fn test_state_is_cloneable_and_shared() {
        let state = ModelState::ready(Arc::new(NoopDetector));
        let copy = state.clone();
        let a = state.detector().unwrap();
        let b = copy.detector().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    // =============================================================================
    // Real model (requires model/model.onnx)
    // =============================================================================

    #[tokio::test]
    #[ignore] // Requires an exported model
    async fn test_load_real_model() {
        let state = ModelState::load(&YoloConfig {
            model_path: PathBuf::from(MODEL_PATH),
            ..Default::default()
        })
        .await;
        assert!(state.is_ready());

        let detector = state.detector().unwrap();
        let image = image::DynamicImage::new_rgb8(640, 480);
        let detections = detector.detect(&image).unwrap();
        assert!(detections.len() <= 300);
    }

    #[test]
    #[ignore] // Requires an exported model
    fn test_detector_direct() {
        let detector = YoloDetector::new(YoloConfig {
            model_path: PathBuf::from(MODEL_PATH),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(detector.name(), "model");
        assert_eq!(detector.config().input_size, 640);
    }

    #[test]
    #[ignore] // Requires an exported model
    fn test_class_names_from_model_metadata() {
        let detector = YoloDetector::new(YoloConfig {
            model_path: PathBuf::from(MODEL_PATH),
            ..Default::default()
        })
        .unwrap();
        assert!(!detector.labels().is_empty());
        assert_ne!(detector.labels().name(0), "class 0");
    }
}
