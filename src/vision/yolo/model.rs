// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO object detection model on ONNX Runtime
//!
//! Expects an Ultralytics detection export (`yolo export format=onnx`) with a
//! single `[1, 3, S, S]` float input and a single `[1, 4 + C, N]` output.

use anyhow::{Context, Result};
use image::DynamicImage;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::labels::ClassLabels;
use super::postprocess::{decode, non_max_suppression, prediction_rows};
use super::preprocessing::{preprocess, DEFAULT_INPUT_SIZE};
use crate::vision::detector::{Detection, Detector, DetectorError};

/// Settings for loading and running the detector
#[derive(Debug, Clone, PartialEq)]
pub struct YoloConfig {
    /// Path to the ONNX model file
    pub model_path: PathBuf,
    /// Optional class names file
    pub labels_path: Option<PathBuf>,
    /// Square model input size
    pub input_size: u32,
    /// Minimum class score kept
    pub confidence_threshold: f32,
    /// NMS IoU threshold
    pub iou_threshold: f32,
    /// Maximum detections per image
    pub max_detections: usize,
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
}

impl Default for YoloConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model/model.onnx"),
            labels_path: None,
            input_size: DEFAULT_INPUT_SIZE,
            confidence_threshold: 0.25,
            iou_threshold: 0.7,
            max_detections: 300,
            intra_threads: 4,
        }
    }
}

/// YOLO detector backed by an ONNX Runtime session
///
/// Runs on CPU. The session is shared behind a mutex because a run needs
/// exclusive access; concurrent requests queue on it.
#[derive(Clone)]
pub struct YoloDetector {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
    /// Model name for logs, taken from the file stem
    name: String,
    labels: ClassLabels,
    config: YoloConfig,
}

impl std::fmt::Debug for YoloDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloDetector")
            .field("name", &self.name)
            .field("input_name", &self.input_name)
            .field("classes", &self.labels.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl YoloDetector {
    /// Load the detector described by `config`
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - ONNX Runtime initialization fails
    /// - The labels file is configured but unreadable
    pub fn new(config: YoloConfig) -> Result<Self> {
        let model_path = config.model_path.as_path();

        if !model_path.exists() {
            anyhow::bail!("Model file not found at {}", model_path.display());
        }

        info!("Loading model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(config.intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load YOLO model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        if let Some(input) = session.inputs.first() {
            debug!("Model input {}: {:?}", input_name, input.input_type);
        }
        if let Some(output) = session.outputs.first() {
            debug!("Model output {}: {:?}", output.name, output.output_type);
        }

        let labels = match &config.labels_path {
            Some(path) => ClassLabels::from_file(path)?,
            None => model_labels(&session).unwrap_or_else(|| {
                warn!("No class names in model metadata; using generic class names");
                ClassLabels::default()
            }),
        };

        let name = model_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("yolo")
            .to_string();

        info!(
            "✅ Model loaded successfully ({} labelled classes, input {}x{})",
            labels.len(),
            config.input_size,
            config.input_size
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            name,
            labels,
            config,
        })
    }

    pub fn config(&self) -> &YoloConfig {
        &self.config
    }

    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }
}

/// Class names the exporter stored under the `names` metadata key
fn model_labels(session: &Session) -> Option<ClassLabels> {
    let metadata = session.metadata().ok()?;
    let names = metadata.custom("names").ok().flatten()?;
    ClassLabels::from_model_names(&names)
}

impl Detector for YoloDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>, DetectorError> {
        let started = Instant::now();
        let (input, letterbox) = preprocess(image, self.config.input_size);

        let raw = {
            let mut session = self.session.lock().map_err(|_| DetectorError::Poisoned)?;

            let input_value = Value::from_array(input)?;
            let outputs = session.run(ort::inputs![&self.input_name => input_value])?;

            let raw = outputs[0].try_extract_array::<f32>()?.to_owned();
            raw
        };

        debug!("Raw output shape: {:?}", raw.shape());

        let rows = prediction_rows(&raw)?;
        let candidates = decode(
            rows,
            &letterbox,
            &self.labels,
            self.config.confidence_threshold,
        );
        let candidate_count = candidates.len();
        let detections = non_max_suppression(
            candidates,
            self.config.iou_threshold,
            self.config.max_detections,
        );

        debug!(
            "Detection on {}x{}: {} candidates, {} kept, {:?}",
            image.width(),
            image.height(),
            candidate_count,
            detections.len(),
            started.elapsed()
        );

        Ok(detections)
    }
}
