// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Blocking part of a detection request: infer, annotate, write the result

use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

use crate::api::errors::ApiError;
use crate::storage::ImageStore;
use crate::vision::{encode_image, output_format, Annotator, Detection, Detector};

/// What a finished pipeline run produced
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Result filename inside the result directory
    pub result_name: String,
    pub detections: Vec<Detection>,
    /// Annotated image dimensions
    pub width: u32,
    pub height: u32,
}

/// Run detection on the saved upload and write the annotated result
///
/// Blocking; run it on a blocking thread. `timestamp` is the unix-seconds
/// component of the result name.
pub fn run_detection(
    detector: &dyn Detector,
    annotator: &Annotator,
    store: &ImageStore,
    upload_path: &Path,
    sanitized: &str,
    timestamp: i64,
) -> Result<PipelineOutput, ApiError> {
    let started = Instant::now();

    let (image, detections) = detector.detect_path(upload_path)?;
    debug!(
        "{} found {} objects in {} ({:?})",
        detector.name(),
        detections.len(),
        upload_path.display(),
        started.elapsed()
    );

    let annotated = annotator.annotate(&image, &detections);

    let result = store.create_result_file(timestamp, sanitized)?;
    let format = output_format(&result.name);

    let written = {
        let mut writer = BufWriter::new(result.file);
        encode_image(&annotated, format, &mut writer)
            .map_err(ApiError::from)
            .and_then(|_| {
                writer
                    .flush()
                    .map_err(|e| ApiError::Encode(format!("flush {}: {}", result.path.display(), e)))
            })
    };

    if let Err(e) = written {
        if let Err(remove_err) = std::fs::remove_file(&result.path) {
            warn!(
                "Failed to remove partial result {}: {}",
                result.path.display(),
                remove_err
            );
        }
        return Err(e);
    }

    debug!(
        "Wrote {} as {:?} in {:?}",
        result.path.display(),
        format,
        started.elapsed()
    );

    Ok(PipelineOutput {
        result_name: result.name,
        detections,
        width: annotated.width(),
        height: annotated.height(),
    })
}
