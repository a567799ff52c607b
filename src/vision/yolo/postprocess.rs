// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO output decoding and non-maximum suppression
//!
//! Ultralytics YOLOv8/11 detection exports produce a single tensor of shape
//! `[1, 4 + C, N]`: for each of `N` anchors a `cx, cy, w, h` box in model
//! input pixels followed by `C` class scores (already sigmoid-activated).
//! Some exports transpose it to `[1, N, 4 + C]`; both layouts are accepted.

use ndarray::{s, ArrayD, ArrayView2, Axis, Ix2};
use std::cmp::Ordering;

use super::labels::ClassLabels;
use super::preprocessing::Letterbox;
use crate::vision::detector::{Detection, DetectorError};

/// Number of box coordinates preceding the class scores
const BOX_COORDS: usize = 4;

/// View the raw output as one row per anchor: `[N, 4 + C]`
pub fn prediction_rows(output: &ArrayD<f32>) -> Result<ArrayView2<'_, f32>, DetectorError> {
    let shape = output.shape();
    if shape.len() != 3 || shape[0] != 1 {
        return Err(DetectorError::OutputShape(format!(
            "expected [1, 4 + classes, anchors], got {:?}",
            shape
        )));
    }

    let view = output
        .index_axis(Axis(0), 0)
        .into_dimensionality::<Ix2>()
        .map_err(|e| DetectorError::OutputShape(e.to_string()))?;

    // Anchors always outnumber channels, so a wide matrix is channel-first
    let rows = if view.nrows() < view.ncols() {
        view.reversed_axes()
    } else {
        view
    };

    if rows.ncols() <= BOX_COORDS {
        return Err(DetectorError::OutputShape(format!(
            "no class scores in output {:?}",
            shape
        )));
    }

    Ok(rows)
}

/// Turn prediction rows into detections in source-image coordinates
///
/// Each anchor keeps only its best class; anchors below
/// `confidence_threshold` and boxes that collapse after clamping are dropped.
pub fn decode(
    rows: ArrayView2<'_, f32>,
    letterbox: &Letterbox,
    labels: &ClassLabels,
    confidence_threshold: f32,
) -> Vec<Detection> {
    let mut detections = Vec::new();

    for row in rows.rows() {
        let (class_id, score) = row
            .slice(s![BOX_COORDS..])
            .iter()
            .enumerate()
            .fold((0usize, f32::MIN), |best, (idx, &score)| {
                if score > best.1 {
                    (idx, score)
                } else {
                    best
                }
            });

        if score < confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        let (x1, y1) = letterbox.to_source(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = letterbox.to_source(cx + w / 2.0, cy + h / 2.0);

        if x2 <= x1 || y2 <= y1 {
            continue;
        }

        detections.push(Detection {
            class_id,
            label: labels.name(class_id),
            confidence: score,
            bbox: [x1, y1, x2, y2],
        });
    }

    detections
}

/// Per-class greedy non-maximum suppression
///
/// Returns at most `max_detections` boxes ordered by confidence, highest first.
pub fn non_max_suppression(
    mut detections: Vec<Detection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::new();

    for candidate in detections {
        if kept.len() >= max_detections {
            break;
        }

        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.iou(&candidate) > iou_threshold
        });

        if !suppressed {
            kept.push(candidate);
        }
    }

    kept
}
