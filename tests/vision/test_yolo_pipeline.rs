// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! YOLO pre/post-processing without a model
//!
//! Builds raw output tensors by hand and checks that boxes come back in
//! source-image coordinates after letterboxing, thresholding and NMS.

use image::{DynamicImage, Rgb, RgbImage};
use ndarray::{Array3, ArrayD};
use yolo_detect_server::vision::yolo::{
    decode, non_max_suppression, prediction_rows, preprocess, ClassLabels, Letterbox,
};

/// Write one anchor (`cx, cy, w, h`, then scores) into a channel-first output
fn set_anchor(out: &mut Array3<f32>, anchor: usize, bbox: [f32; 4], scores: &[f32]) {
    for (i, v) in bbox.iter().chain(scores.iter()).enumerate() {
        out[[0, i, anchor]] = *v;
    }
}

fn labels() -> ClassLabels {
    ClassLabels::parse("blast\nlymphocyte\n")
}

#[test]
fn test_letterbox_round_trip_of_box_corners() {
    let lb = Letterbox::fit(1000, 500, 640);
    // source (200, 100) -> model (200 * 0.64, 100 * 0.64 + 160)
    let (x, y) = lb.to_source(128.0, 64.0 + lb.pad_y as f32);
    assert!((x - 200.0).abs() < 1e-3);
    assert!((y - 100.0).abs() < 1e-3);
}

#[test]
fn test_preprocess_matches_letterbox_geometry() {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(1000, 500, Rgb([0, 255, 0])));
    let (tensor, lb) = preprocess(&image, 64);

    assert_eq!(tensor.shape(), &[1, 3, 64, 64]);
    assert_eq!(lb.resized, (64, 32));
    assert_eq!(lb.pad_y, 16);
    // green inside the image band, gray in the padding
    assert!((tensor[[0, 1, 30, 30]] - 1.0).abs() < 1e-6);
    assert!((tensor[[0, 1, 2, 30]] - 114.0 / 255.0).abs() < 1e-6);
}

#[test]
fn test_overlapping_boxes_of_same_class_collapse() {
    let lb = Letterbox::fit(640, 640, 640);
    let mut out = Array3::<f32>::zeros((1, 6, 16));
    set_anchor(&mut out, 0, [100.0, 100.0, 50.0, 50.0], &[0.9, 0.0]);
    set_anchor(&mut out, 1, [102.0, 101.0, 50.0, 50.0], &[0.8, 0.0]);
    set_anchor(&mut out, 2, [101.0, 100.0, 50.0, 50.0], &[0.0, 0.7]);
    set_anchor(&mut out, 3, [400.0, 400.0, 30.0, 30.0], &[0.6, 0.0]);
    let out: ArrayD<f32> = out.into_dyn();

    let candidates = decode(prediction_rows(&out).unwrap(), &lb, &labels(), 0.25);
    assert_eq!(candidates.len(), 4);

    let kept = non_max_suppression(candidates, 0.7, 300);

    assert_eq!(kept.len(), 3);
    assert_eq!(kept[0].label, "blast");
    assert_eq!(kept[0].confidence, 0.9);
    assert_eq!(kept[1].label, "lymphocyte");
    assert_eq!(kept[2].bbox, [385.0, 385.0, 415.0, 415.0]);
}

#[test]
fn test_row_major_output_is_accepted() {
    // [1, N, 4 + C] layout
    let mut out = Array3::<f32>::zeros((1, 10, 6));
    out[[0, 0, 0]] = 320.0;
    out[[0, 0, 1]] = 320.0;
    out[[0, 0, 2]] = 64.0;
    out[[0, 0, 3]] = 64.0;
    out[[0, 0, 5]] = 0.95;
    let out = out.into_dyn();

    let rows = prediction_rows(&out).unwrap();
    assert_eq!(rows.shape(), &[10, 6]);

    let dets = decode(rows, &Letterbox::fit(640, 640, 640), &labels(), 0.25);
    assert_eq!(dets.len(), 1);
    assert_eq!(dets[0].label, "lymphocyte");
    assert_eq!(dets[0].bbox, [288.0, 288.0, 352.0, 352.0]);
}

#[test]
fn test_unknown_class_ids_get_generic_names() {
    let mut out = Array3::<f32>::zeros((1, 7, 8));
    set_anchor(&mut out, 0, [50.0, 50.0, 10.0, 10.0], &[0.0, 0.0, 0.8]);
    let out = out.into_dyn();

    let dets = decode(
        prediction_rows(&out).unwrap(),
        &Letterbox::fit(640, 640, 640),
        &labels(),
        0.25,
    );
    assert_eq!(dets[0].class_id, 2);
    assert_eq!(dets[0].label, "class 2");
}
