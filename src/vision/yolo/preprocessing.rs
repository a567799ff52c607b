// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Letterbox preprocessing for YOLO input

use image::{imageops::FilterType, DynamicImage, Rgb, RgbImage};
use ndarray::Array4;

/// Default square input size of Ultralytics exports
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Padding color used by Ultralytics letterboxing
pub const PAD_VALUE: u8 = 114;

/// Geometry of a letterbox transform, kept to map model boxes back
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Resize factor applied to the source image
    pub scale: f32,
    /// Horizontal padding on the left, in model pixels
    pub pad_x: u32,
    /// Vertical padding on the top, in model pixels
    pub pad_y: u32,
    /// Size of the resized image inside the canvas
    pub resized: (u32, u32),
    /// Source image size
    pub source: (u32, u32),
    /// Canvas (model input) side length
    pub target: u32,
}

impl Letterbox {
    /// Fit a `width` x `height` image into a `target` square
    pub fn fit(width: u32, height: u32, target: u32) -> Self {
        let scale = if width == 0 || height == 0 {
            1.0
        } else {
            (target as f32 / width as f32).min(target as f32 / height as f32)
        };

        let new_w = ((width as f32 * scale).round() as u32).clamp(1, target.max(1));
        let new_h = ((height as f32 * scale).round() as u32).clamp(1, target.max(1));

        Self {
            scale,
            pad_x: target.saturating_sub(new_w) / 2,
            pad_y: target.saturating_sub(new_h) / 2,
            resized: (new_w, new_h),
            source: (width, height),
            target,
        }
    }

    /// Map a point from model input space to source pixel space, clamped to
    /// the source image
    pub fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
        let sx = (x - self.pad_x as f32) / self.scale;
        let sy = (y - self.pad_y as f32) / self.scale;
        (
            sx.clamp(0.0, self.source.0 as f32),
            sy.clamp(0.0, self.source.1 as f32),
        )
    }

    /// Render the letterboxed canvas for `image`
    pub fn apply(&self, image: &DynamicImage) -> RgbImage {
        let resized = image
            .resize_exact(self.resized.0, self.resized.1, FilterType::Triangle)
            .to_rgb8();

        let mut canvas =
            RgbImage::from_pixel(self.target, self.target, Rgb([PAD_VALUE, PAD_VALUE, PAD_VALUE]));
        image::imageops::replace(&mut canvas, &resized, self.pad_x as i64, self.pad_y as i64);
        canvas
    }
}

/// Preprocess an image for YOLO detection
///
/// Steps:
/// 1. Resize with aspect ratio preservation to `target` x `target`
/// 2. Pad with gray (114), centered
/// 3. Scale pixels to [0, 1]
/// 4. Convert to NCHW tensor format [1, 3, target, target]
pub fn preprocess(image: &DynamicImage, target: u32) -> (Array4<f32>, Letterbox) {
    let letterbox = Letterbox::fit(image.width(), image.height(), target);
    let canvas = letterbox.apply(image);

    let side = target as usize;
    let mut tensor = Array4::zeros((1, 3, side, side));

    for (x, y, pixel) in canvas.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    (tensor, letterbox)
}
