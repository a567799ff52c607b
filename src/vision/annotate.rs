// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Rendering detections onto a copy of the source image

use ab_glyph::{FontArc, PxScale};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use super::detector::Detection;

/// DejaVu Sans, used unless another font is configured
const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

const LABEL_FONT_SIZE: f32 = 18.0;
const LABEL_STRIP_HEIGHT: u32 = 22;
const LABEL_TEXT_PADDING: i32 = 2;
const BOX_THICKNESS: i32 = 2;
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Ultralytics default class palette
const PALETTE: [[u8; 3]; 20] = [
    [255, 56, 56],
    [255, 157, 151],
    [255, 112, 31],
    [255, 178, 29],
    [207, 210, 49],
    [72, 249, 10],
    [146, 204, 23],
    [61, 219, 134],
    [26, 147, 52],
    [0, 212, 187],
    [44, 153, 168],
    [0, 194, 255],
    [52, 69, 147],
    [100, 115, 255],
    [0, 24, 236],
    [132, 56, 255],
    [82, 0, 133],
    [203, 56, 255],
    [255, 149, 200],
    [255, 55, 199],
];

#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("failed to read font {path}: {source}")]
    ReadFont {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid font file {0}")]
    InvalidFont(PathBuf),
}

/// Color assigned to `class_id`
pub fn class_color(class_id: usize) -> Rgb<u8> {
    Rgb(PALETTE[class_id % PALETTE.len()])
}

/// Draws boxes and `"<class> <confidence>"` labels for detections
///
/// Uses the bundled font unless one is loaded from a file. A plain annotator
/// has no font and draws only the colored strip above each box.
pub struct Annotator {
    font: Option<FontArc>,
    font_size: f32,
}

impl std::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotator")
            .field("has_font", &self.font.is_some())
            .field("font_size", &self.font_size)
            .finish()
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new()
    }
}

impl Annotator {
    /// Annotator with label text in the bundled font
    pub fn new() -> Self {
        Self {
            font: FontArc::try_from_slice(BUNDLED_FONT).ok(),
            font_size: LABEL_FONT_SIZE,
        }
    }

    /// Annotator without label text
    pub fn plain() -> Self {
        Self {
            font: None,
            font_size: LABEL_FONT_SIZE,
        }
    }

    /// Annotator rendering label text with the font at `path`
    pub fn with_font_file(path: &Path) -> Result<Self, AnnotateError> {
        let data = std::fs::read(path).map_err(|source| AnnotateError::ReadFont {
            path: path.to_path_buf(),
            source,
        })?;
        let font =
            FontArc::try_from_vec(data).map_err(|_| AnnotateError::InvalidFont(path.to_path_buf()))?;

        info!("Label font loaded from {}", path.display());

        Ok(Self {
            font: Some(font),
            font_size: LABEL_FONT_SIZE,
        })
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw `detections` onto an RGB copy of `image`
    pub fn annotate(&self, image: &DynamicImage, detections: &[Detection]) -> RgbImage {
        let mut canvas = image.to_rgb8();
        for detection in detections {
            self.draw_detection(&mut canvas, detection);
        }
        canvas
    }

    fn draw_detection(&self, canvas: &mut RgbImage, detection: &Detection) {
        let (w, h) = (canvas.width() as i32, canvas.height() as i32);
        if w == 0 || h == 0 {
            return;
        }

        let x_min = (detection.bbox[0].floor() as i32).clamp(0, w - 1);
        let y_min = (detection.bbox[1].floor() as i32).clamp(0, h - 1);
        let x_max = (detection.bbox[2].ceil() as i32).clamp(0, w - 1);
        let y_max = (detection.bbox[3].ceil() as i32).clamp(0, h - 1);

        if x_min >= x_max || y_min >= y_max {
            return;
        }

        let color = class_color(detection.class_id);

        // Inset rectangles for thickness
        for t in 0..BOX_THICKNESS {
            let bw = x_max - x_min + 1 - 2 * t;
            let bh = y_max - y_min + 1 - 2 * t;
            if bw <= 0 || bh <= 0 {
                break;
            }
            let rect = Rect::at(x_min + t, y_min + t).of_size(bw as u32, bh as u32);
            draw_hollow_rect_mut(canvas, rect, color);
        }

        let text = format!("{} {:.2}", detection.label, detection.confidence);
        let scale = PxScale::from(self.font_size);

        let (text_w, strip_h) = match &self.font {
            Some(font) => {
                let (tw, th) = text_size(scale, font, &text);
                (tw + 2 * LABEL_TEXT_PADDING as u32, th.max(1) + 2 * LABEL_TEXT_PADDING as u32)
            }
            None => (
                (text.len() as u32) * (LABEL_FONT_SIZE as u32 / 2),
                LABEL_STRIP_HEIGHT,
            ),
        };

        // Above the box, or inside it when the box touches the top edge
        let strip_y = if y_min >= strip_h as i32 {
            y_min - strip_h as i32
        } else {
            y_min
        };
        let strip_w = text_w.min((w - x_min) as u32);
        let strip_h = strip_h.min((h - strip_y) as u32);

        if strip_w == 0 || strip_h == 0 {
            return;
        }

        draw_filled_rect_mut(canvas, Rect::at(x_min, strip_y).of_size(strip_w, strip_h), color);

        if let Some(font) = &self.font {
            draw_text_mut(
                canvas,
                TEXT_COLOR,
                x_min + LABEL_TEXT_PADDING,
                strip_y + LABEL_TEXT_PADDING,
                scale,
                font,
                &text,
            );
        }
    }
}
