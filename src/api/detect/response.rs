// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection response types and image URL construction

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::vision::Detection;

/// URL path of the upload folder
pub const UPLOADS_PATH: &str = "images/uploads";
/// URL path of the result folder
pub const RESULTS_PATH: &str = "images/results";

/// A detected object as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub label: String,
    pub class_id: usize,
    /// Class score (0.0-1.0)
    pub confidence: f32,
    /// `[x_min, y_min, x_max, y_max]` in original image pixels
    pub bbox: [f32; 4],
}

impl From<&Detection> for DetectedObject {
    fn from(d: &Detection) -> Self {
        Self {
            label: d.label.clone(),
            class_id: d.class_id,
            confidence: d.confidence,
            bbox: d.bbox,
        }
    }
}

/// Successful POST /detect body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResponse {
    /// Always "success"
    pub status: String,
    /// URL of the stored upload
    pub original_image: String,
    /// URL of the annotated result
    pub result_image: String,
    pub message: String,
    pub detections: Vec<DetectedObject>,
}

impl DetectResponse {
    pub fn new(original_image: Url, result_image: Url, detections: &[Detection]) -> Self {
        Self {
            status: "success".to_string(),
            original_image: original_image.to_string(),
            result_image: result_image.to_string(),
            message: "Detection completed".to_string(),
            detections: detections.iter().map(DetectedObject::from).collect(),
        }
    }
}

/// Base URL that stored images are published under
///
/// Order: configured public URL, then `http://<Host header>`, then
/// `http://localhost:<port>`. The result always ends with `/`.
pub fn public_base(
    configured: Option<&Url>,
    headers: &HeaderMap,
    port: u16,
) -> Result<Url, url::ParseError> {
    let from_host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|host| !host.is_empty())
        .and_then(|host| Url::parse(&format!("http://{}/", host)).ok());

    let mut base = match configured.cloned().or(from_host) {
        Some(url) => url,
        None => Url::parse(&format!("http://localhost:{}/", port))?,
    };

    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

/// Absolute URL of `name` inside the `folder` path below `base`
pub fn image_url(base: &Url, folder: &str, name: &str) -> Result<Url, url::ParseError> {
    base.join(&format!("{}/{}", folder, name))
}
