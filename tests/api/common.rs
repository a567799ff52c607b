// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Shared helpers for HTTP tests: a temp app root, stub detectors and a
//! hand-built multipart body.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, Response},
    Router,
};
use clap::Parser;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;
use yolo_detect_server::{
    api::{create_app, AppState},
    config::ServerConfig,
    vision::{Annotator, Detection, Detector, DetectorError, ModelState},
};

pub const BOUNDARY: &str = "----yolo-detect-test-boundary";
pub const LANDING_HTML: &str = "<html><body>detect</body></html>";

/// Returns the same detections for every image
pub struct FixedDetector(pub Vec<Detection>);

impl Detector for FixedDetector {
    fn name(&self) -> &str {
        "fixed"
    }

    fn detect(&self, _image: &DynamicImage) -> Result<Vec<Detection>, DetectorError> {
        Ok(self.0.clone())
    }
}

/// Fails every inference
pub struct FailingDetector;

impl Detector for FailingDetector {
    fn name(&self) -> &str {
        "failing"
    }

    fn detect(&self, _image: &DynamicImage) -> Result<Vec<Detection>, DetectorError> {
        Err(DetectorError::OutputShape("[1, 0, 0]".to_string()))
    }
}

pub fn blast_detection() -> Detection {
    Detection {
        class_id: 0,
        label: "blast".to_string(),
        confidence: 0.91,
        bbox: [8.0, 6.0, 40.0, 30.0],
    }
}

pub fn ready_model() -> ModelState {
    ModelState::ready(Arc::new(FixedDetector(vec![blast_detection()])))
}

pub struct TestApp {
    pub dir: TempDir,
    pub state: Arc<AppState>,
    pub app: Router,
}

impl TestApp {
    pub fn upload_dir(&self) -> PathBuf {
        self.state.store.upload_dir().to_path_buf()
    }

    pub fn result_dir(&self) -> PathBuf {
        self.state.store.result_dir().to_path_buf()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method(Method::GET)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn upload(&self, file_name: &str, bytes: &[u8]) -> Response<Body> {
        self.send(detect_request(&[Part::file("file", file_name, bytes)]))
            .await
    }
}

pub fn config_for(root: &Path) -> ServerConfig {
    ServerConfig::try_parse_from([
        "yolo-detect-server",
        "--app-root",
        root.to_str().unwrap(),
        "--port",
        "5000",
    ])
    .unwrap()
}

/// App rooted in a fresh temp directory with both image folders and a
/// landing page in place
pub async fn setup(model: ModelState) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());

    std::fs::write(config.landing_page(), LANDING_HTML).unwrap();

    let state = Arc::new(AppState::new(&config, model, Annotator::new()));
    state.store.ensure_dirs().await.unwrap();
    let app = create_app(state.clone());

    TestApp { dir, state, app }
}

/// One multipart part
pub struct Part<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub bytes: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn file(name: &'a str, file_name: &'a str, bytes: &'a [u8]) -> Self {
        Self {
            name,
            file_name: Some(file_name),
            bytes,
        }
    }

    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            file_name: None,
            bytes: value.as_bytes(),
        }
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.file_name {
            Some(file_name) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        part.name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn detect_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/detect")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub fn png_bytes(width: u32, height: u32, shade: u8) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([shade, shade, shade]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn cache_control(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::CACHE_CONTROL)
        .map(|v| v.to_str().unwrap().to_string())
}
