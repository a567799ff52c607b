// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection endpoint handler

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use axum_extra::extract::multipart::{Multipart, MultipartRejection};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::pipeline::run_detection;
use super::response::{image_url, public_base, DetectResponse, RESULTS_PATH, UPLOADS_PATH};
use crate::api::errors::{ApiError, ApiErrorResponse};
use crate::api::http_server::AppState;
use crate::storage::sanitize_filename;

/// Multipart field carrying the image
pub const FILE_FIELD: &str = "file";

/// A file part taken from the form
#[derive(Debug)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

/// POST /detect - Run object detection on an uploaded image
///
/// Accepts `multipart/form-data` with a single file field named `file`.
/// The upload is stored under its sanitized name, the detector runs on the
/// stored copy and the annotated image is written to the result folder.
///
/// # Response
/// - `status`: "success"
/// - `original_image`: URL of the stored upload
/// - `result_image`: URL of the annotated image
/// - `message`: "Detection completed"
/// - `detections`: detected objects with label, confidence and box
///
/// # Errors
/// - 400 Bad Request: no `file` part, empty or unusable filename, malformed body
/// - 500 Internal Server Error: model not loaded, storage, inference or encoding failure
pub async fn detect_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DetectResponse>, ApiErrorResponse> {
    let request_id = Uuid::new_v4().to_string();
    debug!("[{}] Detect request received", request_id);

    match detect(&state, &headers, multipart, &request_id).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => Err(e.respond(&request_id)),
    }
}

async fn detect(
    state: &AppState,
    headers: &HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
    request_id: &str,
) -> Result<DetectResponse, ApiError> {
    // 1. Model must be loaded; nothing is read or written otherwise
    let detector = state.model.detector().ok_or(ApiError::ModelUnavailable)?;

    // 2. Pull the file part out of the form
    let mut multipart = multipart.map_err(|e| ApiError::InvalidMultipart(e.to_string()))?;
    let upload = read_upload(&mut multipart).await?;

    // 3. Validate the filename
    if upload.file_name.is_empty() {
        return Err(ApiError::EmptyFilename);
    }
    let sanitized = sanitize_filename(&upload.file_name);
    if sanitized.is_empty() {
        return Err(ApiError::InvalidFilename(upload.file_name));
    }

    // 4. Store the upload
    let upload_path = state.store.save_upload(&sanitized, &upload.bytes).await?;

    // 5. Inference, annotation and encoding off the async runtime
    let timestamp = chrono::Utc::now().timestamp();
    let store = state.store.clone();
    let annotator = state.annotator.clone();
    let task_name = sanitized.clone();
    let output = tokio::task::spawn_blocking(move || {
        run_detection(
            detector.as_ref(),
            &annotator,
            &store,
            &upload_path,
            &task_name,
            timestamp,
        )
    })
    .await
    .map_err(|e| ApiError::Inference(format!("detection task failed: {}", e)))??;

    // 6. Public URLs for both files
    let base = public_base(state.public_base_url.as_ref(), headers, state.port)
        .map_err(|e| ApiError::Storage(format!("invalid public base URL: {}", e)))?;
    let original_url = image_url(&base, UPLOADS_PATH, &sanitized)
        .map_err(|e| ApiError::Storage(format!("invalid upload URL: {}", e)))?;
    let result_url = image_url(&base, RESULTS_PATH, &output.result_name)
        .map_err(|e| ApiError::Storage(format!("invalid result URL: {}", e)))?;

    info!(
        "[{}] Detection completed: {} -> {} ({} objects, {}x{})",
        request_id,
        sanitized,
        output.result_name,
        output.detections.len(),
        output.width,
        output.height
    );

    Ok(DetectResponse::new(
        original_url,
        result_url,
        &output.detections,
    ))
}

/// First part named `file` that carries a filename
///
/// A `file` part sent as a plain form value (no filename) does not count as
/// a file.
async fn read_upload(multipart: &mut Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidMultipart(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidMultipart(e.to_string()))?;

        debug!("Received upload {:?} ({} bytes)", file_name, bytes.len());
        return Ok(Upload { file_name, bytes });
    }

    Err(ApiError::MissingFile)
}
