// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, warn};

use crate::storage::StorageError;
use crate::vision::{DetectorError, ImageError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
    pub request_id: String,
}

/// Failures of the detection endpoint
///
/// Server-side variants carry internal detail for logs only; the client sees
/// the fixed message of the category.
#[derive(Debug, Clone)]
pub enum ApiError {
    MissingFile,
    EmptyFilename,
    InvalidFilename(String),
    InvalidMultipart(String),
    ModelUnavailable,
    Storage(String),
    Inference(String),
    Encode(String),
}

impl ApiError {
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::MissingFile => "missing_file",
            ApiError::EmptyFilename => "empty_filename",
            ApiError::InvalidFilename(_) => "invalid_filename",
            ApiError::InvalidMultipart(_) => "invalid_multipart",
            ApiError::ModelUnavailable => "model_unavailable",
            ApiError::Storage(_) => "storage_error",
            ApiError::Inference(_) => "inference_error",
            ApiError::Encode(_) => "encode_error",
        }
    }

    /// Message returned to the client
    pub fn public_message(&self) -> &'static str {
        match self {
            ApiError::MissingFile => "No file part",
            ApiError::EmptyFilename => "No selected file",
            ApiError::InvalidFilename(_) => "Invalid filename",
            ApiError::InvalidMultipart(_) => "Invalid multipart body",
            ApiError::ModelUnavailable => "Model not loaded",
            ApiError::Storage(_) => "Failed to store image",
            ApiError::Inference(_) => "Detection failed",
            ApiError::Encode(_) => "Failed to write result image",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::MissingFile
            | ApiError::EmptyFilename
            | ApiError::InvalidFilename(_)
            | ApiError::InvalidMultipart(_) => 400,
            ApiError::ModelUnavailable
            | ApiError::Storage(_)
            | ApiError::Inference(_)
            | ApiError::Encode(_) => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    pub fn to_response(&self, request_id: &str) -> ErrorResponse {
        ErrorResponse {
            error: self.public_message().to_string(),
            error_type: self.error_type().to_string(),
            request_id: request_id.to_string(),
        }
    }

    /// Log with the request id and wrap for sending
    pub fn respond(self, request_id: &str) -> ApiErrorResponse {
        if self.is_client_error() {
            warn!("[{}] Rejected detect request: {}", request_id, self);
        } else {
            error!("[{}] Detect request failed: {}", request_id, self);
        }
        ApiErrorResponse {
            error: self,
            request_id: request_id.to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MissingFile => write!(f, "No file part"),
            ApiError::EmptyFilename => write!(f, "No selected file"),
            ApiError::InvalidFilename(name) => write!(f, "Invalid filename: {:?}", name),
            ApiError::InvalidMultipart(msg) => write!(f, "Invalid multipart body: {}", msg),
            ApiError::ModelUnavailable => write!(f, "Model not loaded"),
            ApiError::Storage(msg) => write!(f, "Storage error: {}", msg),
            ApiError::Inference(msg) => write!(f, "Inference error: {}", msg),
            ApiError::Encode(msg) => write!(f, "Encode error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::Storage(e.to_string())
    }
}

impl From<DetectorError> for ApiError {
    fn from(e: DetectorError) -> Self {
        ApiError::Inference(e.to_string())
    }
}

impl From<ImageError> for ApiError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::EncodeFailed(_) => ApiError::Encode(e.to_string()),
            _ => ApiError::Inference(e.to_string()),
        }
    }
}

// Error response wrapper
#[derive(Debug)]
pub struct ApiErrorResponse {
    pub error: ApiError,
    pub request_id: String,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = self.error.to_response(&self.request_id);

        (status, Json(body)).into_response()
    }
}
