// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! On-disk storage for uploaded and annotated images
//!
//! Two flat directories, no index and no retention: uploads are keyed by
//! their sanitized filename (a repeat upload overwrites), results by
//! `result_<unix-seconds>_<name>`.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use super::filename::{result_file_name, with_suffix};

/// Attempts at finding a free result name within one second
const MAX_RESULT_NAME_ATTEMPTS: u32 = 1000;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no free result name for {0}")]
    NameExhausted(String),
}

/// A result file reserved for writing
#[derive(Debug)]
pub struct ResultFile {
    /// Filename inside the result directory
    pub name: String,
    /// Full path
    pub path: PathBuf,
    /// Freshly created, empty file
    pub file: File,
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    upload_dir: PathBuf,
    result_dir: PathBuf,
}

impl ImageStore {
    pub fn new(upload_dir: impl Into<PathBuf>, result_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            result_dir: result_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn result_dir(&self) -> &Path {
        &self.result_dir
    }

    /// Create both directories if they are missing
    pub async fn ensure_dirs(&self) -> Result<(), StorageError> {
        for dir in [&self.upload_dir, &self.result_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| StorageError::CreateDir {
                    path: dir.clone(),
                    source,
                })?;
        }
        info!(
            "Image directories ready: uploads={}, results={}",
            self.upload_dir.display(),
            self.result_dir.display()
        );
        Ok(())
    }

    /// Write an upload under its sanitized name, replacing any previous file
    pub async fn save_upload(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.upload_dir.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| StorageError::Write {
                path: path.clone(),
                source,
            })?;
        info!("Saved uploaded file to: {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Exclusively create the result file for `sanitized` at `timestamp`
    ///
    /// If a result with the same name already exists (same filename within the
    /// same second) a numeric suffix is appended until creation succeeds.
    /// Blocking; call from a blocking context.
    pub fn create_result_file(
        &self,
        timestamp: i64,
        sanitized: &str,
    ) -> Result<ResultFile, StorageError> {
        let base = result_file_name(timestamp, sanitized);

        for attempt in 0..MAX_RESULT_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                base.clone()
            } else {
                with_suffix(&base, attempt)
            };
            let path = self.result_dir.join(&name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    if attempt > 0 {
                        debug!("Result name {} taken, using {}", base, name);
                    }
                    return Ok(ResultFile { name, path, file });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(StorageError::Write { path, source }),
            }
        }

        Err(StorageError::NameExhausted(base))
    }
}
