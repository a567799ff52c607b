// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod filename;
pub mod image_store;

pub use filename::{result_file_name, sanitize_filename, RESULT_PREFIX};
pub use image_store::{ImageStore, ResultFile, StorageError};
