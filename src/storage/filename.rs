// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Filename handling for stored images
//!
//! Upload names come straight from the client, so they are reduced to a
//! conservative character set before touching the filesystem.

use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// Prefix of every annotated result file
pub const RESULT_PREFIX: &str = "result";

/// Reduce a client-supplied filename to something safe to use as a single
/// path component.
///
/// The name is NFKD-normalized and everything non-ASCII dropped, so `ü`
/// becomes `u` and ligatures split into their letters. Path separators become
/// word breaks, words are joined with `_`, anything outside `[A-Za-z0-9_.-]`
/// is removed and leading or trailing dots and underscores are stripped.
///
/// The result may be empty; callers must reject that case.
pub fn sanitize_filename(filename: &str) -> String {
    let ascii: String = filename
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Name of the annotated result for `sanitized` created at `timestamp`
/// (unix seconds)
pub fn result_file_name(timestamp: i64, sanitized: &str) -> String {
    format!("{}_{}_{}", RESULT_PREFIX, timestamp, sanitized)
}

/// `name` with `_<n>` inserted before the extension
///
/// Used when two results for the same filename land in the same second.
pub fn with_suffix(name: &str, n: u32) -> String {
    let path = Path::new(name);
    match (
        path.file_stem().and_then(|s| s.to_str()),
        path.extension().and_then(|e| e.to_str()),
    ) {
        (Some(stem), Some(ext)) => format!("{}_{}.{}", stem, n, ext),
        _ => format!("{}_{}", name, n),
    }
}
