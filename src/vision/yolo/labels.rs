// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Class names for detector output

use anyhow::{Context, Result};
use std::path::Path;

/// Upper bound on class ids accepted from model metadata
const MAX_CLASSES: usize = 4096;

/// Class-id to name lookup
#[derive(Debug, Clone, Default)]
pub struct ClassLabels {
    names: Vec<String>,
}

impl ClassLabels {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Load names from a text file, one per line, blank lines skipped
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read labels file {}", path.display()))?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let names = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { names }
    }

    /// Parse the `names` metadata entry of an Ultralytics export
    ///
    /// The exporter writes a Python dict literal such as
    /// `{0: 'person', 1: 'traffic light'}`. Ids missing from the dict keep
    /// the generic name. Returns `None` when the text is not such a dict.
    pub fn from_model_names(text: &str) -> Option<Self> {
        let body = text.trim().strip_prefix('{')?.strip_suffix('}')?;

        let mut entries = Vec::new();
        let mut rest = body.trim_start();
        while !rest.is_empty() {
            let (key, value) = rest.split_once(':')?;
            let id: usize = key.trim().parse().ok()?;

            let value = value.trim_start();
            let quote = value.chars().next().filter(|c| *c == '\'' || *c == '"')?;
            let value = &value[1..];
            let end = value.find(quote)?;
            entries.push((id, value[..end].to_string()));

            rest = value[end + 1..].trim_start();
            rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
        }

        let count = entries.iter().map(|(id, _)| id + 1).max()?;
        if count > MAX_CLASSES {
            return None;
        }

        let mut names: Vec<String> = (0..count).map(|id| format!("class {}", id)).collect();
        for (id, name) in entries {
            names[id] = name;
        }
        Some(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name for `class_id`, or `class <id>` when unknown
    pub fn name(&self, class_id: usize) -> String {
        self.names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class {}", class_id))
    }
}
