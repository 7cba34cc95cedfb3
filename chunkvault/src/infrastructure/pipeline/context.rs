// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Context
//!
//! The shared, mutable state a compression pipeline run threads through its
//! stages: the current input path, a typed side-channel map of stage
//! outputs, and an accumulated error list. Stages communicate exclusively
//! through the side channel, under the key constants in [`keys`].
//!
//! Scratch files created through the context are owned by it, so every exit
//! path, including errors and cancellation, cleans them up when the context
//! drops.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use chunkvault_domain::ChunkError;

/// Side-channel keys used by the built-in stages.
pub mod keys {
    /// Format of the outer compression layer, e.g. `"gzip"`.
    pub const COMPRESSION_FORMAT: &str = "compression_format";
    /// Scratch location of the decompressed artifact.
    pub const DECOMPRESSED_URL: &str = "decompressed_url";
    /// Format found inside the decompressed artifact, e.g. `"tar"`.
    pub const NESTED_COMPRESSION_FORMAT: &str = "nested_compression_format";
    /// Scratch location after the nested layer was rehydrated.
    pub const FINAL_DECOMPRESSED_URL: &str = "final_decompressed_url";
    /// Set when the nested stage actually processed a nested layer.
    pub const NESTED_COMPRESSION_PROCESSED: &str = "nested_compression_processed";
}

/// A typed value in the pipeline side channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Text(String),
    Path(PathBuf),
    Flag(bool),
}

/// Shared state of one pipeline run.
pub struct PipelineContext {
    input_path: PathBuf,
    values: HashMap<String, ContextValue>,
    errors: Vec<ChunkError>,
    scratch: Vec<NamedTempFile>,
}

impl PipelineContext {
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            values: HashMap::new(),
            errors: Vec::new(),
            scratch: Vec::new(),
        }
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn set_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), ContextValue::Text(value.into()));
    }

    pub fn set_path(&mut self, key: impl Into<String>, value: impl Into<PathBuf>) {
        self.values.insert(key.into(), ContextValue::Path(value.into()));
    }

    pub fn set_flag(&mut self, key: impl Into<String>, value: bool) {
        self.values.insert(key.into(), ContextValue::Flag(value));
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(ContextValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    pub fn path(&self, key: &str) -> Option<&Path> {
        match self.values.get(key) {
            Some(ContextValue::Path(value)) => Some(value),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(ContextValue::Flag(true)))
    }

    pub fn value(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    /// Appends a stage error without aborting the run.
    pub fn record_error(&mut self, error: ChunkError) {
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[ChunkError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Creates a scratch file owned by this context and returns its path.
    ///
    /// The file lives until the context drops, covering success, error, and
    /// cancellation exits alike.
    pub fn new_scratch_path(&mut self) -> Result<PathBuf, ChunkError> {
        let file = NamedTempFile::new()
            .map_err(|e| ChunkError::WriteFailed(format!("creating scratch file: {}", e)))?;
        let path = file.path().to_path_buf();
        self.scratch.push(file);
        Ok(path)
    }

    /// Number of live scratch files.
    pub fn scratch_count(&self) -> usize {
        self.scratch.len()
    }
}
