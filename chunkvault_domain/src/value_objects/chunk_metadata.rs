// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Metadata Value Object
//!
//! This module provides the [`ChunkMetadata`] record persisted in the `.meta`
//! sidecar next to every chunk payload, together with the merge algorithm
//! applied when a deduplicated write finds an existing sidecar for the same
//! identifier.
//!
//! ## Merge Semantics
//!
//! When two records for the same chunk meet, the merge keeps the facts that
//! are properties of the payload (size, hash, algorithm, chunk type) from the
//! first writer, and accumulates the facts that are properties of the
//! sources:
//!
//! - `size`, `content_hash`, `hash_algorithm`, `chunk_type`: first writer
//!   wins
//! - `original_paths`: set union
//! - `original_filename`, `content_type`, `compression`: existing kept when
//!   present, otherwise taken from the incoming record
//! - `created`: earliest of the two
//! - `modified`: latest of the two
//!
//! The merge is idempotent, and commutative and associative in
//! `original_paths`, which makes dedup-time merging safe regardless of the
//! order concurrent writers land in.
//!
//! ## Wire Format
//!
//! Sidecars are UTF-8 JSON with lower camelCase field names and ISO-8601
//! timestamps, e.g.:
//!
//! ```json
//! {
//!   "size": 6,
//!   "contentHash": "5891b5b5…",
//!   "hashAlgorithm": "sha256",
//!   "chunkType": "file",
//!   "originalPaths": ["a/x.txt", "b/x.txt"]
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::chunk_type::ChunkType;
use super::hash_algorithm::HashAlgorithm;
use crate::services::datetime_serde;
use crate::ChunkError;

/// Compression facts recorded for chunks whose payload was rehydrated from a
/// compressed source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionInfo {
    /// Compression algorithm of the original source, e.g. `"gzip"`.
    pub algorithm: String,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
}

/// Sidecar metadata record, one per unique chunk.
///
/// This is a Value Object with one deliberate twist: the record on disk is
/// mutable but monotonic. Writes never lose information, they only merge
/// more of it in (see the module docs for the rules).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    /// Payload size in bytes.
    pub size: u64,

    /// Hex digest of the payload; equals the identifier when verification is
    /// enabled.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub content_hash: Option<String>,

    pub hash_algorithm: HashAlgorithm,

    /// IANA-style media type, when detection produced one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub content_type: Option<String>,

    pub chunk_type: ChunkType,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub original_filename: Option<String>,

    /// Every source path that mapped to this chunk. A set: re-archiving the
    /// same path twice does not duplicate it.
    #[serde(skip_serializing_if = "BTreeSet::is_empty", default)]
    pub original_paths: BTreeSet<String>,

    #[serde(
        with = "datetime_serde::optional",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub created: Option<DateTime<Utc>>,

    #[serde(
        with = "datetime_serde::optional",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub modified: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub compression: Option<CompressionInfo>,
}

impl ChunkMetadata {
    /// Creates a minimal record for a payload of `size` bytes.
    pub fn new(size: u64, hash_algorithm: HashAlgorithm, chunk_type: ChunkType) -> Self {
        Self {
            size,
            content_hash: None,
            hash_algorithm,
            content_type: None,
            chunk_type,
            original_filename: None,
            original_paths: BTreeSet::new(),
            created: None,
            modified: None,
            compression: None,
        }
    }

    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = Some(hash.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_original_filename(mut self, name: impl Into<String>) -> Self {
        self.original_filename = Some(name.into());
        self
    }

    pub fn with_original_path(mut self, path: impl Into<String>) -> Self {
        self.original_paths.insert(path.into());
        self
    }

    pub fn with_timestamps(mut self, created: Option<DateTime<Utc>>, modified: Option<DateTime<Utc>>) -> Self {
        self.created = created;
        self.modified = modified;
        self
    }

    pub fn with_compression(mut self, compression: CompressionInfo) -> Self {
        self.compression = Some(compression);
        self
    }

    /// Merges an incoming record for the same chunk into this one.
    ///
    /// `self` is the existing (first-writer) record; payload facts stay as
    /// they are and source facts accumulate. See the module docs for the
    /// exact rules.
    pub fn merge(&mut self, incoming: &ChunkMetadata) {
        // size, content_hash, hash_algorithm, chunk_type: first writer wins.
        self.original_paths
            .extend(incoming.original_paths.iter().cloned());

        if self.original_filename.is_none() {
            self.original_filename = incoming.original_filename.clone();
        }
        if self.content_type.is_none() {
            self.content_type = incoming.content_type.clone();
        }
        if self.compression.is_none() {
            self.compression = incoming.compression.clone();
        }

        self.created = match (self.created, incoming.created) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.modified = match (self.modified, incoming.modified) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    /// Checks internal consistency of the record.
    ///
    /// Collects every problem rather than stopping at the first, so callers
    /// can report all of them at once.
    pub fn validate(&self) -> Result<(), ChunkError> {
        let mut problems = Vec::new();

        if let Some(hash) = &self.content_hash {
            if !super::chunk_id::is_lowercase_hex(hash) {
                problems.push(format!("contentHash '{}' is not lowercase hex", hash));
            } else if hash.len() != self.hash_algorithm.hex_len() {
                problems.push(format!(
                    "contentHash length {} does not match {} digest length {}",
                    hash.len(),
                    self.hash_algorithm,
                    self.hash_algorithm.hex_len()
                ));
            }
        }

        if self.size == 0 && !self.chunk_type.allows_empty_payload() {
            problems.push(format!("size is 0 but chunk type is {}", self.chunk_type));
        }

        if let (Some(created), Some(modified)) = (self.created, self.modified) {
            if modified < created {
                problems.push("modified precedes created".into());
            }
        }

        if let Some(compression) = &self.compression {
            if compression.algorithm.is_empty() {
                problems.push("compression algorithm is empty".into());
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ChunkError::MetadataValidationFailed(problems))
        }
    }
}
