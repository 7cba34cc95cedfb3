// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Identifier Value Object
//!
//! This module provides the [`ChunkId`] value object, the identity of a chunk
//! within the store. An identifier is an opaque string that is, by
//! convention, the lowercase hex of a cryptographic content hash of the
//! payload. The store's core invariant hangs off it: within a single store,
//! any two chunks with the same identifier contain byte-identical payloads.
//!
//! An identifier may carry an inline copy of the chunk's metadata as a
//! convenience for call sites that already resolved the sidecar; equality
//! and hashing ignore it, so two identifiers with the same hex string are
//! always the same chunk.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use super::chunk_metadata::ChunkMetadata;
use super::hash_algorithm::HashAlgorithm;
use crate::ChunkError;

/// Returns true iff `s` is non-empty and entirely lowercase hex.
pub fn is_lowercase_hex(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

/// Content-derived identifier of a chunk.
///
/// This is a Value Object: two identifiers are equal iff their hex strings
/// are equal, regardless of any inline metadata either carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkId {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    metadata: Option<Box<ChunkMetadata>>,
}

impl ChunkId {
    /// Creates an identifier from an existing hex string.
    ///
    /// The string is not validated here; validation lives in the chunk
    /// validator so call sites can choose warning-versus-error handling.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: None,
        }
    }

    /// Computes the identifier of `data` under `algorithm`.
    pub fn from_data(data: &[u8], algorithm: HashAlgorithm) -> Self {
        Self::new(algorithm.digest_hex(data))
    }

    /// Attaches an inline metadata record.
    pub fn with_metadata(mut self, metadata: ChunkMetadata) -> Self {
        self.metadata = Some(Box::new(metadata));
        self
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Inline metadata, when the identifier carries one.
    pub fn metadata(&self) -> Option<&ChunkMetadata> {
        self.metadata.as_deref()
    }

    /// True iff the identifier is non-empty lowercase hex.
    pub fn is_valid_hex(&self) -> bool {
        is_lowercase_hex(&self.id)
    }

    /// Guesses the hash algorithm from the identifier length.
    pub fn implied_algorithm(&self) -> Option<HashAlgorithm> {
        HashAlgorithm::from_hex_len(self.id.len())
    }

    /// Validates the identifier as a storable chunk identity.
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.id.is_empty() {
            return Err(ChunkError::InvalidIdentifier("identifier is empty".into()));
        }
        if !self.is_valid_hex() {
            return Err(ChunkError::InvalidIdentifier(format!(
                "identifier '{}' is not lowercase hex",
                self.id
            )));
        }
        Ok(())
    }
}

impl PartialEq for ChunkId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ChunkId {}

impl Hash for ChunkId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl From<&str> for ChunkId {
    fn from(value: &str) -> Self {
        ChunkId::new(value)
    }
}

impl From<String> for ChunkId {
    fn from(value: String) -> Self {
        ChunkId::new(value)
    }
}
