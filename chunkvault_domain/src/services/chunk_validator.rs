// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Validator
//!
//! Pure validation functions applied around store operations. Nothing here
//! performs I/O; callers pass the identifier, payload, and metadata they
//! already hold and receive a [`ValidationResult`] listing every error and
//! warning found.
//!
//! ## Rule Summary
//!
//! Identifier checks: an empty identifier or one that is not lowercase hex
//! is an error; a hex length outside the canonical set for the algorithm is
//! only a warning (truncated digests appear in older manifests); an
//! algorithm outside the configured allow-set is an error.
//!
//! Write checks add the size bounds and, when `verify_hash` is on, a digest
//! recomputation that must equal the identifier. Read checks recompute the
//! digest too, and a mismatch emits both a `HashMismatch` and a
//! `CorruptedData` error since a failed read-side check means the bytes on
//! disk no longer match what was written.
//!
//! Hash verification is skippable; with `verify_hash` off, mismatch
//! conditions are simply not reported.

use std::collections::BTreeSet;

use crate::value_objects::chunk_id::ChunkId;
use crate::value_objects::chunk_metadata::ChunkMetadata;
use crate::value_objects::hash_algorithm::HashAlgorithm;
use crate::ChunkError;

/// Tunable validation parameters.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Recompute and compare content hashes on write and read.
    pub verify_hash: bool,
    /// Inclusive payload size bounds in bytes.
    pub min_size: u64,
    pub max_size: u64,
    /// Hash algorithms the store accepts.
    pub allowed_hash_algorithms: BTreeSet<HashAlgorithm>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            verify_hash: true,
            min_size: 0,
            max_size: u64::MAX,
            allowed_hash_algorithms: HashAlgorithm::ALL.into_iter().collect(),
        }
    }
}

impl ValidationConfig {
    /// A config with verification disabled, for trusted bulk imports.
    pub fn permissive() -> Self {
        Self {
            verify_hash: false,
            ..Self::default()
        }
    }
}

/// Outcome of a validation pass: all errors and warnings found.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ChunkError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, error: ChunkError) {
        self.errors.push(error);
    }

    fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// The first error, for callers that surface a single failure.
    pub fn into_error(mut self) -> Option<ChunkError> {
        if self.errors.is_empty() {
            None
        } else {
            Some(self.errors.remove(0))
        }
    }

    /// True iff a hash mismatch was recorded.
    pub fn has_hash_mismatch(&self) -> bool {
        self.errors
            .iter()
            .any(|e| matches!(e, ChunkError::HashMismatch { .. }))
    }
}

/// The algorithm used for digest recomputation: the metadata's when present,
/// otherwise implied from the identifier length, otherwise SHA-256.
fn effective_algorithm(id: &ChunkId, metadata: Option<&ChunkMetadata>) -> HashAlgorithm {
    metadata
        .map(|m| m.hash_algorithm)
        .or_else(|| id.implied_algorithm())
        .unwrap_or_default()
}

/// Validates an identifier on its own.
pub fn validate_identifier(
    id: &ChunkId,
    metadata: Option<&ChunkMetadata>,
    config: &ValidationConfig,
) -> ValidationResult {
    let mut result = ValidationResult::default();

    if id.as_str().is_empty() {
        result.error(ChunkError::InvalidIdentifier("identifier is empty".into()));
        return result;
    }
    if !id.is_valid_hex() {
        result.error(ChunkError::InvalidIdentifier(format!(
            "identifier '{}' is not lowercase hex",
            id
        )));
        return result;
    }

    match metadata {
        Some(meta) => {
            if !config.allowed_hash_algorithms.contains(&meta.hash_algorithm) {
                result.error(ChunkError::InvalidHashAlgorithm(format!(
                    "algorithm {} is not allowed by this store",
                    meta.hash_algorithm
                )));
            }
            if id.as_str().len() != meta.hash_algorithm.hex_len() {
                result.warn(format!(
                    "identifier length {} is not canonical for {} ({})",
                    id.as_str().len(),
                    meta.hash_algorithm,
                    meta.hash_algorithm.hex_len()
                ));
            }
        }
        None => {
            if id.implied_algorithm().is_none() {
                result.warn(format!(
                    "identifier length {} matches no known digest length",
                    id.as_str().len()
                ));
            }
        }
    }

    result
}

/// Validates a pending write of `data` under `id`.
pub fn validate_write(
    id: &ChunkId,
    data: &[u8],
    metadata: Option<&ChunkMetadata>,
    config: &ValidationConfig,
) -> ValidationResult {
    let mut result = validate_identifier(id, metadata, config);
    if !result.is_valid() {
        return result;
    }

    let size = data.len() as u64;
    if size < config.min_size || size > config.max_size {
        result.error(ChunkError::InvalidDataSize(format!(
            "payload size {} outside [{}, {}]",
            size, config.min_size, config.max_size
        )));
    }

    if config.verify_hash {
        let algorithm = effective_algorithm(id, metadata);
        let actual = algorithm.digest_hex(data);
        if actual != id.as_str() {
            result.error(ChunkError::HashMismatch {
                id: id.as_str().to_string(),
                expected: id.as_str().to_string(),
                actual,
            });
        }
    }

    if let Some(meta) = metadata {
        if meta.size != size {
            result.warn(format!(
                "metadata size {} does not match payload size {}",
                meta.size, size
            ));
        }
    }

    result
}

/// Validates bytes read back for `id`.
pub fn validate_read(
    id: &ChunkId,
    data: &[u8],
    metadata: Option<&ChunkMetadata>,
    config: &ValidationConfig,
) -> ValidationResult {
    let mut result = validate_identifier(id, metadata, config);
    if !result.is_valid() {
        return result;
    }

    if config.verify_hash {
        let algorithm = effective_algorithm(id, metadata);
        let actual = algorithm.digest_hex(data);
        if actual != id.as_str() {
            result.error(ChunkError::HashMismatch {
                id: id.as_str().to_string(),
                expected: id.as_str().to_string(),
                actual,
            });
            result.error(ChunkError::CorruptedData(format!(
                "payload of chunk {} no longer matches its identifier",
                id
            )));
        }
    }

    if let Some(meta) = metadata {
        if meta.size != data.len() as u64 {
            result.warn(format!(
                "metadata size {} does not match payload size {}",
                meta.size,
                data.len()
            ));
        }
    }

    result
}
