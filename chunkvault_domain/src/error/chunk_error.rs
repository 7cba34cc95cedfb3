// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! This module provides the error system for the chunk storage domain. Every
//! failure mode in the engine maps to one variant of [`ChunkError`], grouped
//! into the categories the storage contracts care about:
//!
//! - **Identifier/path errors**: invalid identifiers, invalid storage paths,
//!   path generation failures
//! - **Retrieval errors**: read, write, and delete failures, insufficient
//!   space (note that "chunk not found" is an absent value for lookups, not
//!   an error; the `ChunkNotFound` variant exists for operations that require
//!   the chunk to be present)
//! - **Integrity errors**: hash mismatches, corrupted data, invalid metadata
//! - **Concurrency errors**: concurrent modification, lock timeouts
//! - **Validation errors**: invalid data size, invalid hash algorithm,
//!   metadata validation failures
//! - **Resource errors**: storage unavailable, quota exceeded, permission
//!   denied
//!
//! Each error carries a human-readable message; `category()` provides the
//! machine-readable kind and `Custom` carries an optional underlying cause
//! chain.
//!
//! ## Error Handling Strategy
//!
//! Mirror and glacier tier failures are logged and swallowed by the mirrored
//! store, so most call sites only ever see primary-tier errors. Hash
//! mismatches are always fatal to the containing operation. Recoverable
//! errors (I/O, timeouts, unavailable storage) can be retried by the caller.

use thiserror::Error;

/// Domain-specific errors for the chunk storage system.
///
/// Each variant represents a specific failure mode and includes a descriptive
/// message. Variants that refer to a specific chunk embed the offending
/// identifier in the message; `HashMismatch` keeps the identifier and both
/// digests as structured fields since callers branch on them.
#[derive(Error, Debug, Clone)]
pub enum ChunkError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid storage path: {0}")]
    InvalidStoragePath(String),

    #[error("Path generation failed: {0}")]
    PathGeneration(String),

    #[error("Chunk not found: {0}")]
    ChunkNotFound(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Insufficient space: {0}")]
    InsufficientSpace(String),

    #[error("Hash mismatch for chunk {id}: expected {expected}, actual {actual}")]
    HashMismatch {
        id: String,
        expected: String,
        actual: String,
    },

    #[error("Corrupted data: {0}")]
    CorruptedData(String),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    #[error("Lock timeout: {0}")]
    LockTimeout(String),

    #[error("Invalid data size: {0}")]
    InvalidDataSize(String),

    #[error("Invalid hash algorithm: {0}")]
    InvalidHashAlgorithm(String),

    #[error("Metadata validation failed: {}", .0.join("; "))]
    MetadataValidationFailed(Vec<String>),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Compression error: {0}")]
    CompressionError(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Handle closed: {0}")]
    HandleClosed(String),

    #[error("{message}")]
    Custom {
        message: String,
        #[source]
        source: Option<Box<ChunkError>>,
    },
}

impl ChunkError {
    /// Creates a new invalid-identifier error
    pub fn invalid_identifier(msg: impl Into<String>) -> Self {
        Self::InvalidIdentifier(msg.into())
    }

    /// Creates a new read-failure error
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// Creates a new write-failure error
    pub fn write_failed(msg: impl Into<String>) -> Self {
        Self::WriteFailed(msg.into())
    }

    /// Creates a new corrupted-data error
    pub fn corrupted_data(msg: impl Into<String>) -> Self {
        Self::CorruptedData(msg.into())
    }

    /// Creates a new invalid-configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates a custom error wrapping an underlying cause
    pub fn custom(msg: impl Into<String>, source: Option<ChunkError>) -> Self {
        Self::Custom {
            message: msg.into(),
            source: source.map(Box::new),
        }
    }

    /// Checks if the error indicates a transient condition worth retrying
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ChunkError::ReadFailed(_)
                | ChunkError::WriteFailed(_)
                | ChunkError::LockTimeout(_)
                | ChunkError::StorageUnavailable(_)
        )
    }

    /// Checks if the error indicates a data integrity violation
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            ChunkError::HashMismatch { .. } | ChunkError::CorruptedData(_) | ChunkError::InvalidMetadata(_)
        )
    }

    /// Gets the error category
    pub fn category(&self) -> &'static str {
        match self {
            ChunkError::InvalidIdentifier(_) => "identifier",
            ChunkError::InvalidStoragePath(_) => "identifier",
            ChunkError::PathGeneration(_) => "identifier",
            ChunkError::ChunkNotFound(_) => "retrieval",
            ChunkError::ReadFailed(_) => "retrieval",
            ChunkError::WriteFailed(_) => "retrieval",
            ChunkError::DeleteFailed(_) => "retrieval",
            ChunkError::InsufficientSpace(_) => "retrieval",
            ChunkError::HashMismatch { .. } => "integrity",
            ChunkError::CorruptedData(_) => "integrity",
            ChunkError::InvalidMetadata(_) => "integrity",
            ChunkError::ConcurrentModification(_) => "concurrency",
            ChunkError::LockTimeout(_) => "concurrency",
            ChunkError::InvalidDataSize(_) => "validation",
            ChunkError::InvalidHashAlgorithm(_) => "validation",
            ChunkError::MetadataValidationFailed(_) => "validation",
            ChunkError::StorageUnavailable(_) => "resource",
            ChunkError::QuotaExceeded(_) => "resource",
            ChunkError::PermissionDenied(_) => "resource",
            ChunkError::InvalidConfiguration(_) => "configuration",
            ChunkError::CompressionError(_) => "compression",
            ChunkError::Cancelled(_) => "cancellation",
            ChunkError::HandleClosed(_) => "resource",
            ChunkError::Custom { .. } => "custom",
        }
    }
}

// Implement conversion from standard library errors
impl From<std::io::Error> for ChunkError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => ChunkError::PermissionDenied(err.to_string()),
            std::io::ErrorKind::StorageFull => ChunkError::InsufficientSpace(err.to_string()),
            _ => ChunkError::ReadFailed(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ChunkError {
    fn from(err: serde_json::Error) -> Self {
        ChunkError::InvalidMetadata(err.to_string())
    }
}
