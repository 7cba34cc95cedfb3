// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Store Ports
//!
//! Async traits connecting the domain to storage infrastructure. These are
//! infrastructure ports rather than pure domain services: chunk I/O is
//! I/O-bound, so the traits are `async` and implementations suspend at every
//! backend boundary (read, write, existence probe, size probe, sidecar
//! access).
//!
//! Three capabilities compose into a full store:
//!
//! - [`ChunkRetrieval`] performs byte I/O at a backend-relative path
//! - [`ChunkExistence`] answers path-level existence without reading bytes
//! - an organization strategy (see `services::organization`) maps
//!   identifiers to those paths
//!
//! [`ChunkStore`] is the assembled interface the rest of the system talks
//! to: the composable filesystem store implements it directly and the
//! mirrored tiered store implements it over a set of inner stores.
//!
//! ## Contract Notes
//!
//! "Not found" is an absent value (`Ok(None)` / `Ok(false)`), never an
//! error. Writes are at-most-once per identifier from the caller's
//! perspective: a second write under the same identifier either overwrites
//! with byte-identical content or is a no-op, and in both cases the sidecar
//! metadata is merged, not replaced. Partial reads clamp to the available
//! payload range. Callers needing a deadline wrap calls in a timeout at
//! their level; implementations hold no per-chunk locks across a completed
//! operation, so cancellation at any await point releases them.

use async_trait::async_trait;
use std::path::Path;

use crate::value_objects::chunk_id::ChunkId;
use crate::value_objects::chunk_metadata::ChunkMetadata;
use crate::ChunkError;

/// Byte-level I/O at a backend-relative path.
#[async_trait]
pub trait ChunkRetrieval: Send + Sync {
    /// Reads the full payload at `path`; `Ok(None)` when absent.
    async fn read_at(&self, path: &Path) -> Result<Option<Vec<u8>>, ChunkError>;

    /// Reads up to `length` bytes starting at `offset`, clamped to the file
    /// size; `Ok(None)` when absent.
    async fn read_range_at(&self, path: &Path, offset: u64, length: u64)
        -> Result<Option<Vec<u8>>, ChunkError>;

    /// Writes `data` at `path`, creating parent directories, atomically with
    /// respect to concurrent readers.
    async fn write_at(&self, path: &Path, data: &[u8]) -> Result<(), ChunkError>;

    /// Removes the file at `path`; removing an absent file succeeds.
    async fn delete_at(&self, path: &Path) -> Result<(), ChunkError>;

    /// Size of the file at `path`; `Ok(None)` when absent.
    async fn size_at(&self, path: &Path) -> Result<Option<u64>, ChunkError>;
}

/// Path-level existence probe that never reads payload bytes.
#[async_trait]
pub trait ChunkExistence: Send + Sync {
    async fn exists_at(&self, path: &Path) -> Result<bool, ChunkError>;
}

/// The assembled chunk store interface.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Persists `data` under `id`, merging `metadata` into any existing
    /// sidecar. Returns the identifier the payload is stored under.
    async fn write(
        &self,
        data: &[u8],
        id: &ChunkId,
        metadata: Option<ChunkMetadata>,
    ) -> Result<ChunkId, ChunkError>;

    /// Full payload of `id`; `Ok(None)` when the chunk does not exist.
    async fn read(&self, id: &ChunkId) -> Result<Option<Vec<u8>>, ChunkError>;

    /// Partial payload read, clamped to `[0, size)`.
    async fn read_range(
        &self,
        id: &ChunkId,
        offset: u64,
        length: u64,
    ) -> Result<Option<Vec<u8>>, ChunkError>;

    /// Overwrites the payload of an existing chunk. Permitted only when the
    /// new payload still hashes to `id`; anything else is corruption.
    async fn update(
        &self,
        data: &[u8],
        id: &ChunkId,
        metadata: Option<ChunkMetadata>,
    ) -> Result<ChunkId, ChunkError>;

    /// Removes payload and sidecar; a missing sidecar is not an error.
    async fn delete(&self, id: &ChunkId) -> Result<(), ChunkError>;

    async fn exists(&self, id: &ChunkId) -> Result<bool, ChunkError>;

    /// Payload size of `id`; `Ok(None)` when absent.
    async fn size(&self, id: &ChunkId) -> Result<Option<u64>, ChunkError>;

    /// Sidecar metadata of `id`; `Ok(None)` when absent.
    async fn metadata(&self, id: &ChunkId) -> Result<Option<ChunkMetadata>, ChunkError>;
}
