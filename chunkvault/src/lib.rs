// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ChunkVault
//!
//! A content-addressed archival storage engine. ChunkVault ingests a
//! directory tree, breaks it into content-identified chunks (one per file or
//! synthetic payload), persists each unique chunk exactly once across a
//! tiered set of storage backends, and records enough metadata to
//! reconstruct the original tree, duplicates, symlinks, and special files
//! included.
//!
//! ## Crate Layout
//!
//! The engine crate implements the ports defined in `chunkvault_domain`:
//!
//! - [`infrastructure::storage`]: filesystem retrieval/existence backends,
//!   the composable single-backend store, the mirrored tiered store, and
//!   the lazy chunk reader
//! - [`infrastructure::cache`]: the bounded LRU file-hash cache
//! - [`infrastructure::registries`] and [`infrastructure::detection`]: the
//!   compression, disk-image, and file-type registries with the detection
//!   engine over them
//! - [`infrastructure::pipeline`]: the stage-based decompression pipeline
//! - [`infrastructure::config`]: the YAML storage policy and its resolution
//!   into tiers
//! - [`application::services`]: archive creation and extraction over all of
//!   the above
//!
//! ## Quick Tour
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chunkvault::application::services::{ArchiveBuilder, ArchiveExtractor};
//! use chunkvault::infrastructure::cache::FileHashCache;
//! use chunkvault::infrastructure::storage::ComposableChunkStore;
//! use chunkvault_domain::{GitStyleOrganization, HashAlgorithm};
//!
//! # async fn demo() -> Result<(), chunkvault_domain::ChunkError> {
//! let store = Arc::new(ComposableChunkStore::filesystem(
//!     "/var/vault",
//!     Arc::new(GitStyleOrganization::new(2)),
//! ));
//! let cache = Arc::new(FileHashCache::new(HashAlgorithm::Sha256, 4096));
//!
//! let outcome = ArchiveBuilder::new(store.clone(), cache)
//!     .archive("/home/me/documents".as_ref())
//!     .await?;
//!
//! ArchiveExtractor::new(store)
//!     .extract(&outcome.manifest, "/tmp/restored".as_ref())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod infrastructure;

pub use application::services::{ArchiveBuilder, ArchiveExtractor};
pub use infrastructure::cache::FileHashCache;
pub use infrastructure::storage::{ChunkReaderBuilder, ComposableChunkStore, MirroredChunkStore};
