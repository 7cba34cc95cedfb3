// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Value Objects
//!
//! Immutable objects defined by their attributes:
//!
//! - [`ChunkId`]: content-derived chunk identity, equal by hex string alone
//! - [`ChunkMetadata`]: the sidecar record with its dedup-time merge rules
//! - [`HashAlgorithm`], [`ChunkType`]: the closed enumerations on the wire
//! - [`StorageLocation`]: one tier backend of the storage policy
//! - [`FileEntry`]: in-memory source tree node with weak parent links
//! - [`ArchiveManifest`] / [`ManifestEntry`]: the archive output document
//! - Detection types: [`FileTypeDescriptor`], [`MagicPattern`],
//!   [`DetectionResult`]

pub mod chunk_id;
pub mod chunk_metadata;
pub mod chunk_type;
pub mod detection;
pub mod file_entry;
pub mod hash_algorithm;
pub mod manifest;
pub mod storage_location;

pub use chunk_id::ChunkId;
pub use chunk_metadata::{ChunkMetadata, CompressionInfo};
pub use chunk_type::ChunkType;
pub use detection::{
    DetectionResult, DetectionStrategy, FileTypeCategory, FileTypeDescriptor, MagicLiteral, MagicPattern,
};
pub use file_entry::FileEntry;
pub use hash_algorithm::HashAlgorithm;
pub use manifest::{ArchiveManifest, ManifestEntry};
pub use storage_location::{SpeedClass, StorageLocation, VolumeType};
