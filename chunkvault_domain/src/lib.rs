// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ChunkVault Domain
//!
//! The domain layer of the ChunkVault content-addressed archival storage
//! engine. It holds the business rules of the chunk store and is independent
//! of any concrete filesystem, configuration format, or runtime concern
//! beyond the async boundary its ports declare.
//!
//! ## Module Structure
//!
//! - [`value_objects`]: immutable data: chunk identifiers and metadata,
//!   hash algorithms, chunk types, storage locations, manifests, file tree
//!   nodes, and the detection descriptor/result types
//! - [`services`]: stateless domain logic: the organization strategies,
//!   the chunk validator, ISO-8601 serde, and the async store ports
//!   ([`ChunkStore`], [`ChunkRetrieval`], [`ChunkExistence`]) the engine
//!   crate implements
//! - [`error`]: the [`ChunkError`] taxonomy every operation reports through
//!
//! ## Core Invariants
//!
//! The domain enforces the storage contracts end to end:
//!
//! - Within a store, equal identifiers mean byte-identical payloads; a
//!   write that would break this is a corruption error
//! - Organization strategies are bijections: `parse(build(id)) == id` for
//!   every valid identifier
//! - Metadata merging is monotonic: payload facts are first-writer-wins,
//!   source paths are a set union, timestamp ranges only widen
//! - "Not found" is an absent value for lookups, never an error

pub mod error;
pub mod services;
pub mod value_objects;

pub use error::ChunkError;
pub use services::{
    ChunkExistence, ChunkRetrieval, ChunkStore, FlatOrganization, GitStyleOrganization,
    OrganizationStrategy, ValidationConfig, ValidationResult,
};
pub use value_objects::{
    ArchiveManifest, ChunkId, ChunkMetadata, ChunkType, CompressionInfo, DetectionResult,
    DetectionStrategy, FileEntry, FileTypeCategory, FileTypeDescriptor, HashAlgorithm, MagicLiteral,
    MagicPattern, ManifestEntry, SpeedClass, StorageLocation, VolumeType,
};
