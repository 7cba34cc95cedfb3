// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Storage backends and the assembled chunk stores.

pub mod chunk_reader;
pub mod composable_store;
pub mod filesystem;
pub mod mirrored_store;

pub use chunk_reader::{CachePattern, ChunkReader, ChunkReaderBuilder};
pub use composable_store::{sidecar_path, ComposableChunkStore};
pub use filesystem::{FilesystemExistence, FilesystemRetrieval};
pub use mirrored_store::{MirroredChunkStore, TierBackend, TierWriteReport};
