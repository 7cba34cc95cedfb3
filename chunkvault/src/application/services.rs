// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Application services.

pub mod archive_builder;
pub mod archive_extractor;
pub mod directory_walker;

pub use archive_builder::{
    load_manifest, save_manifest, ArchiveBuilder, ArchiveOptions, ArchiveOutcome, ArchiveStats,
    IgnoreMatcher,
};
pub use archive_extractor::{ArchiveExtractor, ExtractStats};
pub use directory_walker::{DirectoryWalker, WalkDelegate, WalkOptions, WalkedEntry, WalkedEntryKind};
