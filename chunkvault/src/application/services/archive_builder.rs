// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Archive Builder
//!
//! The archive-creation pipeline: walk a source tree, classify each entry,
//! and persist one chunk per payload-bearing entry into a chunk store,
//! producing the manifest that extraction replays later.
//!
//! Per regular file: the file-type detection engine decides the content
//! type and chunk type, the file-hash cache answers or computes the content
//! hash, the chunk lands in the store (deduplicated writes merge their
//! sidecar metadata), and a manifest entry records the path, chunk
//! identifier, and filesystem attributes. Symlinks and directories become
//! manifest entries without payloads; special files, when embedded, become
//! empty chunks of type `special`.
//!
//! With `rehydrate_compressed` enabled, files classified as archives whose
//! format a compression adapter claims are stored decompressed, with the
//! compression facts recorded in the chunk metadata.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use chunkvault_domain::{
    ArchiveManifest, ChunkError, ChunkId, ChunkMetadata, ChunkStore, ChunkType, CompressionInfo,
    HashAlgorithm, ManifestEntry,
};

use super::directory_walker::{DirectoryWalker, WalkDelegate, WalkOptions, WalkedEntry, WalkedEntryKind};
use crate::infrastructure::cache::file_hash_cache::FileHashCache;
use crate::infrastructure::detection::engine::DetectionEngine;
use crate::infrastructure::registries::compression_registry::CompressionAdapterRegistry;

/// Predicate dropping entries from the archive; true means ignore.
pub type IgnoreMatcher = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// Archive-creation options.
#[derive(Clone)]
pub struct ArchiveOptions {
    pub walk: WalkOptions,
    pub hash_algorithm: HashAlgorithm,
    /// Store adapter-claimed archive files decompressed, recording the
    /// compression facts in the chunk metadata.
    pub rehydrate_compressed: bool,
    pub ignore: Option<IgnoreMatcher>,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            walk: WalkOptions::default(),
            hash_algorithm: HashAlgorithm::Sha256,
            rehydrate_compressed: false,
            ignore: None,
        }
    }
}

/// Counters reported by an archive run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    /// Regular files archived (payload-bearing entries).
    pub file_count: u64,
    /// Sum of raw bytes seen across archived files.
    pub total_size: u64,
    /// Manifest entries by type.
    pub per_type: BTreeMap<ChunkType, u64>,
}

/// Result of an archive run.
pub struct ArchiveOutcome {
    pub manifest: ArchiveManifest,
    pub stats: ArchiveStats,
    /// Non-fatal problems encountered along the way.
    pub warnings: Vec<String>,
}

/// Builds archives from directory trees into a chunk store.
pub struct ArchiveBuilder {
    store: Arc<dyn ChunkStore>,
    cache: Arc<FileHashCache>,
    options: ArchiveOptions,
}

impl ArchiveBuilder {
    pub fn new(store: Arc<dyn ChunkStore>, cache: Arc<FileHashCache>) -> Self {
        Self {
            store,
            cache,
            options: ArchiveOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ArchiveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ArchiveOptions {
        &self.options
    }

    /// Archives the tree under `source_root`.
    pub async fn archive(&self, source_root: &Path) -> Result<ArchiveOutcome, ChunkError> {
        let walker = DirectoryWalker::new(self.options.walk.clone());
        let mut delegate = BuilderDelegate {
            builder: self,
            manifest: ArchiveManifest::new(),
            stats: ArchiveStats::default(),
            warnings: Vec::new(),
        };
        walker.walk(source_root, &mut delegate).await?;

        debug!(
            files = delegate.stats.file_count,
            bytes = delegate.stats.total_size,
            entries = delegate.manifest.len(),
            "archive walk complete"
        );
        Ok(ArchiveOutcome {
            manifest: delegate.manifest,
            stats: delegate.stats,
            warnings: delegate.warnings,
        })
    }

    fn manifest_entry_base(entry: &WalkedEntry, entry_type: ChunkType) -> ManifestEntry {
        let mut manifest_entry = ManifestEntry::new(
            entry.relative_path.to_string_lossy().into_owned(),
            entry_type,
        );
        if let Some(mode) = entry.permissions {
            manifest_entry = manifest_entry.with_permissions(mode);
        }
        if let (Some(owner), Some(group)) = (entry.owner, entry.group) {
            manifest_entry = manifest_entry.with_ownership(owner, group);
        }
        manifest_entry.modified = entry.modified;
        manifest_entry.created = entry.created;
        manifest_entry
    }

    /// Classifies file contents and, when requested, rehydrates compressed
    /// payloads. Returns the payload to store, the chunk type, the content
    /// type, and the compression facts for the sidecar.
    async fn prepare_payload(
        &self,
        entry: &WalkedEntry,
        data: Vec<u8>,
    ) -> Result<(Vec<u8>, ChunkType, Option<String>, Option<CompressionInfo>), ChunkError> {
        let detection = DetectionEngine::with_global_registry().detect_path(&entry.absolute_path, Some(&data));
        let (chunk_type, content_type) = match &detection {
            Some(result) => (result.file_type.category.chunk_type(), result.file_type.media_type.clone()),
            None => (ChunkType::File, None),
        };

        if self.options.rehydrate_compressed && chunk_type == ChunkType::Archive {
            if let Some(adapter) =
                CompressionAdapterRegistry::global().detect(&entry.absolute_path, Some(&data))
            {
                let format = adapter.format();
                let compressed_size = data.len() as u64;
                let outcome = tokio::task::spawn_blocking(move || match adapter.decompress(&data) {
                    Ok(rehydrated) => Ok(rehydrated),
                    Err(err) => Err((err, data)),
                })
                .await
                .map_err(|e| ChunkError::CompressionError(format!("rehydration task failed: {}", e)))?;

                return Ok(match outcome {
                    Ok(rehydrated) => {
                        let info = CompressionInfo {
                            algorithm: format.to_string(),
                            uncompressed_size: rehydrated.len() as u64,
                            compressed_size,
                        };
                        (rehydrated, chunk_type, content_type, Some(info))
                    }
                    Err((err, data)) => {
                        warn!(path = %entry.absolute_path.display(), error = %err, "rehydration failed, storing as-is");
                        (data, chunk_type, content_type, None)
                    }
                });
            }
        }
        Ok((data, chunk_type, content_type, None))
    }

    async fn store_payload(
        &self,
        entry: &WalkedEntry,
        payload: &[u8],
        chunk_type: ChunkType,
        content_type: Option<String>,
        compression: Option<CompressionInfo>,
    ) -> Result<ChunkId, ChunkError> {
        let hash = self
            .cache
            .compute(&entry.absolute_path, payload, self.options.hash_algorithm)
            .await?;
        let id = ChunkId::new(hash.clone());

        let file_name = entry
            .absolute_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());

        let mut metadata = ChunkMetadata::new(payload.len() as u64, self.options.hash_algorithm, chunk_type)
            .with_content_hash(hash)
            .with_original_path(entry.relative_path.to_string_lossy().into_owned())
            .with_timestamps(entry.created, entry.modified);
        if let Some(name) = file_name {
            metadata = metadata.with_original_filename(name);
        }
        if let Some(content_type) = content_type {
            metadata = metadata.with_content_type(content_type);
        }
        if let Some(compression) = compression {
            metadata = metadata.with_compression(compression);
        }

        self.store.write(payload, &id, Some(metadata)).await
    }
}

struct BuilderDelegate<'a> {
    builder: &'a ArchiveBuilder,
    manifest: ArchiveManifest,
    stats: ArchiveStats,
    warnings: Vec<String>,
}

impl BuilderDelegate<'_> {
    fn count(&mut self, entry_type: ChunkType) {
        *self.stats.per_type.entry(entry_type).or_insert(0) += 1;
    }

    fn is_ignored(&self, path: &Path) -> bool {
        match &self.builder.options.ignore {
            Some(matcher) => matcher(path),
            None => false,
        }
    }
}

#[async_trait]
impl WalkDelegate for BuilderDelegate<'_> {
    async fn process_entry(&mut self, entry: &WalkedEntry) -> Result<bool, ChunkError> {
        if self.is_ignored(&entry.relative_path) {
            debug!(path = %entry.relative_path.display(), "ignored by matcher");
            return Ok(true);
        }

        match &entry.kind {
            WalkedEntryKind::Directory => {
                self.manifest
                    .push(ArchiveBuilder::manifest_entry_base(entry, ChunkType::Directory));
                self.count(ChunkType::Directory);
            }

            WalkedEntryKind::Symlink { target } => {
                let manifest_entry = ArchiveBuilder::manifest_entry_base(entry, ChunkType::Symlink)
                    .with_symlink_target(target.to_string_lossy().into_owned());
                self.manifest.push(manifest_entry);
                self.count(ChunkType::Symlink);
            }

            WalkedEntryKind::Special => {
                // Specials carry no payload; the chunk exists so the entry
                // is restorable by identity like everything else.
                let id = self
                    .builder
                    .store_payload(entry, b"", ChunkType::Special, None, None)
                    .await?;
                let manifest_entry = ArchiveBuilder::manifest_entry_base(entry, ChunkType::Special)
                    .with_hash(id.as_str())
                    .with_size(0);
                self.manifest.push(manifest_entry);
                self.count(ChunkType::Special);
            }

            WalkedEntryKind::File => {
                let data = match tokio::fs::read(&entry.absolute_path).await {
                    Ok(data) => data,
                    Err(err) => {
                        warn!(path = %entry.absolute_path.display(), error = %err, "skipping unreadable file");
                        self.warnings
                            .push(format!("{}: {}", entry.absolute_path.display(), err));
                        return Ok(true);
                    }
                };
                let raw_size = data.len() as u64;

                let (payload, chunk_type, content_type, compression) =
                    self.builder.prepare_payload(entry, data).await?;
                let id = self
                    .builder
                    .store_payload(entry, &payload, chunk_type, content_type, compression)
                    .await?;

                let manifest_entry = ArchiveBuilder::manifest_entry_base(entry, chunk_type)
                    .with_hash(id.as_str())
                    .with_size(raw_size);
                self.manifest.push(manifest_entry);
                self.count(chunk_type);
                self.stats.file_count += 1;
                self.stats.total_size += raw_size;
            }
        }
        Ok(true)
    }

    async fn handle_error(&mut self, path: &Path, error: &ChunkError) -> bool {
        warn!(path = %path.display(), error = %error, "walk error");
        self.warnings.push(format!("{}: {}", path.display(), error));
        true
    }
}

/// Writes a manifest as JSON.
pub async fn save_manifest(manifest: &ArchiveManifest, path: &Path) -> Result<(), ChunkError> {
    let json = manifest.to_json()?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| ChunkError::WriteFailed(format!("writing {}: {}", path.display(), e)))
}

/// Loads a manifest from JSON.
pub async fn load_manifest(path: &Path) -> Result<ArchiveManifest, ChunkError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ChunkError::ReadFailed(format!("reading {}: {}", path.display(), e)))?;
    ArchiveManifest::from_json(&json)
}
