// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Archive Extractor
//!
//! Replays a manifest against a chunk store to reconstruct the archived
//! tree: directories are recreated, files are read back chunk by chunk
//! (through whatever tier fallback the store provides), symlinks are
//! relinked, and permissions and modification times are reapplied.
//!
//! Special files cannot be recreated without device privileges; they are
//! counted and skipped. A manifest entry whose chunk is missing from every
//! tier is a hard error, extraction does not silently produce holes.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use chunkvault_domain::{ArchiveManifest, ChunkError, ChunkId, ChunkStore, ChunkType, ManifestEntry};

/// Counters reported by an extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub file_count: u64,
    pub directory_count: u64,
    pub symlink_count: u64,
    pub skipped_special: u64,
    pub total_bytes: u64,
}

/// Reconstructs archived trees from manifests.
pub struct ArchiveExtractor {
    store: Arc<dyn ChunkStore>,
}

impl ArchiveExtractor {
    pub fn new(store: Arc<dyn ChunkStore>) -> Self {
        Self { store }
    }

    /// Extracts every manifest entry under `target_root`.
    pub async fn extract(
        &self,
        manifest: &ArchiveManifest,
        target_root: &Path,
    ) -> Result<ExtractStats, ChunkError> {
        tokio::fs::create_dir_all(target_root)
            .await
            .map_err(|e| ChunkError::WriteFailed(format!("creating {}: {}", target_root.display(), e)))?;

        let mut stats = ExtractStats::default();
        for entry in &manifest.entries {
            self.extract_entry(entry, target_root, &mut stats).await?;
        }

        debug!(
            files = stats.file_count,
            directories = stats.directory_count,
            symlinks = stats.symlink_count,
            "extraction complete"
        );
        Ok(stats)
    }

    async fn extract_entry(
        &self,
        entry: &ManifestEntry,
        target_root: &Path,
        stats: &mut ExtractStats,
    ) -> Result<(), ChunkError> {
        let relative = Path::new(&entry.path);
        if relative.is_absolute() || relative.components().any(|c| c == std::path::Component::ParentDir) {
            return Err(ChunkError::InvalidStoragePath(format!(
                "manifest entry '{}' escapes the extraction root",
                entry.path
            )));
        }
        let target = target_root.join(relative);

        match entry.entry_type {
            ChunkType::Directory => {
                tokio::fs::create_dir_all(&target)
                    .await
                    .map_err(|e| ChunkError::WriteFailed(format!("creating {}: {}", target.display(), e)))?;
                self.apply_attributes(entry, &target).await;
                stats.directory_count += 1;
            }

            ChunkType::Symlink => {
                let link_target = entry.symlink_target.as_deref().ok_or_else(|| {
                    ChunkError::InvalidMetadata(format!("symlink entry '{}' has no target", entry.path))
                })?;
                if let Some(parent) = target.parent() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        ChunkError::WriteFailed(format!("creating {}: {}", parent.display(), e))
                    })?;
                }
                #[cfg(unix)]
                {
                    // Replace any leftover link from a previous extraction.
                    let _ = tokio::fs::remove_file(&target).await;
                    tokio::fs::symlink(link_target, &target).await.map_err(|e| {
                        ChunkError::WriteFailed(format!("linking {}: {}", target.display(), e))
                    })?;
                }
                #[cfg(not(unix))]
                {
                    warn!(path = %target.display(), target = %link_target, "symlinks unsupported on this platform");
                }
                stats.symlink_count += 1;
            }

            ChunkType::Special => {
                debug!(path = %entry.path, "skipping special file");
                stats.skipped_special += 1;
            }

            ChunkType::File | ChunkType::DiskImage | ChunkType::Archive => {
                let hash = entry.hash.as_deref().ok_or_else(|| {
                    ChunkError::InvalidMetadata(format!("entry '{}' has no chunk identifier", entry.path))
                })?;
                let id = ChunkId::new(hash);
                let data = self
                    .store
                    .read(&id)
                    .await?
                    .ok_or_else(|| ChunkError::ChunkNotFound(format!("{} (for '{}')", hash, entry.path)))?;

                if let Some(parent) = target.parent() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        ChunkError::WriteFailed(format!("creating {}: {}", parent.display(), e))
                    })?;
                }
                tokio::fs::write(&target, &data)
                    .await
                    .map_err(|e| ChunkError::WriteFailed(format!("writing {}: {}", target.display(), e)))?;

                self.apply_attributes(entry, &target).await;
                stats.file_count += 1;
                stats.total_bytes += data.len() as u64;
            }
        }
        Ok(())
    }

    /// Best-effort reapplication of permissions and modification time.
    async fn apply_attributes(&self, entry: &ManifestEntry, target: &Path) {
        #[cfg(unix)]
        if let Some(mode) = entry.permissions {
            use std::os::unix::fs::PermissionsExt;
            if let Err(err) =
                tokio::fs::set_permissions(target, std::fs::Permissions::from_mode(mode)).await
            {
                warn!(path = %target.display(), error = %err, "could not restore permissions");
            }
        }

        // Directory mtimes churn as children land; only files get theirs
        // restored.
        if target.is_dir() {
            return;
        }
        if let Some(modified) = entry.modified {
            let system_time: std::time::SystemTime = modified.into();
            let result = std::fs::File::options()
                .write(true)
                .open(target)
                .and_then(|file| file.set_modified(system_time));
            if let Err(err) = result {
                warn!(path = %target.display(), error = %err, "could not restore modification time");
            }
        }
    }
}
