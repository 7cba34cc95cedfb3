// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Directory Walker
//!
//! Recursive source-tree traversal with a delegate. The walker discovers and
//! classifies entries; the delegate decides what happens to each one and
//! whether the walk continues. I/O errors go through the delegate too, so an
//! archive run can log-and-continue where a verification run would abort.
//!
//! Classification per entry, in order: symlinks (kept as links unless
//! `follow_symlinks`), special files (FIFOs, devices, sockets; emitted only
//! with `include_special`), directories (emitted, then recursed into), and
//! regular files. Hidden entries (names starting with `.`) are skipped when
//! `skip_hidden` is set, and `base_path` prepends a synthetic prefix to
//! every emitted relative path.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use chunkvault_domain::ChunkError;

/// Traversal options.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Resolve symlinks and walk their targets instead of recording links.
    pub follow_symlinks: bool,
    /// Emit FIFOs, devices, and sockets instead of skipping them.
    pub include_special: bool,
    /// Silently skip directories the process may not read.
    pub skip_permission_errors: bool,
    /// Skip entries whose name starts with `.`.
    pub skip_hidden: bool,
    /// Synthetic prefix prepended to every emitted relative path.
    pub base_path: Option<PathBuf>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_special: false,
            skip_permission_errors: true,
            skip_hidden: true,
            base_path: None,
        }
    }
}

/// What kind of tree entry was discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkedEntryKind {
    File,
    Directory,
    Symlink { target: PathBuf },
    Special,
}

/// One discovered entry with the attributes archival needs.
#[derive(Debug, Clone)]
pub struct WalkedEntry {
    pub absolute_path: PathBuf,
    /// Path relative to the walk root, with any configured base prefix.
    pub relative_path: PathBuf,
    pub kind: WalkedEntryKind,
    /// Byte size; zero for non-files.
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    pub permissions: Option<u32>,
    pub owner: Option<u32>,
    pub group: Option<u32>,
}

/// Receiver of walk events. `process_entry` and `handle_error` return
/// whether the walk should continue.
#[async_trait]
pub trait WalkDelegate: Send {
    async fn process_entry(&mut self, entry: &WalkedEntry) -> Result<bool, ChunkError>;

    async fn handle_error(&mut self, path: &Path, error: &ChunkError) -> bool {
        let _ = (path, error);
        true
    }
}

/// Recursive tree walker.
pub struct DirectoryWalker {
    options: WalkOptions,
}

impl DirectoryWalker {
    pub fn new(options: WalkOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WalkOptions {
        &self.options
    }

    /// Walks `root`, reporting each discovered entry to `delegate`.
    pub async fn walk<D: WalkDelegate>(&self, root: &Path, delegate: &mut D) -> Result<(), ChunkError> {
        let rel_root = self.options.base_path.clone().unwrap_or_default();
        self.walk_dir(root.to_path_buf(), rel_root, delegate).await?;
        Ok(())
    }

    fn is_hidden(name: &str) -> bool {
        name.starts_with('.') && name != "." && name != ".."
    }

    async fn entry_from_metadata(
        &self,
        absolute: PathBuf,
        relative: PathBuf,
        kind: WalkedEntryKind,
        metadata: &std::fs::Metadata,
    ) -> WalkedEntry {
        let size = if kind == WalkedEntryKind::File { metadata.len() } else { 0 };

        #[cfg(unix)]
        let (permissions, owner, group) = {
            use std::os::unix::fs::MetadataExt;
            (
                Some(metadata.mode() & 0o7777),
                Some(metadata.uid()),
                Some(metadata.gid()),
            )
        };
        #[cfg(not(unix))]
        let (permissions, owner, group) = (None, None, None);

        WalkedEntry {
            absolute_path: absolute,
            relative_path: relative,
            kind,
            size,
            modified: metadata.modified().ok().map(Into::into),
            created: metadata.created().ok().map(Into::into),
            permissions,
            owner,
            group,
        }
    }

    fn is_special(metadata: &std::fs::Metadata) -> bool {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            let file_type = metadata.file_type();
            file_type.is_fifo()
                || file_type.is_socket()
                || file_type.is_block_device()
                || file_type.is_char_device()
        }
        #[cfg(not(unix))]
        {
            let _ = metadata;
            false
        }
    }

    /// Recurses into `dir`. Returns false when the delegate stopped the walk.
    fn walk_dir<'a, D: WalkDelegate>(
        &'a self,
        dir: PathBuf,
        rel: PathBuf,
        delegate: &'a mut D,
    ) -> BoxFuture<'a, Result<bool, ChunkError>> {
        async move {
            let mut reader = match fs::read_dir(&dir).await {
                Ok(reader) => reader,
                Err(err) => {
                    let error = ChunkError::from(err);
                    if matches!(error, ChunkError::PermissionDenied(_)) && self.options.skip_permission_errors {
                        debug!(dir = %dir.display(), "skipping unreadable directory");
                        return Ok(true);
                    }
                    return Ok(delegate.handle_error(&dir, &error).await);
                }
            };

            let mut names = Vec::new();
            loop {
                match reader.next_entry().await {
                    Ok(Some(entry)) => names.push(entry.file_name()),
                    Ok(None) => break,
                    Err(err) => {
                        let error = ChunkError::from(err);
                        if !delegate.handle_error(&dir, &error).await {
                            return Ok(false);
                        }
                        break;
                    }
                }
            }
            names.sort();

            for name in names {
                let name_str = name.to_string_lossy().into_owned();
                if self.options.skip_hidden && Self::is_hidden(&name_str) {
                    continue;
                }

                let absolute = dir.join(&name);
                let relative = rel.join(&name);

                let link_metadata = match fs::symlink_metadata(&absolute).await {
                    Ok(metadata) => metadata,
                    Err(err) => {
                        let error = ChunkError::from(err);
                        if matches!(error, ChunkError::PermissionDenied(_))
                            && self.options.skip_permission_errors
                        {
                            continue;
                        }
                        if !delegate.handle_error(&absolute, &error).await {
                            return Ok(false);
                        }
                        continue;
                    }
                };

                if link_metadata.file_type().is_symlink() && !self.options.follow_symlinks {
                    let target = match fs::read_link(&absolute).await {
                        Ok(target) => target,
                        Err(err) => {
                            if !delegate.handle_error(&absolute, &ChunkError::from(err)).await {
                                return Ok(false);
                            }
                            continue;
                        }
                    };
                    let entry = self
                        .entry_from_metadata(absolute, relative, WalkedEntryKind::Symlink { target }, &link_metadata)
                        .await;
                    if !delegate.process_entry(&entry).await? {
                        return Ok(false);
                    }
                    continue;
                }

                // Resolve through the link when following; otherwise the
                // link metadata already describes the entry itself.
                let metadata = if link_metadata.file_type().is_symlink() {
                    match fs::metadata(&absolute).await {
                        Ok(metadata) => metadata,
                        Err(err) => {
                            if !delegate.handle_error(&absolute, &ChunkError::from(err)).await {
                                return Ok(false);
                            }
                            continue;
                        }
                    }
                } else {
                    link_metadata
                };

                if Self::is_special(&metadata) {
                    if self.options.include_special {
                        let entry = self
                            .entry_from_metadata(absolute, relative, WalkedEntryKind::Special, &metadata)
                            .await;
                        if !delegate.process_entry(&entry).await? {
                            return Ok(false);
                        }
                    }
                    continue;
                }

                if metadata.is_dir() {
                    let entry = self
                        .entry_from_metadata(absolute.clone(), relative.clone(), WalkedEntryKind::Directory, &metadata)
                        .await;
                    if !delegate.process_entry(&entry).await? {
                        return Ok(false);
                    }
                    if !self.walk_dir(absolute, relative, delegate).await? {
                        return Ok(false);
                    }
                } else {
                    let entry = self
                        .entry_from_metadata(absolute, relative, WalkedEntryKind::File, &metadata)
                        .await;
                    if !delegate.process_entry(&entry).await? {
                        return Ok(false);
                    }
                }
            }

            Ok(true)
        }
        .boxed()
    }
}
