// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Filesystem Retrieval and Existence Backends
//!
//! Concrete implementations of the [`ChunkRetrieval`] and [`ChunkExistence`]
//! ports over a directory tree. Every operation resolves the given
//! backend-relative path against the configured base directory and uses
//! `tokio::fs` so callers suspend at each I/O boundary.
//!
//! Writes are atomic with respect to concurrent readers: bytes land in a
//! sibling temp file that is renamed over the destination, so a reader sees
//! either the old payload or the whole new one, never a torn write.
//! "Not found" is reported as an absent value; only genuine I/O failures
//! become errors.

use async_trait::async_trait;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use chunkvault_domain::{ChunkError, ChunkExistence, ChunkRetrieval};

fn map_io_error(err: std::io::Error, context: &str) -> ChunkError {
    match err.kind() {
        std::io::ErrorKind::PermissionDenied => {
            ChunkError::PermissionDenied(format!("{}: {}", context, err))
        }
        std::io::ErrorKind::StorageFull => {
            ChunkError::InsufficientSpace(format!("{}: {}", context, err))
        }
        _ => ChunkError::ReadFailed(format!("{}: {}", context, err)),
    }
}

fn map_write_error(err: std::io::Error, context: &str) -> ChunkError {
    match err.kind() {
        std::io::ErrorKind::PermissionDenied => {
            ChunkError::PermissionDenied(format!("{}: {}", context, err))
        }
        std::io::ErrorKind::StorageFull => {
            ChunkError::InsufficientSpace(format!("{}: {}", context, err))
        }
        _ => ChunkError::WriteFailed(format!("{}: {}", context, err)),
    }
}

/// Byte I/O over a base directory.
#[derive(Debug, Clone)]
pub struct FilesystemRetrieval {
    base: PathBuf,
}

impl FilesystemRetrieval {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.base.join(path)
    }
}

#[async_trait]
impl ChunkRetrieval for FilesystemRetrieval {
    async fn read_at(&self, path: &Path) -> Result<Option<Vec<u8>>, ChunkError> {
        let full = self.resolve(path);
        match fs::read(&full).await {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(map_io_error(err, &format!("reading {}", full.display()))),
        }
    }

    async fn read_range_at(
        &self,
        path: &Path,
        offset: u64,
        length: u64,
    ) -> Result<Option<Vec<u8>>, ChunkError> {
        let full = self.resolve(path);
        let mut file = match fs::File::open(&full).await {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(map_io_error(err, &format!("opening {}", full.display()))),
        };

        let size = file
            .metadata()
            .await
            .map_err(|e| map_io_error(e, &format!("probing {}", full.display())))?
            .len();

        // Clamp the request to the available range instead of erroring.
        let start = offset.min(size);
        let end = offset.saturating_add(length).min(size);
        let wanted = (end - start) as usize;

        let mut buffer = vec![0u8; wanted];
        if wanted > 0 {
            file.seek(SeekFrom::Start(start))
                .await
                .map_err(|e| map_io_error(e, &format!("seeking {}", full.display())))?;
            file.read_exact(&mut buffer)
                .await
                .map_err(|e| map_io_error(e, &format!("reading {}", full.display())))?;
        }
        Ok(Some(buffer))
    }

    async fn write_at(&self, path: &Path, data: &[u8]) -> Result<(), ChunkError> {
        let full = self.resolve(path);
        let parent = full
            .parent()
            .ok_or_else(|| ChunkError::InvalidStoragePath(format!("{} has no parent", full.display())))?;
        fs::create_dir_all(parent)
            .await
            .map_err(|e| map_write_error(e, &format!("creating {}", parent.display())))?;

        // Stage in a sibling temp file, then rename over the destination.
        let file_name = full
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ChunkError::InvalidStoragePath(format!("{} has no file name", full.display())))?;
        let staging = parent.join(format!(".{}.staging", file_name));

        fs::write(&staging, data)
            .await
            .map_err(|e| map_write_error(e, &format!("staging {}", staging.display())))?;
        fs::rename(&staging, &full)
            .await
            .map_err(|e| map_write_error(e, &format!("committing {}", full.display())))?;
        Ok(())
    }

    async fn delete_at(&self, path: &Path) -> Result<(), ChunkError> {
        let full = self.resolve(path);
        match fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ChunkError::DeleteFailed(format!(
                "removing {}: {}",
                full.display(),
                err
            ))),
        }
    }

    async fn size_at(&self, path: &Path) -> Result<Option<u64>, ChunkError> {
        let full = self.resolve(path);
        match fs::metadata(&full).await {
            Ok(meta) => Ok(Some(meta.len())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(map_io_error(err, &format!("probing {}", full.display()))),
        }
    }
}

/// Existence probe over the same base directory.
#[derive(Debug, Clone)]
pub struct FilesystemExistence {
    base: PathBuf,
}

impl FilesystemExistence {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

#[async_trait]
impl ChunkExistence for FilesystemExistence {
    async fn exists_at(&self, path: &Path) -> Result<bool, ChunkError> {
        match fs::metadata(self.base.join(path)).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(map_io_error(err, &format!("probing {}", path.display()))),
        }
    }
}
