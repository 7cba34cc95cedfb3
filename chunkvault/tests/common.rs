// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Common Test Helpers
//!
//! Shared utilities for integration and end-to-end tests.

use std::path::Path;
use std::sync::Arc;

use chunkvault::infrastructure::storage::ComposableChunkStore;
use chunkvault_domain::GitStyleOrganization;

/// Calculate the lowercase-hex SHA-256 of `data`.
pub fn calculate_sha256(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// A git-style (depth 2) composable store rooted at `base`.
pub fn git_store(base: &Path) -> Arc<ComposableChunkStore> {
    Arc::new(ComposableChunkStore::filesystem(
        base,
        Arc::new(GitStyleOrganization::new(2)),
    ))
}

/// Every payload file (non-sidecar) under a store root, relative to it.
pub fn payload_files(root: &Path) -> Vec<String> {
    let mut found = Vec::new();
    collect_payload_files(root, root, &mut found);
    found.sort();
    found
}

fn collect_payload_files(root: &Path, dir: &Path, found: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_payload_files(root, &path, found);
        } else if path.extension().map(|e| e != "meta").unwrap_or(true) {
            found.push(
                path.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .into_owned(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_sha256() {
        let hash = calculate_sha256(b"hello\n");
        assert_eq!(hash, "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03");
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_payload_files_skips_sidecars() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("aa/bb")).unwrap();
        std::fs::write(dir.path().join("aa/bb/aabb00"), b"x").unwrap();
        std::fs::write(dir.path().join("aa/bb/aabb00.meta"), b"{}").unwrap();
        assert_eq!(payload_files(dir.path()), vec!["aa/bb/aabb00".to_string()]);
    }
}
