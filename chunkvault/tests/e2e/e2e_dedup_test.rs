// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # End-to-End Deduplication Tests
//!
//! Identical content under different paths archives into exactly one chunk
//! whose sidecar remembers every source path.

use std::sync::Arc;
use tempfile::TempDir;

use crate::common::{git_store, payload_files};
use chunkvault::application::services::ArchiveBuilder;
use chunkvault::infrastructure::cache::FileHashCache;
use chunkvault_domain::{ChunkId, ChunkStore, ChunkType, HashAlgorithm};

const HELLO_SHA256: &str = "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03";

/// `a/x.txt` and `b/x.txt`, both "hello\n": one chunk on disk, its id the
/// content hash, the sidecar holding both paths, the manifest holding two
/// entries referencing it.
#[tokio::test]
async fn test_dedup_across_paths() {
    let source = TempDir::new().unwrap();
    tokio::fs::create_dir(source.path().join("a")).await.unwrap();
    tokio::fs::create_dir(source.path().join("b")).await.unwrap();
    tokio::fs::write(source.path().join("a/x.txt"), b"hello\n").await.unwrap();
    tokio::fs::write(source.path().join("b/x.txt"), b"hello\n").await.unwrap();

    let vault = TempDir::new().unwrap();
    let store = git_store(vault.path());
    let cache = Arc::new(FileHashCache::new(HashAlgorithm::Sha256, 64));

    let outcome = ArchiveBuilder::new(store.clone(), cache)
        .archive(source.path())
        .await
        .unwrap();

    // Exactly one payload file, addressed by the content hash.
    let payloads = payload_files(vault.path());
    assert_eq!(payloads.len(), 1);
    assert!(payloads[0].ends_with(HELLO_SHA256));

    // The sidecar unions both source paths.
    let id = ChunkId::new(HELLO_SHA256);
    let metadata = store.metadata(&id).await.unwrap().unwrap();
    assert_eq!(metadata.size, 6);
    assert!(metadata.original_paths.contains("a/x.txt"));
    assert!(metadata.original_paths.contains("b/x.txt"));

    // Two manifest entries reference the one chunk.
    let referencing = outcome.manifest.entries_for_chunk(HELLO_SHA256);
    assert_eq!(referencing.len(), 2);
    let mut paths: Vec<&str> = referencing.iter().map(|e| e.path.as_str()).collect();
    paths.sort();
    assert_eq!(paths, vec!["a/x.txt", "b/x.txt"]);

    // Stats count raw bytes per file, dedup notwithstanding.
    assert_eq!(outcome.stats.file_count, 2);
    assert_eq!(outcome.stats.total_size, 12);
    assert_eq!(outcome.stats.per_type.get(&ChunkType::File), Some(&2));
    assert_eq!(outcome.stats.per_type.get(&ChunkType::Directory), Some(&2));
}

/// Re-archiving the same tree adds no new payloads and leaves the sidecar
/// stable.
#[tokio::test]
async fn test_rearchive_is_idempotent() {
    let source = TempDir::new().unwrap();
    tokio::fs::write(source.path().join("doc.txt"), b"unchanging").await.unwrap();

    let vault = TempDir::new().unwrap();
    let store = git_store(vault.path());
    let cache = Arc::new(FileHashCache::new(HashAlgorithm::Sha256, 64));
    let builder = ArchiveBuilder::new(store.clone(), cache);

    let first = builder.archive(source.path()).await.unwrap();
    let after_first = payload_files(vault.path());

    let second = builder.archive(source.path()).await.unwrap();
    let after_second = payload_files(vault.path());

    assert_eq!(after_first, after_second);
    assert_eq!(first.manifest, second.manifest);

    let id = ChunkId::new(first.manifest.entries[0].hash.as_deref().unwrap());
    let metadata = store.metadata(&id).await.unwrap().unwrap();
    assert_eq!(metadata.original_paths.len(), 1);
}
