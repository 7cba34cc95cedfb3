// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Hash Cache Integration Tests
//!
//! LRU behavior, attribute validation, and persistence against real files.

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use chunkvault::infrastructure::cache::FileHashCache;
use chunkvault_domain::HashAlgorithm;

async fn file_with(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    tokio::fs::write(&path, contents).await.unwrap();
    path
}

/// Capacity 3: insert k1, k2, k3, touch k1, insert k4. k2 is the one
/// evicted; k1, k3, k4 answer from cache.
#[tokio::test]
async fn test_lru_eviction_keeps_recently_used() {
    let dir = TempDir::new().unwrap();
    let cache = FileHashCache::new(HashAlgorithm::Sha256, 3);

    let k1 = file_with(&dir, "k1", b"one").await;
    let k2 = file_with(&dir, "k2", b"two").await;
    let k3 = file_with(&dir, "k3", b"three").await;
    let k4 = file_with(&dir, "k4", b"four").await;

    cache.compute(&k1, b"one", HashAlgorithm::Sha256).await.unwrap();
    cache.compute(&k2, b"two", HashAlgorithm::Sha256).await.unwrap();
    cache.compute(&k3, b"three", HashAlgorithm::Sha256).await.unwrap();

    // Promote k1, then insert k4 at capacity.
    assert!(cache.get(&k1).await.is_some());
    cache.compute(&k4, b"four", HashAlgorithm::Sha256).await.unwrap();

    assert_eq!(cache.len().await, 3);
    assert!(cache.get(&k1).await.is_some());
    assert!(cache.get(&k2).await.is_none());
    assert!(cache.get(&k3).await.is_some());
    assert!(cache.get(&k4).await.is_some());
    assert_eq!(cache.stats().await.evictions, 1);
}

/// Touching a file's content invalidates its entry; an untouched file keeps
/// answering from cache.
#[tokio::test]
async fn test_validation_against_file_attributes() {
    let dir = TempDir::new().unwrap();
    let cache = FileHashCache::new(HashAlgorithm::Sha256, 8);

    let stable = file_with(&dir, "stable", b"stays the same").await;
    let volatile = file_with(&dir, "volatile", b"v1").await;

    let stable_hash = cache.compute(&stable, b"stays the same", HashAlgorithm::Sha256).await.unwrap();
    cache.compute(&volatile, b"v1", HashAlgorithm::Sha256).await.unwrap();

    tokio::fs::write(&volatile, b"v2 is longer").await.unwrap();

    assert_eq!(cache.get(&stable).await.as_deref(), Some(stable_hash.as_str()));
    assert_eq!(cache.get(&volatile).await, None);

    // Recompute picks up the new content.
    let new_hash = cache.compute(&volatile, b"v2 is longer", HashAlgorithm::Sha256).await.unwrap();
    assert_ne!(new_hash, stable_hash);
    assert_eq!(cache.get(&volatile).await.as_deref(), Some(new_hash.as_str()));
}

/// Save, reload, and keep answering; the sidecar survives a process
/// boundary in spirit.
#[tokio::test]
async fn test_persistence_across_instances() {
    let dir = TempDir::new().unwrap();
    let sidecar = dir.path().join(".hashcache.json");
    let file = file_with(&dir, "data.bin", b"persisted payload").await;

    let expected = {
        let cache = FileHashCache::with_persistence(HashAlgorithm::Sha256, 32, &sidecar).await;
        let hash = cache
            .compute(&file, b"persisted payload", HashAlgorithm::Sha256)
            .await
            .unwrap();
        cache.save().await.unwrap();
        hash
    };
    assert!(sidecar.is_file());

    let reloaded = FileHashCache::with_persistence(HashAlgorithm::Sha256, 32, &sidecar).await;
    assert_eq!(reloaded.len().await, 1);
    assert_eq!(reloaded.get(&file).await.as_deref(), Some(expected.as_str()));
}

/// Concurrent computes over distinct files stay bounded and every key is
/// either present or was evicted; nothing is ever partially stored.
#[tokio::test]
async fn test_concurrent_computes_are_serialized() {
    let dir = TempDir::new().unwrap();
    let cache = Arc::new(FileHashCache::new(HashAlgorithm::Sha256, 10));

    let mut paths = Vec::new();
    for i in 0..32 {
        paths.push(file_with(&dir, &format!("f{}", i), format!("contents {}", i).as_bytes()).await);
    }

    let mut handles = Vec::new();
    for (i, path) in paths.iter().enumerate() {
        let cache = cache.clone();
        let path = path.clone();
        let contents = format!("contents {}", i).into_bytes();
        handles.push(tokio::spawn(async move {
            cache.compute(&path, &contents, HashAlgorithm::Sha256).await.unwrap()
        }));
    }

    let mut hashes = Vec::new();
    for handle in handles {
        hashes.push(handle.await.unwrap());
    }

    assert_eq!(cache.len().await, 10);
    // Every returned hash is a full 64-char digest; no torn entries.
    assert!(hashes.iter().all(|h| h.len() == 64));
    let stats = cache.stats().await;
    assert_eq!(stats.evictions, 22);
}
