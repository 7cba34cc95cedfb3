// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Composable Store Integration Tests
//!
//! Exercises the assembled store against a real filesystem: on-disk layout,
//! deduplicated writes, sidecar merging, reader access, and corruption
//! detection across component boundaries.

use std::sync::Arc;
use tempfile::TempDir;

use crate::common::{calculate_sha256, git_store, payload_files};
use chunkvault::infrastructure::storage::sidecar_path;
use chunkvault_domain::{
    ChunkError, ChunkId, ChunkMetadata, ChunkStore, ChunkType, HashAlgorithm,
};

/// A 1 KiB write under git-style depth 2 lands at `<root>/a1/b2/<id>` with
/// its sidecar alongside, and nothing else.
#[tokio::test]
async fn test_git_style_layout_creates_exactly_two_files() {
    let dir = TempDir::new().unwrap();
    let store = git_store(dir.path());

    let payload = vec![0xa5u8; 1024];
    let id = ChunkId::from_data(&payload, HashAlgorithm::Sha256);
    store.write(&payload, &id, None).await.unwrap();

    let hex = id.as_str();
    let expected_payload = format!("{}/{}/{}", &hex[0..2], &hex[2..4], hex);
    assert_eq!(payload_files(dir.path()), vec![expected_payload.clone()]);

    let payload_path = dir.path().join(&expected_payload);
    assert!(payload_path.is_file());
    assert!(sidecar_path(&payload_path).is_file());
    assert_eq!(std::fs::read(&payload_path).unwrap().len(), 1024);
}

/// Two writes of identical content under different source paths store one
/// payload and union the sidecar paths.
#[tokio::test]
async fn test_deduplicated_write_unions_sidecar() {
    let dir = TempDir::new().unwrap();
    let store = git_store(dir.path());

    let data = b"hello\n";
    let id = ChunkId::new(calculate_sha256(data));

    for source in ["a/x.txt", "b/x.txt"] {
        let metadata = ChunkMetadata::new(6, HashAlgorithm::Sha256, ChunkType::File)
            .with_content_hash(id.as_str())
            .with_original_path(source);
        store.write(data, &id, Some(metadata)).await.unwrap();
    }

    assert_eq!(payload_files(dir.path()).len(), 1);
    let merged = store.metadata(&id).await.unwrap().unwrap();
    assert_eq!(merged.original_paths.len(), 2);
    assert!(merged.original_paths.contains("a/x.txt"));
    assert!(merged.original_paths.contains("b/x.txt"));
}

/// The reader serves ranges through the same store, window growing as it
/// goes.
#[tokio::test]
async fn test_reader_over_store() {
    let dir = TempDir::new().unwrap();
    let store = git_store(dir.path());

    let payload: Vec<u8> = (0..128u8).collect();
    let id = ChunkId::from_data(&payload, HashAlgorithm::Sha256);
    store.write(&payload, &id, None).await.unwrap();

    let mut reader = store.clone().reader(&id).magic_number(8).open().await.unwrap().unwrap();
    assert_eq!(reader.size(), 128);
    assert_eq!(reader.read_magic_number(4).await.unwrap(), &payload[..4]);
    assert_eq!(reader.read(64..96).await.unwrap(), &payload[64..96]);
    assert_eq!(reader.read_full().await.unwrap(), payload);
    assert!(reader.is_fully_cached());
    reader.close();
    assert!(reader.read(0..1).await.is_err());
}

/// External corruption: hash verification fails the read, and disabling
/// verification hands back the tampered bytes.
#[tokio::test]
async fn test_external_corruption_detected() {
    let dir = TempDir::new().unwrap();
    let store = git_store(dir.path());

    let original = b"original payload";
    let id = ChunkId::from_data(original, HashAlgorithm::Sha256);
    store.write(original, &id, None).await.unwrap();

    let hex = id.as_str();
    let payload_path = dir
        .path()
        .join(&hex[0..2])
        .join(&hex[2..4])
        .join(hex);
    std::fs::write(&payload_path, b"tampered payload").unwrap();

    let err = store.read(&id).await.unwrap_err();
    assert!(matches!(err, ChunkError::HashMismatch { .. }));

    // The validation-bearing read reports both integrity errors.
    let (bytes, result) = store.read_with_validation(&id).await.unwrap().unwrap();
    assert_eq!(bytes, b"tampered payload");
    assert!(result.has_hash_mismatch());
    assert!(result
        .errors
        .iter()
        .any(|e| matches!(e, ChunkError::CorruptedData(_))));
}

/// The metadata accessor is a lookup: absent chunks are `None`, not errors.
#[tokio::test]
async fn test_absent_chunk_is_absent_everywhere() {
    let dir = TempDir::new().unwrap();
    let store = git_store(dir.path());
    let id = ChunkId::from_data(b"never written", HashAlgorithm::Sha256);

    assert_eq!(store.read(&id).await.unwrap(), None);
    assert_eq!(store.size(&id).await.unwrap(), None);
    assert_eq!(store.metadata(&id).await.unwrap(), None);
    assert!(!store.exists(&id).await.unwrap());
    assert!(store.clone().reader(&id).open().await.unwrap().is_none());
}

/// Concurrent writers of the same chunk serialize; payload and sidecar come
/// out whole.
#[tokio::test]
async fn test_concurrent_same_chunk_writes() {
    let dir = TempDir::new().unwrap();
    let store = git_store(dir.path());

    let data = b"contended payload".to_vec();
    let id = ChunkId::from_data(&data, HashAlgorithm::Sha256);

    let mut handles = Vec::new();
    for i in 0..8 {
        let store: Arc<_> = store.clone();
        let data = data.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            let metadata = ChunkMetadata::new(data.len() as u64, HashAlgorithm::Sha256, ChunkType::File)
                .with_original_path(format!("copy-{}/file.bin", i));
            store.write(&data, &id, Some(metadata)).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.read(&id).await.unwrap().unwrap(), data);
    let merged = store.metadata(&id).await.unwrap().unwrap();
    assert_eq!(merged.original_paths.len(), 8);
}
