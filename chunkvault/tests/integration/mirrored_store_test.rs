// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Mirrored Store Integration Tests
//!
//! Tier semantics over real filesystem backends: fan-out writes, ordered
//! fallback reads, swallowed mirror failures, and policy-driven
//! construction.

use async_trait::async_trait;
use std::sync::Arc;
use tempfile::TempDir;

use crate::common::git_store;
use chunkvault::infrastructure::config::{build_mirrored_store, StoragePolicy};
use chunkvault::infrastructure::storage::{MirroredChunkStore, TierBackend};
use chunkvault_domain::{
    ChunkError, ChunkId, ChunkMetadata, ChunkStore, HashAlgorithm, StorageLocation,
    ValidationConfig, VolumeType,
};

struct Tiers {
    _dirs: Vec<TempDir>,
    primary: Arc<dyn ChunkStore>,
    mirror: Arc<dyn ChunkStore>,
    glacier: Arc<dyn ChunkStore>,
    store: MirroredChunkStore,
}

fn three_tiers() -> Tiers {
    let dirs = vec![TempDir::new().unwrap(), TempDir::new().unwrap(), TempDir::new().unwrap()];
    let primary = git_store(dirs[0].path());
    let mirror = git_store(dirs[1].path());
    let glacier = git_store(dirs[2].path());

    let store = MirroredChunkStore::new(TierBackend::new(primary.clone(), "primary", VolumeType::Primary))
        .with_mirror(TierBackend::new(mirror.clone(), "mirror", VolumeType::Mirror))
        .with_glacier(TierBackend::new(glacier.clone(), "glacier", VolumeType::Glacier));

    Tiers {
        _dirs: dirs,
        primary,
        mirror,
        glacier,
        store,
    }
}

fn id_for(data: &[u8]) -> ChunkId {
    ChunkId::from_data(data, HashAlgorithm::Sha256)
}

/// A store whose every operation fails, standing in for an offline tier.
struct OfflineStore;

#[async_trait]
impl ChunkStore for OfflineStore {
    async fn write(&self, _: &[u8], _: &ChunkId, _: Option<ChunkMetadata>) -> Result<ChunkId, ChunkError> {
        Err(ChunkError::StorageUnavailable("offline".into()))
    }
    async fn read(&self, _: &ChunkId) -> Result<Option<Vec<u8>>, ChunkError> {
        Err(ChunkError::StorageUnavailable("offline".into()))
    }
    async fn read_range(&self, _: &ChunkId, _: u64, _: u64) -> Result<Option<Vec<u8>>, ChunkError> {
        Err(ChunkError::StorageUnavailable("offline".into()))
    }
    async fn update(&self, _: &[u8], _: &ChunkId, _: Option<ChunkMetadata>) -> Result<ChunkId, ChunkError> {
        Err(ChunkError::StorageUnavailable("offline".into()))
    }
    async fn delete(&self, _: &ChunkId) -> Result<(), ChunkError> {
        Err(ChunkError::StorageUnavailable("offline".into()))
    }
    async fn exists(&self, _: &ChunkId) -> Result<bool, ChunkError> {
        Err(ChunkError::StorageUnavailable("offline".into()))
    }
    async fn size(&self, _: &ChunkId) -> Result<Option<u64>, ChunkError> {
        Err(ChunkError::StorageUnavailable("offline".into()))
    }
    async fn metadata(&self, _: &ChunkId) -> Result<Option<ChunkMetadata>, ChunkError> {
        Err(ChunkError::StorageUnavailable("offline".into()))
    }
}

/// After a mirrored write, every tier that did not fail holds the payload.
#[tokio::test]
async fn test_write_fans_out_to_all_tiers() {
    let tiers = three_tiers();
    let data = b"replicate me";
    let id = id_for(data);

    let report = tiers.store.write_with_report(data, &id, None).await.unwrap();
    assert!(report.primary_succeeded);
    assert_eq!(report.mirror_failures, 0);
    assert_eq!(report.glacier_failures, 0);

    assert_eq!(tiers.primary.read(&id).await.unwrap().unwrap(), data);
    assert_eq!(tiers.mirror.read(&id).await.unwrap().unwrap(), data);
    assert_eq!(tiers.glacier.read(&id).await.unwrap().unwrap(), data);
}

/// Payload removed from primary and mirror is still served from the
/// glacier, and existence still holds.
#[tokio::test]
async fn test_read_falls_back_to_glacier() {
    let tiers = three_tiers();
    let data = b"cold storage";
    let id = id_for(data);
    tiers.store.write(data, &id, None).await.unwrap();

    tiers.primary.delete(&id).await.unwrap();
    tiers.mirror.delete(&id).await.unwrap();

    assert_eq!(tiers.store.read(&id).await.unwrap().unwrap(), data);
    assert!(tiers.store.exists(&id).await.unwrap());
    assert_eq!(tiers.store.size(&id).await.unwrap(), Some(data.len() as u64));
}

/// Mirror failures are demoted to warnings; the write succeeds.
#[tokio::test]
async fn test_offline_mirror_never_fails_write() {
    let dir = TempDir::new().unwrap();
    let store = MirroredChunkStore::new(TierBackend::new(
        git_store(dir.path()),
        "primary",
        VolumeType::Primary,
    ))
    .with_mirror(TierBackend::new(Arc::new(OfflineStore), "offline", VolumeType::Mirror));

    let data = b"resilient";
    let id = id_for(data);
    let report = store.write_with_report(data, &id, None).await.unwrap();
    assert!(report.primary_succeeded);
    assert_eq!(report.mirror_failures, 1);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(store.read(&id).await.unwrap().unwrap(), data);
}

/// A failing primary aborts or degrades according to the flag.
#[tokio::test]
async fn test_primary_failure_policy() {
    let mirror_dir = TempDir::new().unwrap();

    let strict = MirroredChunkStore::new(TierBackend::new(
        Arc::new(OfflineStore),
        "primary",
        VolumeType::Primary,
    ))
    .with_mirror(TierBackend::new(git_store(mirror_dir.path()), "mirror", VolumeType::Mirror));

    let data = b"where to?";
    let id = id_for(data);
    assert!(strict.write(data, &id, None).await.is_err());

    let lenient = MirroredChunkStore::new(TierBackend::new(
        Arc::new(OfflineStore),
        "primary",
        VolumeType::Primary,
    ))
    .with_mirror(TierBackend::new(git_store(mirror_dir.path()), "mirror", VolumeType::Mirror))
    .fail_on_primary_error(false);

    let report = lenient.write_with_report(data, &id, None).await.unwrap();
    assert!(!report.primary_succeeded);
    assert!(report.warnings.iter().any(|w| w.contains("primary")));
    // The mirror took the write; fallback reads see it.
    assert_eq!(lenient.read(&id).await.unwrap().unwrap(), data);
}

/// Delete succeeds when the primary delete succeeded and only optional
/// tiers failed; a failing required tier fails the operation.
#[tokio::test]
async fn test_delete_aggregation() {
    let primary_dir = TempDir::new().unwrap();
    let data = b"to be deleted";
    let id = id_for(data);

    let optional = MirroredChunkStore::new(TierBackend::new(
        git_store(primary_dir.path()),
        "primary",
        VolumeType::Primary,
    ))
    .with_mirror(TierBackend::new(Arc::new(OfflineStore), "offline", VolumeType::Mirror));
    optional.write(data, &id, None).await.unwrap();
    optional.delete(&id).await.unwrap();

    let required = MirroredChunkStore::new(TierBackend::new(
        git_store(primary_dir.path()),
        "primary",
        VolumeType::Primary,
    ))
    .with_mirror(TierBackend::new(Arc::new(OfflineStore), "offline", VolumeType::Mirror).required());
    required.write(data, &id, None).await.unwrap();
    let err = required.delete(&id).await.unwrap_err();
    assert!(matches!(err, ChunkError::DeleteFailed(_)));
}

/// A store built from a resolved YAML policy behaves like a hand-assembled
/// one.
#[tokio::test]
async fn test_policy_built_store() {
    let root = TempDir::new().unwrap();
    let primary_path = root.path().join("main");
    let mirror_path = root.path().join("mirror");
    std::fs::create_dir(&primary_path).unwrap();
    std::fs::create_dir(&mirror_path).unwrap();

    let policy = StoragePolicy {
        locations: vec![
            StorageLocation::new(&primary_path, "main", VolumeType::Primary).required(),
            StorageLocation::new(&mirror_path, "mirror", VolumeType::Mirror),
        ],
        ..StoragePolicy::default()
    };
    let resolved = policy.resolve().unwrap();
    let store = build_mirrored_store(&resolved, ValidationConfig::default(), true);
    assert_eq!(store.mirror_count(), 1);
    assert_eq!(store.glacier_count(), 0);

    let data = b"policy driven";
    let id = id_for(data);
    store.write(data, &id, None).await.unwrap();

    // Both location roots hold the chunk under the git-style layout.
    let hex = id.as_str();
    let rel = format!("{}/{}/{}", &hex[0..2], &hex[2..4], hex);
    assert!(primary_path.join(&rel).is_file());
    assert!(mirror_path.join(&rel).is_file());
}
