// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # End-to-End Archive Round-Trip Tests
//!
//! Archive a tree, extract it elsewhere, and compare: every regular file's
//! bytes, every manifest path and type, symlink targets, and permissions.

use std::sync::Arc;
use tempfile::TempDir;

use crate::common::git_store;
use chunkvault::application::services::{
    load_manifest, save_manifest, ArchiveBuilder, ArchiveExtractor, ArchiveOptions, WalkOptions,
};
use chunkvault::infrastructure::cache::FileHashCache;
use chunkvault_domain::{ChunkType, HashAlgorithm};

async fn build_source_tree() -> TempDir {
    let source = TempDir::new().unwrap();
    tokio::fs::create_dir_all(source.path().join("docs/notes")).await.unwrap();
    tokio::fs::create_dir(source.path().join("bin")).await.unwrap();
    tokio::fs::write(source.path().join("docs/readme.txt"), b"read me first\n")
        .await
        .unwrap();
    tokio::fs::write(source.path().join("docs/notes/ideas.txt"), b"idea: archive everything\n")
        .await
        .unwrap();
    tokio::fs::write(source.path().join("bin/blob.bin"), (0..=255u8).collect::<Vec<u8>>())
        .await
        .unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(
            source.path().join("bin/blob.bin"),
            std::fs::Permissions::from_mode(0o750),
        )
        .await
        .unwrap();
        tokio::fs::symlink("../docs/readme.txt", source.path().join("bin/readme-link"))
            .await
            .unwrap();
    }
    source
}

/// Archive-create then extract reproduces every regular file's bytes and
/// every manifest entry's path and type.
#[tokio::test]
async fn test_archive_then_extract_roundtrip() {
    let source = build_source_tree().await;
    let vault = TempDir::new().unwrap();
    let restored = TempDir::new().unwrap();

    let store = git_store(vault.path());
    let cache = Arc::new(FileHashCache::new(HashAlgorithm::Sha256, 256));

    let outcome = ArchiveBuilder::new(store.clone(), cache)
        .archive(source.path())
        .await
        .unwrap();
    assert!(outcome.warnings.is_empty(), "warnings: {:?}", outcome.warnings);
    assert_eq!(outcome.stats.file_count, 3);

    // The manifest names every entry with its type.
    let mut typed: Vec<(&str, ChunkType)> = outcome
        .manifest
        .entries
        .iter()
        .map(|e| (e.path.as_str(), e.entry_type))
        .collect();
    typed.sort();
    #[cfg(unix)]
    assert_eq!(
        typed,
        vec![
            ("bin", ChunkType::Directory),
            ("bin/blob.bin", ChunkType::File),
            ("bin/readme-link", ChunkType::Symlink),
            ("docs", ChunkType::Directory),
            ("docs/notes", ChunkType::Directory),
            ("docs/notes/ideas.txt", ChunkType::File),
            ("docs/readme.txt", ChunkType::File),
        ]
    );

    let stats = ArchiveExtractor::new(store)
        .extract(&outcome.manifest, restored.path())
        .await
        .unwrap();
    assert_eq!(stats.file_count, 3);
    assert_eq!(stats.directory_count, 3);

    for rel in ["docs/readme.txt", "docs/notes/ideas.txt", "bin/blob.bin"] {
        let original = std::fs::read(source.path().join(rel)).unwrap();
        let roundtripped = std::fs::read(restored.path().join(rel)).unwrap();
        assert_eq!(original, roundtripped, "content mismatch for {}", rel);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(restored.path().join("bin/blob.bin"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o7777, 0o750);

        let target = std::fs::read_link(restored.path().join("bin/readme-link")).unwrap();
        assert_eq!(target, std::path::PathBuf::from("../docs/readme.txt"));
        assert_eq!(stats.symlink_count, 1);
    }
}

/// The manifest survives its own JSON round trip and extraction works from
/// the reloaded document.
#[tokio::test]
async fn test_manifest_file_roundtrip() {
    let source = build_source_tree().await;
    let vault = TempDir::new().unwrap();
    let restored = TempDir::new().unwrap();

    let store = git_store(vault.path());
    let cache = Arc::new(FileHashCache::new(HashAlgorithm::Sha256, 256));
    let outcome = ArchiveBuilder::new(store.clone(), cache)
        .archive(source.path())
        .await
        .unwrap();

    let manifest_path = vault.path().join("manifest.json");
    save_manifest(&outcome.manifest, &manifest_path).await.unwrap();
    let reloaded = load_manifest(&manifest_path).await.unwrap();
    assert_eq!(reloaded, outcome.manifest);

    ArchiveExtractor::new(store)
        .extract(&reloaded, restored.path())
        .await
        .unwrap();
    assert_eq!(
        std::fs::read(restored.path().join("docs/readme.txt")).unwrap(),
        b"read me first\n"
    );
}

/// A base path prefixes every manifest entry; the ignore matcher drops
/// matching entries before they are archived.
#[tokio::test]
async fn test_base_path_and_ignore_matcher() {
    let source = build_source_tree().await;
    let vault = TempDir::new().unwrap();

    let store = git_store(vault.path());
    let cache = Arc::new(FileHashCache::new(HashAlgorithm::Sha256, 256));
    let options = ArchiveOptions {
        walk: WalkOptions {
            base_path: Some("backup/2024".into()),
            ..WalkOptions::default()
        },
        ignore: Some(Arc::new(|path: &std::path::Path| {
            path.extension().map(|e| e == "bin").unwrap_or(false)
        })),
        ..ArchiveOptions::default()
    };

    let outcome = ArchiveBuilder::new(store, cache)
        .with_options(options)
        .archive(source.path())
        .await
        .unwrap();

    assert!(outcome
        .manifest
        .entries
        .iter()
        .all(|e| e.path.starts_with("backup/2024/")));
    assert!(!outcome.manifest.entries.iter().any(|e| e.path.ends_with("blob.bin")));
    assert_eq!(outcome.stats.file_count, 2);
}

/// Modification times survive the round trip to within filesystem
/// precision.
#[tokio::test]
async fn test_mtime_restored() {
    let source = TempDir::new().unwrap();
    let file = source.path().join("dated.txt");
    tokio::fs::write(&file, b"dated contents").await.unwrap();
    let original_mtime = std::fs::metadata(&file).unwrap().modified().unwrap();

    let vault = TempDir::new().unwrap();
    let restored = TempDir::new().unwrap();
    let store = git_store(vault.path());
    let cache = Arc::new(FileHashCache::new(HashAlgorithm::Sha256, 16));

    let outcome = ArchiveBuilder::new(store.clone(), cache)
        .archive(source.path())
        .await
        .unwrap();
    ArchiveExtractor::new(store)
        .extract(&outcome.manifest, restored.path())
        .await
        .unwrap();

    let restored_mtime = std::fs::metadata(restored.path().join("dated.txt"))
        .unwrap()
        .modified()
        .unwrap();
    let delta = restored_mtime
        .duration_since(original_mtime)
        .unwrap_or_else(|e| e.duration());
    assert!(delta.as_secs() <= 1, "mtime drifted by {:?}", delta);
}
