// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Hash Cache
//!
//! Avoids recomputing file content hashes across archive runs. The cache is
//! a bounded associative container keyed by `<absolute path>|<algorithm>`,
//! with LRU eviction on insert and optional persistence to a JSON sidecar
//! file.
//!
//! ## Entry Validity
//!
//! A cached entry answers a lookup only when the file still looks like it
//! did when the hash was computed: the configured algorithm matches, the
//! current size matches, and the modification time is within one second of
//! the recorded one (filesystems round mtimes differently, a strict equality
//! would invalidate entries that are in fact current).
//!
//! ## Concurrency
//!
//! All state lives behind one async mutex, so mutations are serialized and
//! the LRU order is linearizable: after any mix of concurrent gets and sets
//! the container holds `min(inserted, capacity)` entries and the evicted
//! keys are exactly the least recently used ones in some serial order of the
//! operations.
//!
//! ## Persistence
//!
//! `save` writes the whole map atomically (temp file + rename). Loading
//! happens at construction: entries recorded under a different algorithm are
//! filtered out, and a sidecar that fails to parse is treated as no prior
//! cache at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use chunkvault_domain::services::datetime_serde;
use chunkvault_domain::{ChunkError, HashAlgorithm};

/// One cached file hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHashCacheEntry {
    /// Absolute path of the hashed file.
    pub path: String,
    /// Lowercase-hex content hash.
    pub hash: String,
    pub hash_algorithm: HashAlgorithm,
    pub file_size: u64,
    #[serde(with = "datetime_serde")]
    pub modification_time: DateTime<Utc>,
}

impl FileHashCacheEntry {
    fn key(&self) -> String {
        cache_key(&self.path, self.hash_algorithm)
    }
}

fn cache_key(path: &str, algorithm: HashAlgorithm) -> String {
    format!("{}|{}", path, algorithm)
}

/// Counters exposed for logging and the cache-stats surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub len: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, FileHashCacheEntry>,
    /// Keys from least to most recently used.
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl CacheInner {
    fn touch(&mut self, key: &str) {
        if let Some(position) = self.order.iter().position(|k| k == key) {
            let key = self.order.remove(position).expect("position just found");
            self.order.push_back(key);
        }
    }

    fn insert(&mut self, entry: FileHashCacheEntry, capacity: usize) {
        let key = entry.key();
        if self.entries.insert(key.clone(), entry).is_some() {
            self.touch(&key);
            return;
        }
        self.order.push_back(key);
        while self.entries.len() > capacity {
            if let Some(victim) = self.order.pop_front() {
                self.entries.remove(&victim);
                self.evictions += 1;
            }
        }
    }
}

/// Bounded LRU cache of file content hashes with optional JSON persistence.
pub struct FileHashCache {
    algorithm: HashAlgorithm,
    max_cache_size: usize,
    persist_path: Option<PathBuf>,
    inner: Mutex<CacheInner>,
}

impl FileHashCache {
    /// An in-memory cache with no persistence.
    pub fn new(algorithm: HashAlgorithm, max_cache_size: usize) -> Self {
        Self {
            algorithm,
            max_cache_size: max_cache_size.max(1),
            persist_path: None,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// A cache backed by a JSON sidecar file, loading any prior contents.
    ///
    /// Entries recorded under a different algorithm are filtered out during
    /// the load; a sidecar that does not parse means starting empty.
    pub async fn with_persistence(
        algorithm: HashAlgorithm,
        max_cache_size: usize,
        persist_path: impl Into<PathBuf>,
    ) -> Self {
        let persist_path = persist_path.into();
        let cache = Self {
            persist_path: Some(persist_path.clone()),
            ..Self::new(algorithm, max_cache_size)
        };

        match tokio::fs::read(&persist_path).await {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, FileHashCacheEntry>>(&bytes) {
                Ok(loaded) => {
                    let mut inner = cache.inner.lock().await;
                    let mut kept = 0usize;
                    for (_, entry) in loaded {
                        if entry.hash_algorithm == algorithm {
                            inner.insert(entry, cache.max_cache_size);
                            kept += 1;
                        }
                    }
                    debug!(path = %persist_path.display(), entries = kept, "loaded hash cache");
                }
                Err(err) => {
                    warn!(path = %persist_path.display(), error = %err, "hash cache unreadable, starting empty");
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(path = %persist_path.display(), error = %err, "hash cache unreadable, starting empty");
            }
        }

        cache
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn capacity(&self) -> usize {
        self.max_cache_size
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().await;
        CacheStats {
            len: inner.entries.len(),
            capacity: self.max_cache_size,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }

    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.entries.clear();
        inner.order.clear();
    }

    /// Validity check: same algorithm, same size, mtime within one second.
    fn entry_is_valid(entry: &FileHashCacheEntry, algorithm: HashAlgorithm, size: u64, mtime: DateTime<Utc>) -> bool {
        entry.hash_algorithm == algorithm
            && entry.file_size == size
            && (entry.modification_time - mtime).num_seconds().abs() <= 1
    }

    /// Looks up the cached hash for `path`, validating it against the file's
    /// current size and modification time. Invalid or absent entries count
    /// as misses.
    pub async fn get(&self, path: &Path) -> Option<String> {
        let path_str = path.to_string_lossy().into_owned();
        let key = cache_key(&path_str, self.algorithm);

        let (size, mtime) = match tokio::fs::metadata(path).await {
            Ok(meta) => {
                let mtime: DateTime<Utc> = meta.modified().ok()?.into();
                (meta.len(), mtime)
            }
            Err(_) => {
                self.inner.lock().await.misses += 1;
                return None;
            }
        };

        let mut inner = self.inner.lock().await;
        let hit = match inner.entries.get(&key) {
            Some(entry) if Self::entry_is_valid(entry, self.algorithm, size, mtime) => Some(entry.hash.clone()),
            _ => None,
        };
        match hit {
            Some(hash) => {
                inner.hits += 1;
                inner.touch(&key);
                Some(hash)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Inserts an entry, evicting the least recently used one at capacity.
    pub async fn set(&self, entry: FileHashCacheEntry) -> Result<(), ChunkError> {
        if entry.hash_algorithm != self.algorithm {
            return Err(ChunkError::InvalidHashAlgorithm(format!(
                "cache is configured for {}, entry uses {}",
                self.algorithm, entry.hash_algorithm
            )));
        }
        let mut inner = self.inner.lock().await;
        inner.insert(entry, self.max_cache_size);
        Ok(())
    }

    /// Returns the hash of `data` for `path`, from cache when valid,
    /// computing and inserting otherwise.
    pub async fn compute(
        &self,
        path: &Path,
        data: &[u8],
        algorithm: HashAlgorithm,
    ) -> Result<String, ChunkError> {
        if algorithm != self.algorithm {
            return Err(ChunkError::InvalidHashAlgorithm(format!(
                "cache is configured for {}, compute requested {}",
                self.algorithm, algorithm
            )));
        }

        if let Some(hash) = self.get(path).await {
            return Ok(hash);
        }

        let hash = algorithm.digest_hex(data);

        let (file_size, modification_time) = match tokio::fs::metadata(path).await {
            Ok(meta) => {
                let mtime: DateTime<Utc> = meta.modified().map(Into::into).unwrap_or_else(|_| Utc::now());
                (meta.len(), mtime)
            }
            Err(_) => (data.len() as u64, Utc::now()),
        };

        self.set(FileHashCacheEntry {
            path: path.to_string_lossy().into_owned(),
            hash: hash.clone(),
            hash_algorithm: algorithm,
            file_size,
            modification_time,
        })
        .await?;

        Ok(hash)
    }

    /// Persists the full contents atomically to the configured sidecar.
    pub async fn save(&self) -> Result<(), ChunkError> {
        let persist_path = match &self.persist_path {
            Some(path) => path.clone(),
            None => return Ok(()),
        };

        let snapshot: HashMap<String, FileHashCacheEntry> = {
            let inner = self.inner.lock().await;
            inner.entries.clone()
        };

        let bytes = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| ChunkError::WriteFailed(format!("encoding hash cache: {}", e)))?;

        if let Some(parent) = persist_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ChunkError::WriteFailed(format!("creating {}: {}", parent.display(), e)))?;
        }
        let staging = persist_path.with_extension("staging");
        tokio::fs::write(&staging, &bytes)
            .await
            .map_err(|e| ChunkError::WriteFailed(format!("staging {}: {}", staging.display(), e)))?;
        tokio::fs::rename(&staging, &persist_path)
            .await
            .map_err(|e| ChunkError::WriteFailed(format!("committing {}: {}", persist_path.display(), e)))?;

        debug!(path = %persist_path.display(), entries = snapshot.len(), "saved hash cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        tokio::fs::write(&path, contents).await.unwrap();
        path
    }

    fn entry(path: &str, hash: &str) -> FileHashCacheEntry {
        FileHashCacheEntry {
            path: path.into(),
            hash: hash.into(),
            hash_algorithm: HashAlgorithm::Sha256,
            file_size: 1,
            modification_time: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_compute_then_hit() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.txt", b"hello\n").await;
        let cache = FileHashCache::new(HashAlgorithm::Sha256, 8);

        let first = cache.compute(&path, b"hello\n", HashAlgorithm::Sha256).await.unwrap();
        assert_eq!(first, "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03");

        let second = cache.compute(&path, b"hello\n", HashAlgorithm::Sha256).await.unwrap();
        assert_eq!(second, first);

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_algorithm_mismatch_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.txt", b"x").await;
        let cache = FileHashCache::new(HashAlgorithm::Sha256, 8);
        let err = cache.compute(&path, b"x", HashAlgorithm::Md5).await.unwrap_err();
        assert!(matches!(err, ChunkError::InvalidHashAlgorithm(_)));
    }

    #[tokio::test]
    async fn test_stale_entry_invalidated_by_size_change() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.txt", b"one").await;
        let cache = FileHashCache::new(HashAlgorithm::Sha256, 8);
        cache.compute(&path, b"one", HashAlgorithm::Sha256).await.unwrap();

        // Grow the file; the cached entry no longer matches its size.
        tokio::fs::write(&path, b"one plus more").await.unwrap();
        assert_eq!(cache.get(&path).await, None);
    }

    #[tokio::test]
    async fn test_lru_eviction_order() {
        let cache = FileHashCache::new(HashAlgorithm::Sha256, 3);
        cache.set(entry("/k1", "h1")).await.unwrap();
        cache.set(entry("/k2", "h2")).await.unwrap();
        cache.set(entry("/k3", "h3")).await.unwrap();

        // Promote k1, then push k4; k2 is now the least recently used.
        {
            let mut inner = cache.inner.lock().await;
            inner.touch(&cache_key("/k1", HashAlgorithm::Sha256));
        }
        cache.set(entry("/k4", "h4")).await.unwrap();

        let inner = cache.inner.lock().await;
        let mut keys: Vec<&str> = inner.entries.keys().map(|k| k.as_str()).collect();
        keys.sort();
        assert_eq!(keys, vec!["/k1|sha256", "/k3|sha256", "/k4|sha256"]);
        assert_eq!(inner.evictions, 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_bounded() {
        let cache = Arc::new(FileHashCache::new(HashAlgorithm::Sha256, 16));
        let mut handles = Vec::new();
        for i in 0..64 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.set(entry(&format!("/file{}", i), "h")).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(cache.len().await, 16);
        assert_eq!(cache.stats().await.evictions, 48);
    }

    #[tokio::test]
    async fn test_persistence_roundtrip() {
        let dir = TempDir::new().unwrap();
        let sidecar = dir.path().join(".hashcache.json");
        let file = write_file(&dir, "a.txt", b"hello\n").await;

        {
            let cache = FileHashCache::with_persistence(HashAlgorithm::Sha256, 8, &sidecar).await;
            cache.compute(&file, b"hello\n", HashAlgorithm::Sha256).await.unwrap();
            cache.save().await.unwrap();
        }

        let reloaded = FileHashCache::with_persistence(HashAlgorithm::Sha256, 8, &sidecar).await;
        assert_eq!(reloaded.len().await, 1);
        // Valid entry answers without recomputation.
        assert!(reloaded.get(&file).await.is_some());
        assert_eq!(reloaded.stats().await.hits, 1);
    }

    #[tokio::test]
    async fn test_foreign_algorithm_entries_filtered_on_load() {
        let dir = TempDir::new().unwrap();
        let sidecar = dir.path().join(".hashcache.json");

        let mut contents = HashMap::new();
        let mut md5_entry = entry("/old", "aaaa");
        md5_entry.hash_algorithm = HashAlgorithm::Md5;
        contents.insert(md5_entry.key(), md5_entry);
        let sha_entry = entry("/new", "bbbb");
        contents.insert(sha_entry.key(), sha_entry);
        tokio::fs::write(&sidecar, serde_json::to_vec(&contents).unwrap())
            .await
            .unwrap();

        let cache = FileHashCache::with_persistence(HashAlgorithm::Sha256, 8, &sidecar).await;
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_corrupted_sidecar_starts_empty() {
        let dir = TempDir::new().unwrap();
        let sidecar = dir.path().join(".hashcache.json");
        tokio::fs::write(&sidecar, b"{definitely not json").await.unwrap();

        let cache = FileHashCache::with_persistence(HashAlgorithm::Sha256, 8, &sidecar).await;
        assert_eq!(cache.len().await, 0);
    }
}
