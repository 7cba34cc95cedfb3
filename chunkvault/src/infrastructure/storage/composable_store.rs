// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Composable Chunk Store
//!
//! The assembled single-backend store: an organization strategy maps
//! identifiers to relative paths, a retrieval component performs the byte
//! I/O, and an existence component answers presence probes. The three are
//! injected, so tests and exotic backends swap any of them independently.
//!
//! ## Write Path
//!
//! Writes are at-most-once per identifier. When the payload already exists
//! the bytes are left untouched (the identifier scheme guarantees they are
//! byte-identical once validation passed), and only the sidecar is merged:
//! source paths union, timestamps widen, payload facts stay with the first
//! writer. Per-identifier serialization goes through an internal async lock
//! table, so two concurrent writers of the same chunk cannot interleave
//! payload and sidecar updates. The lock is released at the end of each
//! operation; cancellation at any await point drops it with the guard.
//!
//! ## Verification
//!
//! With `verify_hash` enabled (the default), writes must hash to their
//! identifier and reads recompute the digest before returning bytes. A
//! mismatch on read reports both the mismatch and the corruption; callers
//! that need the raw bytes anyway (salvage tooling) use
//! [`ComposableChunkStore::read_with_validation`] which hands back the data
//! together with the full validation result instead of failing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use chunkvault_domain::services::chunk_validator::{validate_read, validate_write};
use chunkvault_domain::{
    ChunkError, ChunkExistence, ChunkId, ChunkMetadata, ChunkRetrieval, ChunkStore, ChunkType,
    HashAlgorithm, OrganizationStrategy, ValidationConfig, ValidationResult,
};

use super::chunk_reader::ChunkReaderBuilder;
use super::filesystem::{FilesystemExistence, FilesystemRetrieval};

/// Sidecar path of a chunk payload path: same path plus `.meta`.
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_os_string();
    os.push(".meta");
    PathBuf::from(os)
}

/// A chunk store assembled from injectable collaborators.
pub struct ComposableChunkStore {
    organization: Arc<dyn OrganizationStrategy>,
    retrieval: Arc<dyn ChunkRetrieval>,
    existence: Arc<dyn ChunkExistence>,
    validation: ValidationConfig,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ComposableChunkStore {
    pub fn new(
        organization: Arc<dyn OrganizationStrategy>,
        retrieval: Arc<dyn ChunkRetrieval>,
        existence: Arc<dyn ChunkExistence>,
    ) -> Self {
        Self {
            organization,
            retrieval,
            existence,
            validation: ValidationConfig::default(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// A store over a local directory with the given organization.
    pub fn filesystem(base: impl Into<PathBuf>, organization: Arc<dyn OrganizationStrategy>) -> Self {
        let base = base.into();
        Self::new(
            organization,
            Arc::new(FilesystemRetrieval::new(base.clone())),
            Arc::new(FilesystemExistence::new(base)),
        )
    }

    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }

    pub fn validation(&self) -> &ValidationConfig {
        &self.validation
    }

    /// Opens a lazy reader over one chunk of this store.
    pub fn reader(self: Arc<Self>, id: &ChunkId) -> ChunkReaderBuilder {
        let store: Arc<dyn ChunkStore> = self;
        ChunkReaderBuilder::new(store, id.clone())
    }

    /// Opens a default-pattern reader handle; `Ok(None)` when the chunk does
    /// not exist.
    pub async fn handle(
        self: Arc<Self>,
        id: &ChunkId,
    ) -> Result<Option<super::chunk_reader::ChunkReader>, ChunkError> {
        self.reader(id).open().await
    }

    async fn chunk_lock(&self, id: &ChunkId) -> Arc<Mutex<()>> {
        let mut table = self.locks.lock().await;
        table
            .entry(id.as_str().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn read_sidecar(&self, payload_path: &Path) -> Result<Option<ChunkMetadata>, ChunkError> {
        let meta_path = sidecar_path(payload_path);
        match self.retrieval.read_at(&meta_path).await? {
            Some(bytes) => {
                let meta: ChunkMetadata = serde_json::from_slice(&bytes).map_err(|e| {
                    ChunkError::InvalidMetadata(format!(
                        "sidecar {} is not valid metadata: {}",
                        meta_path.display(),
                        e
                    ))
                })?;
                Ok(Some(meta))
            }
            None => Ok(None),
        }
    }

    async fn write_sidecar(&self, payload_path: &Path, metadata: &ChunkMetadata) -> Result<(), ChunkError> {
        let bytes = serde_json::to_vec_pretty(metadata)
            .map_err(|e| ChunkError::InvalidMetadata(format!("encoding sidecar: {}", e)))?;
        self.retrieval.write_at(&sidecar_path(payload_path), &bytes).await
    }

    /// A minimal metadata record for writes that did not supply one.
    fn derive_metadata(id: &ChunkId, data: &[u8]) -> ChunkMetadata {
        let algorithm = id.implied_algorithm().unwrap_or(HashAlgorithm::Sha256);
        ChunkMetadata::new(data.len() as u64, algorithm, ChunkType::File)
            .with_content_hash(id.as_str())
    }

    /// Merges `incoming` into the sidecar at `payload_path`, creating it if
    /// absent, and returns the record now on disk.
    async fn merge_sidecar(
        &self,
        payload_path: &Path,
        incoming: ChunkMetadata,
    ) -> Result<ChunkMetadata, ChunkError> {
        let merged = match self.read_sidecar(payload_path).await {
            Ok(Some(mut existing)) => {
                existing.merge(&incoming);
                existing
            }
            Ok(None) => incoming,
            Err(err) => {
                // A sidecar that no longer parses carries no information worth
                // preserving; start over from the incoming record.
                warn!(error = %err, path = %payload_path.display(), "replacing unreadable sidecar");
                incoming
            }
        };
        self.write_sidecar(payload_path, &merged).await?;
        Ok(merged)
    }

    fn surface(result: &ValidationResult, id: &ChunkId) {
        for warning in &result.warnings {
            warn!(chunk = %id, "{}", warning);
        }
    }

    /// Reads a chunk and returns the bytes together with the verification
    /// outcome instead of failing on mismatch.
    pub async fn read_with_validation(
        &self,
        id: &ChunkId,
    ) -> Result<Option<(Vec<u8>, ValidationResult)>, ChunkError> {
        let path = self.organization.build(id)?;
        let data = match self.retrieval.read_at(&path).await? {
            Some(data) => data,
            None => return Ok(None),
        };
        let metadata = self.read_sidecar(&path).await.ok().flatten();
        let result = validate_read(id, &data, metadata.as_ref(), &self.validation);
        Self::surface(&result, id);
        Ok(Some((data, result)))
    }
}

#[async_trait]
impl ChunkStore for ComposableChunkStore {
    async fn write(
        &self,
        data: &[u8],
        id: &ChunkId,
        metadata: Option<ChunkMetadata>,
    ) -> Result<ChunkId, ChunkError> {
        let result = validate_write(id, data, metadata.as_ref(), &self.validation);
        Self::surface(&result, id);
        if let Some(error) = result.into_error() {
            return Err(error);
        }

        let path = self.organization.build(id)?;
        let lock = self.chunk_lock(id).await;
        let _guard = lock.lock().await;

        if self.existence.exists_at(&path).await? {
            debug!(chunk = %id, "payload already stored, merging metadata only");
        } else {
            self.retrieval.write_at(&path, data).await?;
        }

        let incoming = metadata.unwrap_or_else(|| Self::derive_metadata(id, data));
        self.merge_sidecar(&path, incoming).await?;
        Ok(id.clone())
    }

    async fn read(&self, id: &ChunkId) -> Result<Option<Vec<u8>>, ChunkError> {
        match self.read_with_validation(id).await? {
            Some((data, result)) => {
                if let Some(error) = result.into_error() {
                    return Err(error);
                }
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    async fn read_range(
        &self,
        id: &ChunkId,
        offset: u64,
        length: u64,
    ) -> Result<Option<Vec<u8>>, ChunkError> {
        let path = self.organization.build(id)?;
        self.retrieval.read_range_at(&path, offset, length).await
    }

    async fn update(
        &self,
        data: &[u8],
        id: &ChunkId,
        metadata: Option<ChunkMetadata>,
    ) -> Result<ChunkId, ChunkError> {
        let path = self.organization.build(id)?;
        let lock = self.chunk_lock(id).await;
        let _guard = lock.lock().await;

        if !self.existence.exists_at(&path).await? {
            return Err(ChunkError::ChunkNotFound(id.as_str().to_string()));
        }

        // An update may only replace the payload with bytes that still hash
        // to the identifier; anything else would corrupt the store.
        let algorithm = match self.read_sidecar(&path).await.ok().flatten() {
            Some(meta) => meta.hash_algorithm,
            None => id.implied_algorithm().unwrap_or(HashAlgorithm::Sha256),
        };
        let actual = algorithm.digest_hex(data);
        if actual != id.as_str() {
            return Err(ChunkError::CorruptedData(format!(
                "update of chunk {} with payload hashing to {}",
                id, actual
            )));
        }

        self.retrieval.write_at(&path, data).await?;
        let incoming = metadata.unwrap_or_else(|| Self::derive_metadata(id, data));
        self.merge_sidecar(&path, incoming).await?;
        Ok(id.clone())
    }

    async fn delete(&self, id: &ChunkId) -> Result<(), ChunkError> {
        let path = self.organization.build(id)?;
        let lock = self.chunk_lock(id).await;
        let _guard = lock.lock().await;

        self.retrieval.delete_at(&path).await?;
        self.retrieval.delete_at(&sidecar_path(&path)).await?;
        Ok(())
    }

    async fn exists(&self, id: &ChunkId) -> Result<bool, ChunkError> {
        let path = self.organization.build(id)?;
        self.existence.exists_at(&path).await
    }

    async fn size(&self, id: &ChunkId) -> Result<Option<u64>, ChunkError> {
        let path = self.organization.build(id)?;
        self.retrieval.size_at(&path).await
    }

    async fn metadata(&self, id: &ChunkId) -> Result<Option<ChunkMetadata>, ChunkError> {
        let path = self.organization.build(id)?;
        self.read_sidecar(&path).await
    }
}
