// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Mirrored Tiered Store
//!
//! A composite [`ChunkStore`] spanning one primary backend, any number of
//! mirrors, and any number of glaciers.
//!
//! ## Tier Semantics
//!
//! - **Write**: the primary is written first. A primary failure either
//!   aborts the operation (`fail_on_primary_error`) or is demoted to a
//!   warning on the write report. The same write then fans out concurrently
//!   to every mirror and glacier; their failures are logged and swallowed,
//!   they can never fail the operation. The returned identifier is the
//!   primary's.
//! - **Read**/**size**: probe primary, then mirrors in order, then glaciers
//!   in order; the first backend that has the chunk answers. "Not found" on
//!   a tier is not an error, it just moves the probe along.
//! - **Exists**: true iff any tier has the chunk.
//! - **Delete**: fans out to every tier; the operation succeeds when the
//!   primary delete succeeded and no required tier errored.
//!
//! There is no cross-tier transaction: a read racing a write may see the
//! chunk on the primary before any mirror has it, and cancellation between
//! the primary write and the fan-out leaves mirrors to catch up on the next
//! write of the same chunk.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

use chunkvault_domain::{ChunkError, ChunkId, ChunkMetadata, ChunkStore, VolumeType};

use super::chunk_reader::ChunkReaderBuilder;

/// One backend participating in the tiered store.
#[derive(Clone)]
pub struct TierBackend {
    pub store: Arc<dyn ChunkStore>,
    pub label: String,
    pub required: bool,
    pub volume_type: VolumeType,
}

impl TierBackend {
    pub fn new(
        store: Arc<dyn ChunkStore>,
        label: impl Into<String>,
        volume_type: VolumeType,
    ) -> Self {
        Self {
            store,
            label: label.into(),
            required: false,
            volume_type,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Per-tier outcome of a mirrored write.
#[derive(Debug, Clone, Default)]
pub struct TierWriteReport {
    /// Identifier the chunk was stored under.
    pub id: Option<ChunkId>,
    pub primary_succeeded: bool,
    pub mirror_failures: usize,
    pub glacier_failures: usize,
    /// Human-readable warnings accumulated during the fan-out, including a
    /// demoted primary failure.
    pub warnings: Vec<String>,
}

/// Composite store with primary/mirror/glacier fan-out.
pub struct MirroredChunkStore {
    primary: TierBackend,
    mirrors: Vec<TierBackend>,
    glaciers: Vec<TierBackend>,
    fail_on_primary_error: bool,
}

impl MirroredChunkStore {
    pub fn new(primary: TierBackend) -> Self {
        Self {
            primary,
            mirrors: Vec::new(),
            glaciers: Vec::new(),
            fail_on_primary_error: true,
        }
    }

    pub fn with_mirror(mut self, mirror: TierBackend) -> Self {
        self.mirrors.push(mirror);
        self
    }

    pub fn with_glacier(mut self, glacier: TierBackend) -> Self {
        self.glaciers.push(glacier);
        self
    }

    /// Whether a primary write failure aborts the operation. Defaults to
    /// true.
    pub fn fail_on_primary_error(mut self, fail: bool) -> Self {
        self.fail_on_primary_error = fail;
        self
    }

    pub fn mirror_count(&self) -> usize {
        self.mirrors.len()
    }

    pub fn glacier_count(&self) -> usize {
        self.glaciers.len()
    }

    /// Opens a lazy reader over one chunk, served with tier fallback.
    pub fn reader(self: Arc<Self>, id: &ChunkId) -> ChunkReaderBuilder {
        let store: Arc<dyn ChunkStore> = self;
        ChunkReaderBuilder::new(store, id.clone())
    }

    /// Opens a default-pattern reader handle; `Ok(None)` when no tier has
    /// the chunk.
    pub async fn handle(
        self: Arc<Self>,
        id: &ChunkId,
    ) -> Result<Option<super::chunk_reader::ChunkReader>, ChunkError> {
        self.reader(id).open().await
    }

    /// All tiers in probe order: primary, mirrors, glaciers.
    fn probe_order(&self) -> impl Iterator<Item = &TierBackend> {
        std::iter::once(&self.primary)
            .chain(self.mirrors.iter())
            .chain(self.glaciers.iter())
    }

    /// Writes with a full per-tier report.
    pub async fn write_with_report(
        &self,
        data: &[u8],
        id: &ChunkId,
        metadata: Option<ChunkMetadata>,
    ) -> Result<TierWriteReport, ChunkError> {
        let mut report = TierWriteReport::default();

        match self.primary.store.write(data, id, metadata.clone()).await {
            Ok(written) => {
                report.primary_succeeded = true;
                report.id = Some(written);
            }
            Err(err) => {
                if self.fail_on_primary_error {
                    return Err(err);
                }
                warn!(tier = %self.primary.label, chunk = %id, error = %err, "primary write failed");
                report
                    .warnings
                    .push(format!("primary '{}' write failed: {}", self.primary.label, err));
                report.id = Some(id.clone());
            }
        }

        // Mirror and glacier failures are logged and swallowed; the fan-out
        // itself is concurrent and has no ordering among its members.
        let mirror_writes = join_all(self.mirrors.iter().map(|tier| {
            let meta = metadata.clone();
            async move { (tier, tier.store.write(data, id, meta).await) }
        }));
        let glacier_writes = join_all(self.glaciers.iter().map(|tier| {
            let meta = metadata.clone();
            async move { (tier, tier.store.write(data, id, meta).await) }
        }));
        let (mirror_results, glacier_results) = futures::join!(mirror_writes, glacier_writes);

        for (tier, result) in mirror_results {
            if let Err(err) = result {
                warn!(tier = %tier.label, chunk = %id, error = %err, "mirror write failed");
                report.warnings.push(format!("mirror '{}': {}", tier.label, err));
                report.mirror_failures += 1;
            }
        }
        for (tier, result) in glacier_results {
            if let Err(err) = result {
                warn!(tier = %tier.label, chunk = %id, error = %err, "glacier write failed");
                report.warnings.push(format!("glacier '{}': {}", tier.label, err));
                report.glacier_failures += 1;
            }
        }

        Ok(report)
    }
}

#[async_trait]
impl ChunkStore for MirroredChunkStore {
    async fn write(
        &self,
        data: &[u8],
        id: &ChunkId,
        metadata: Option<ChunkMetadata>,
    ) -> Result<ChunkId, ChunkError> {
        let report = self.write_with_report(data, id, metadata).await?;
        Ok(report.id.unwrap_or_else(|| id.clone()))
    }

    async fn read(&self, id: &ChunkId) -> Result<Option<Vec<u8>>, ChunkError> {
        for tier in self.probe_order() {
            match tier.store.read(id).await? {
                Some(data) => {
                    debug!(tier = %tier.label, chunk = %id, "read served");
                    return Ok(Some(data));
                }
                None => continue,
            }
        }
        Ok(None)
    }

    async fn read_range(
        &self,
        id: &ChunkId,
        offset: u64,
        length: u64,
    ) -> Result<Option<Vec<u8>>, ChunkError> {
        for tier in self.probe_order() {
            match tier.store.read_range(id, offset, length).await? {
                Some(data) => return Ok(Some(data)),
                None => continue,
            }
        }
        Ok(None)
    }

    async fn update(
        &self,
        data: &[u8],
        id: &ChunkId,
        metadata: Option<ChunkMetadata>,
    ) -> Result<ChunkId, ChunkError> {
        let written = self.primary.store.update(data, id, metadata.clone()).await?;

        let updates = self.mirrors.iter().chain(self.glaciers.iter()).map(|tier| {
            let meta = metadata.clone();
            async move { (tier, tier.store.update(data, id, meta).await) }
        });
        for (tier, result) in join_all(updates).await {
            if let Err(err) = result {
                warn!(tier = %tier.label, chunk = %id, error = %err, "tier update failed");
            }
        }
        Ok(written)
    }

    async fn delete(&self, id: &ChunkId) -> Result<(), ChunkError> {
        let primary_result = self.primary.store.delete(id).await;

        let mut required_failures = Vec::new();
        let deletes = self
            .mirrors
            .iter()
            .chain(self.glaciers.iter())
            .map(|tier| async move { (tier, tier.store.delete(id).await) });
        for (tier, result) in join_all(deletes).await {
            if let Err(err) = result {
                warn!(tier = %tier.label, chunk = %id, error = %err, "tier delete failed");
                if tier.required {
                    required_failures.push(format!("'{}': {}", tier.label, err));
                }
            }
        }

        primary_result?;
        if !required_failures.is_empty() {
            return Err(ChunkError::DeleteFailed(format!(
                "required tiers failed to delete chunk {}: {}",
                id,
                required_failures.join(", ")
            )));
        }
        Ok(())
    }

    async fn exists(&self, id: &ChunkId) -> Result<bool, ChunkError> {
        for tier in self.probe_order() {
            match tier.store.exists(id).await {
                Ok(true) => return Ok(true),
                Ok(false) => continue,
                Err(err) => {
                    if tier.volume_type == VolumeType::Primary && self.fail_on_primary_error {
                        return Err(err);
                    }
                    warn!(tier = %tier.label, chunk = %id, error = %err, "existence probe failed");
                }
            }
        }
        Ok(false)
    }

    async fn size(&self, id: &ChunkId) -> Result<Option<u64>, ChunkError> {
        for tier in self.probe_order() {
            match tier.store.size(id).await? {
                Some(size) => return Ok(Some(size)),
                None => continue,
            }
        }
        Ok(None)
    }

    async fn metadata(&self, id: &ChunkId) -> Result<Option<ChunkMetadata>, ChunkError> {
        for tier in self.probe_order() {
            match tier.store.metadata(id).await? {
                Some(meta) => return Ok(Some(meta)),
                None => continue,
            }
        }
        Ok(None)
    }
}
