// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Compression Pipeline Stages
//!
//! Named stages over a shared [`PipelineContext`]. A stage inspects the
//! context, does its work, and records results in the side channel; a stage
//! failure is appended to the context's error list and the remaining stages
//! still run. Pipelines compose by name, and two pipelines chain into one
//! whose execution is their sequential execution over the same context.
//!
//! Built-in stages:
//!
//! - [`DecompressionStage`]: finds a compression adapter for the input and
//!   rehydrates it to a scratch file, recording `compression_format` and
//!   `decompressed_url`. No adapter found means no-op.
//! - [`NestedCompressionStage`]: re-runs detection on the decompressed
//!   artifact (a tar inside a gzip being the classic case), rehydrates the
//!   inner layer, and records `nested_compression_format`,
//!   `final_decompressed_url`, and `nested_compression_processed`.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use chunkvault_domain::ChunkError;

use super::context::{keys, PipelineContext};
use crate::infrastructure::registries::compression_registry::{
    CompressionAdapter, CompressionAdapterRegistry,
};

/// One named processing step over a pipeline context.
#[async_trait]
pub trait PipelineStage: Send + Sync {
    fn name(&self) -> &str;

    async fn process(&self, ctx: &mut PipelineContext) -> Result<(), ChunkError>;
}

/// A named sequence of stages.
pub struct Pipeline {
    name: String,
    stages: Vec<Arc<dyn PipelineStage>>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    /// The standard decompression pipeline: outer layer, then nested layer.
    pub fn standard() -> Self {
        Self::new("decompression")
            .with_stage(Arc::new(DecompressionStage::new()))
            .with_stage(Arc::new(NestedCompressionStage::new()))
    }

    pub fn with_stage(mut self, stage: Arc<dyn PipelineStage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Chains two pipelines into one executing both in order.
    pub fn chain(mut self, other: Pipeline) -> Pipeline {
        self.name = format!("{}+{}", self.name, other.name);
        self.stages.extend(other.stages);
        self
    }

    /// Runs every stage over `ctx`. Stage failures are recorded on the
    /// context; they never abort the remaining stages.
    pub async fn process(&self, ctx: &mut PipelineContext) {
        for stage in &self.stages {
            debug!(pipeline = %self.name, stage = %stage.name(), "running stage");
            if let Err(error) = stage.process(ctx).await {
                warn!(pipeline = %self.name, stage = %stage.name(), error = %error, "stage failed");
                ctx.record_error(error);
            }
        }
    }
}

async fn decompress_off_thread(
    adapter: Arc<dyn CompressionAdapter>,
    data: Vec<u8>,
) -> Result<Vec<u8>, ChunkError> {
    tokio::task::spawn_blocking(move || adapter.decompress(&data))
        .await
        .map_err(|e| ChunkError::CompressionError(format!("decompression task failed: {}", e)))?
}

/// Rehydrates the outer compression layer of the input.
pub struct DecompressionStage;

impl DecompressionStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DecompressionStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PipelineStage for DecompressionStage {
    fn name(&self) -> &str {
        "decompression"
    }

    async fn process(&self, ctx: &mut PipelineContext) -> Result<(), ChunkError> {
        let input_path = ctx.input_path().to_path_buf();
        let data = tokio::fs::read(&input_path)
            .await
            .map_err(|e| ChunkError::ReadFailed(format!("reading {}: {}", input_path.display(), e)))?;

        let registry = CompressionAdapterRegistry::global();
        let adapter = match registry.detect(&input_path, Some(&data)) {
            Some(adapter) => adapter,
            None => {
                debug!(input = %input_path.display(), "no compression adapter claims the input");
                return Ok(());
            }
        };
        let format = adapter.format();

        let decompressed = decompress_off_thread(adapter, data).await?;

        let scratch = ctx.new_scratch_path()?;
        tokio::fs::write(&scratch, &decompressed)
            .await
            .map_err(|e| ChunkError::WriteFailed(format!("writing {}: {}", scratch.display(), e)))?;

        ctx.set_text(keys::COMPRESSION_FORMAT, format.to_string());
        ctx.set_path(keys::DECOMPRESSED_URL, scratch);
        Ok(())
    }
}

/// Rehydrates a compression layer nested inside the decompressed artifact.
pub struct NestedCompressionStage;

impl NestedCompressionStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NestedCompressionStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PipelineStage for NestedCompressionStage {
    fn name(&self) -> &str {
        "nested-compression"
    }

    async fn process(&self, ctx: &mut PipelineContext) -> Result<(), ChunkError> {
        let decompressed_path = match ctx.path(keys::DECOMPRESSED_URL) {
            Some(path) => path.to_path_buf(),
            None => return Ok(()),
        };

        let data = tokio::fs::read(&decompressed_path).await.map_err(|e| {
            ChunkError::ReadFailed(format!("reading {}: {}", decompressed_path.display(), e))
        })?;

        // Scratch files carry no meaningful extension; only the content
        // probe can identify the nested layer.
        let adapter = match CompressionAdapterRegistry::global().probe(&data) {
            Some(adapter) => adapter,
            None => return Ok(()),
        };
        let format = adapter.format();

        let rehydrated = decompress_off_thread(adapter, data).await?;

        let scratch = ctx.new_scratch_path()?;
        tokio::fs::write(&scratch, &rehydrated)
            .await
            .map_err(|e| ChunkError::WriteFailed(format!("writing {}: {}", scratch.display(), e)))?;

        ctx.set_text(keys::NESTED_COMPRESSION_FORMAT, format.to_string());
        ctx.set_path(keys::FINAL_DECOMPRESSED_URL, scratch);
        ctx.set_flag(keys::NESTED_COMPRESSION_PROCESSED, true);
        Ok(())
    }
}
