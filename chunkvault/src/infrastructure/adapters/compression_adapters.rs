// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Built-in Compression Adapters
//!
//! Concrete [`CompressionAdapter`] implementations over the gzip, zstd,
//! brotli, and tar formats. Each adapter pairs a cheap `can_handle` content
//! probe with a full decompression routine; the registry drives selection,
//! these types only do the byte work.
//!
//! Brotli has no magic number, so its probe always declines and selection
//! falls back to the extension. The tar adapter rehydrates the archive's
//! file contents in entry order, which for the single-file archives the
//! nested-compression stage deals with is exactly the contained file.

use std::io::Read;
use std::sync::Arc;

use chunkvault_domain::ChunkError;

use crate::infrastructure::registries::compression_registry::{CompressionAdapter, CompressionFormat};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];
const TAR_MAGIC_OFFSET: usize = 257;
const TAR_MAGIC: &[u8] = b"ustar";

/// All built-in adapters, for registry initialization.
pub fn builtin_compression_adapters() -> Vec<Arc<dyn CompressionAdapter>> {
    vec![
        Arc::new(GzipAdapter),
        Arc::new(ZstdAdapter),
        Arc::new(BrotliAdapter),
        Arc::new(TarAdapter),
    ]
}

/// Gzip rehydration via flate2.
pub struct GzipAdapter;

impl CompressionAdapter for GzipAdapter {
    fn format(&self) -> CompressionFormat {
        CompressionFormat::Gzip
    }

    fn extensions(&self) -> &[&str] {
        &["gz", "gzip"]
    }

    fn can_handle(&self, data: &[u8]) -> bool {
        data.len() >= GZIP_MAGIC.len() && data[..GZIP_MAGIC.len()] == GZIP_MAGIC
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, ChunkError> {
        let mut output = Vec::new();
        let mut decoder = flate2::read::GzDecoder::new(data);
        decoder
            .read_to_end(&mut output)
            .map_err(|e| ChunkError::CompressionError(format!("gzip decompression failed: {}", e)))?;
        Ok(output)
    }
}

/// Zstandard rehydration.
pub struct ZstdAdapter;

impl CompressionAdapter for ZstdAdapter {
    fn format(&self) -> CompressionFormat {
        CompressionFormat::Zstd
    }

    fn extensions(&self) -> &[&str] {
        &["zst", "zstd"]
    }

    fn can_handle(&self, data: &[u8]) -> bool {
        data.len() >= ZSTD_MAGIC.len() && data[..ZSTD_MAGIC.len()] == ZSTD_MAGIC
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, ChunkError> {
        zstd::stream::decode_all(data)
            .map_err(|e| ChunkError::CompressionError(format!("zstd decompression failed: {}", e)))
    }
}

/// Brotli rehydration. No magic number exists, selection is by extension.
pub struct BrotliAdapter;

impl CompressionAdapter for BrotliAdapter {
    fn format(&self) -> CompressionFormat {
        CompressionFormat::Brotli
    }

    fn extensions(&self) -> &[&str] {
        &["br", "brotli"]
    }

    fn can_handle(&self, _data: &[u8]) -> bool {
        false
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, ChunkError> {
        let mut output = Vec::new();
        let mut decompressor = brotli::Decompressor::new(data, 4096);
        decompressor
            .read_to_end(&mut output)
            .map_err(|e| ChunkError::CompressionError(format!("brotli decompression failed: {}", e)))?;
        Ok(output)
    }
}

/// Tar rehydration: concatenated contents of the archive's regular files.
pub struct TarAdapter;

impl CompressionAdapter for TarAdapter {
    fn format(&self) -> CompressionFormat {
        CompressionFormat::Tar
    }

    fn extensions(&self) -> &[&str] {
        &["tar"]
    }

    fn can_handle(&self, data: &[u8]) -> bool {
        data.len() >= TAR_MAGIC_OFFSET + TAR_MAGIC.len()
            && &data[TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + TAR_MAGIC.len()] == TAR_MAGIC
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, ChunkError> {
        let mut archive = tar::Archive::new(data);
        let mut output = Vec::new();
        let entries = archive
            .entries()
            .map_err(|e| ChunkError::CompressionError(format!("tar read failed: {}", e)))?;
        for entry in entries {
            let mut entry =
                entry.map_err(|e| ChunkError::CompressionError(format!("tar entry failed: {}", e)))?;
            if entry.header().entry_type().is_file() {
                entry
                    .read_to_end(&mut output)
                    .map_err(|e| ChunkError::CompressionError(format!("tar entry read failed: {}", e)))?;
            }
        }
        Ok(output)
    }
}
