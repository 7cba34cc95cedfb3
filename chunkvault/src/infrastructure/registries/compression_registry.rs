// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Compression Adapter Registry
//!
//! Maps compression formats to the adapters that can rehydrate them.
//! Adapters are selected by format, by filename extension, or by probing
//! their `can_handle` predicate against payload bytes; probing is explicit
//! and result-bearing, never try-and-catch.
//!
//! A process-wide registry initialized with the built-in adapters is
//! available through [`CompressionAdapterRegistry::global`]. Registration is
//! a startup-time operation; tests that register their own adapters call
//! [`CompressionAdapterRegistry::reset_to_builtins`] to avoid leaking state
//! across each other.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use chunkvault_domain::ChunkError;

use crate::infrastructure::adapters::compression_adapters::builtin_compression_adapters;

/// The compression formats the engine can rehydrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionFormat {
    Gzip,
    Zstd,
    Brotli,
    Tar,
}

impl fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompressionFormat::Gzip => "gzip",
            CompressionFormat::Zstd => "zstd",
            CompressionFormat::Brotli => "brotli",
            CompressionFormat::Tar => "tar",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for CompressionFormat {
    type Err = ChunkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gzip" | "gz" => Ok(CompressionFormat::Gzip),
            "zstd" | "zst" => Ok(CompressionFormat::Zstd),
            "brotli" | "br" => Ok(CompressionFormat::Brotli),
            "tar" => Ok(CompressionFormat::Tar),
            other => Err(ChunkError::CompressionError(format!(
                "unknown compression format '{}'",
                other
            ))),
        }
    }
}

/// A decompression adapter for one format.
pub trait CompressionAdapter: Send + Sync {
    fn format(&self) -> CompressionFormat;

    /// Extensions this adapter claims, lowercase without dots.
    fn extensions(&self) -> &[&str];

    /// Cheap content probe; false for data this adapter cannot identify.
    fn can_handle(&self, data: &[u8]) -> bool;

    /// Rehydrates `data` into the contained bytes.
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, ChunkError>;
}

/// Registry of compression adapters keyed by format.
pub struct CompressionAdapterRegistry {
    adapters: RwLock<HashMap<CompressionFormat, Arc<dyn CompressionAdapter>>>,
}

impl CompressionAdapterRegistry {
    /// An empty registry; tests compose their own.
    pub fn empty() -> Self {
        Self {
            adapters: RwLock::new(HashMap::new()),
        }
    }

    /// A registry holding the built-in gzip, zstd, brotli, and tar adapters.
    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        for adapter in builtin_compression_adapters() {
            registry.register(adapter);
        }
        registry
    }

    /// The process-wide registry, initialized once with the builtins.
    pub fn global() -> &'static CompressionAdapterRegistry {
        static GLOBAL: Lazy<CompressionAdapterRegistry> = Lazy::new(CompressionAdapterRegistry::with_builtins);
        &GLOBAL
    }

    /// Registers an adapter, replacing any previous one for the format.
    pub fn register(&self, adapter: Arc<dyn CompressionAdapter>) {
        self.adapters.write().insert(adapter.format(), adapter);
    }

    /// Test hook: restores the registry to its built-in contents.
    pub fn reset_to_builtins(&self) {
        let mut adapters = self.adapters.write();
        adapters.clear();
        for adapter in builtin_compression_adapters() {
            adapters.insert(adapter.format(), adapter);
        }
    }

    pub fn by_format(&self, format: CompressionFormat) -> Option<Arc<dyn CompressionAdapter>> {
        self.adapters.read().get(&format).cloned()
    }

    /// Looks up by filename extension, case-insensitive and dot-agnostic.
    pub fn by_extension(&self, extension: &str) -> Option<Arc<dyn CompressionAdapter>> {
        let wanted = extension.trim_start_matches('.').to_ascii_lowercase();
        self.adapters
            .read()
            .values()
            .find(|a| a.extensions().contains(&wanted.as_str()))
            .cloned()
    }

    /// Looks up by the extension of `path`.
    pub fn by_path(&self, path: &Path) -> Option<Arc<dyn CompressionAdapter>> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| self.by_extension(e))
    }

    /// Probes every adapter's `can_handle` predicate against `data`.
    pub fn probe(&self, data: &[u8]) -> Option<Arc<dyn CompressionAdapter>> {
        self.adapters
            .read()
            .values()
            .find(|a| a.can_handle(data))
            .cloned()
    }

    /// Finds an adapter for `path`, preferring the content probe over the
    /// extension when payload bytes are available.
    pub fn detect(&self, path: &Path, data: Option<&[u8]>) -> Option<Arc<dyn CompressionAdapter>> {
        if let Some(data) = data {
            if let Some(adapter) = self.probe(data) {
                return Some(adapter);
            }
        }
        self.by_path(path)
    }

    pub fn len(&self) -> usize {
        self.adapters.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
