// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Disk Image Adapter Registry
//!
//! Registry of disk-image format adapters. The actual wire-level parsers for
//! specific formats live outside the core; what the registry owns is the
//! selection protocol: which format claims a file, and how to obtain an
//! adapter instance for its bytes.
//!
//! Selection is a two-step `lookup → instantiate(with data)` protocol:
//! [`DiskImageRegistry::lookup`] answers "is this format registered" with a
//! descriptor and never touches payload bytes, while
//! [`DiskImageRegistry::instantiate`] builds an adapter over concrete data
//! and fails with a real error when the data is not readable as that format.
//! Absence and not-instantiable are distinct outcomes.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chunkvault_domain::ChunkError;

use crate::infrastructure::adapters::disk_image_adapters::builtin_disk_image_entries;

/// Registration record of a disk-image format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskImageDescriptor {
    /// Format key, e.g. `"iso9660"`.
    pub format: String,
    /// Extensions the format claims, lowercase without dots.
    pub extensions: Vec<String>,
}

/// An adapter instantiated over one image's bytes.
pub trait DiskImageAdapter: Send + Sync {
    fn descriptor(&self) -> &DiskImageDescriptor;

    /// Human-readable volume name, when the format records one.
    fn volume_name(&self) -> Option<String>;

    /// Total payload size of the image contents.
    fn content_size(&self) -> u64;
}

/// Factory building an adapter over concrete image bytes.
pub type DiskImageFactory =
    Arc<dyn Fn(&[u8]) -> Result<Arc<dyn DiskImageAdapter>, ChunkError> + Send + Sync>;

/// Probe deciding whether bytes look like this format.
pub type DiskImageProbe = Arc<dyn Fn(&[u8]) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct DiskImageEntry {
    pub descriptor: DiskImageDescriptor,
    pub probe: DiskImageProbe,
    pub factory: DiskImageFactory,
}

/// Registry of disk-image formats.
pub struct DiskImageRegistry {
    entries: RwLock<HashMap<String, DiskImageEntry>>,
}

impl DiskImageRegistry {
    pub fn empty() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        for entry in builtin_disk_image_entries() {
            registry.register(entry);
        }
        registry
    }

    /// The process-wide registry, initialized once with the builtins.
    pub fn global() -> &'static DiskImageRegistry {
        static GLOBAL: Lazy<DiskImageRegistry> = Lazy::new(DiskImageRegistry::with_builtins);
        &GLOBAL
    }

    pub fn register(&self, entry: DiskImageEntry) {
        self.entries
            .write()
            .insert(entry.descriptor.format.clone(), entry);
    }

    /// Test hook: restores the registry to its built-in contents.
    pub fn reset_to_builtins(&self) {
        let mut entries = self.entries.write();
        entries.clear();
        for entry in builtin_disk_image_entries() {
            entries.insert(entry.descriptor.format.clone(), entry);
        }
    }

    /// Step one: is this format registered? Never touches payload bytes.
    pub fn lookup(&self, format: &str) -> Option<DiskImageDescriptor> {
        self.entries.read().get(format).map(|e| e.descriptor.clone())
    }

    /// Step two: builds an adapter over `data` for a registered format.
    pub fn instantiate(&self, format: &str, data: &[u8]) -> Result<Arc<dyn DiskImageAdapter>, ChunkError> {
        let factory = {
            let entries = self.entries.read();
            let entry = entries.get(format).ok_or_else(|| {
                ChunkError::InvalidConfiguration(format!("disk image format '{}' is not registered", format))
            })?;
            entry.factory.clone()
        };
        factory(data)
    }

    /// Finds the registered format claiming `extension`.
    pub fn by_extension(&self, extension: &str) -> Option<DiskImageDescriptor> {
        let wanted = extension.trim_start_matches('.').to_ascii_lowercase();
        self.entries
            .read()
            .values()
            .find(|e| e.descriptor.extensions.iter().any(|x| *x == wanted))
            .map(|e| e.descriptor.clone())
    }

    /// Finds the registered format claiming the extension of `path`.
    pub fn by_path(&self, path: &Path) -> Option<DiskImageDescriptor> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| self.by_extension(e))
    }

    /// Probes every registered format's `can_read` predicate against `data`.
    pub fn probe(&self, data: &[u8]) -> Option<DiskImageDescriptor> {
        self.entries
            .read()
            .values()
            .find(|e| (e.probe)(data))
            .map(|e| e.descriptor.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
