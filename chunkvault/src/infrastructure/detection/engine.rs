// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Detection Engine
//!
//! Classifies bytes and filenames against the file-type registry. Strategies
//! run in strict priority order: an anchored magic-number match beats an
//! extension match, which beats a conformance query. Unknown input yields
//! `None`, never a panic; the engine is a total function over arbitrary
//! bytes.

use std::path::Path;

use chunkvault_domain::{DetectionResult, DetectionStrategy};

use crate::infrastructure::registries::file_type_registry::FileTypeRegistry;

/// Registry-driven file type detection.
pub struct DetectionEngine<'a> {
    registry: &'a FileTypeRegistry,
}

impl<'a> DetectionEngine<'a> {
    pub fn new(registry: &'a FileTypeRegistry) -> Self {
        Self { registry }
    }

    /// An engine over the process-wide registry.
    pub fn with_global_registry() -> DetectionEngine<'static> {
        DetectionEngine {
            registry: FileTypeRegistry::global(),
        }
    }

    /// Detects a file type from payload bytes and/or a filename extension.
    ///
    /// Magic numbers are consulted first, extensions second. `None` means no
    /// registered type claimed the input.
    pub fn detect(&self, data: Option<&[u8]>, extension: Option<&str>) -> Option<DetectionResult> {
        if let Some(data) = data {
            for descriptor in self.registry.all() {
                if descriptor.matches_magic(data) {
                    return Some(DetectionResult::new(descriptor, DetectionStrategy::MagicNumber));
                }
            }
        }

        if let Some(extension) = extension {
            if let Some(descriptor) = self.registry.by_extension(extension) {
                return Some(DetectionResult::new(descriptor, DetectionStrategy::Extension));
            }
        }

        None
    }

    /// Detects using a path's extension together with payload bytes.
    pub fn detect_path(&self, path: &Path, data: Option<&[u8]>) -> Option<DetectionResult> {
        let extension = path.extension().and_then(|e| e.to_str());
        self.detect(data, extension)
    }

    /// Every registered type conforming to `parent`, as conformance-strategy
    /// results.
    pub fn detect_by_conformance(&self, parent: &str) -> Vec<DetectionResult> {
        self.registry
            .conforming_to(parent)
            .into_iter()
            .map(|descriptor| DetectionResult::new(descriptor, DetectionStrategy::Conformance))
            .collect()
    }
}
