// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Archive Manifest
//!
//! The manifest is the single JSON document an archive run produces: one
//! entry per source tree entry, in walk order, with the chunk identifier for
//! everything that has a payload. Extraction replays the manifest against
//! the store to reconstruct the tree.
//!
//! Entries use lower camelCase field names and ISO-8601 dates; there is no
//! global checksum, integrity lives with the per-chunk hashes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::chunk_type::ChunkType;
use crate::services::datetime_serde;
use crate::ChunkError;

/// One entry of the archive manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Path relative to the archive root, `/`-separated.
    pub path: String,

    #[serde(rename = "type")]
    pub entry_type: ChunkType,

    /// Chunk identifier; present for files and specials.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hash: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub size: Option<u64>,

    /// Unix permission bits.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub permissions: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub owner: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub group: Option<u32>,

    #[serde(
        with = "datetime_serde::optional",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub modified: Option<DateTime<Utc>>,

    #[serde(
        with = "datetime_serde::optional",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub created: Option<DateTime<Utc>>,

    /// Link target; symlinks only.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub symlink_target: Option<String>,
}

impl ManifestEntry {
    pub fn new(path: impl Into<String>, entry_type: ChunkType) -> Self {
        Self {
            path: path.into(),
            entry_type,
            hash: None,
            size: None,
            permissions: None,
            owner: None,
            group: None,
            modified: None,
            created: None,
            symlink_target: None,
        }
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_permissions(mut self, mode: u32) -> Self {
        self.permissions = Some(mode);
        self
    }

    pub fn with_ownership(mut self, owner: u32, group: u32) -> Self {
        self.owner = Some(owner);
        self.group = Some(group);
        self
    }

    pub fn with_symlink_target(mut self, target: impl Into<String>) -> Self {
        self.symlink_target = Some(target.into());
        self
    }
}

/// The archive manifest document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchiveManifest {
    pub entries: Vec<ManifestEntry>,
}

impl ArchiveManifest {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn push(&mut self, entry: ManifestEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries referencing the given chunk identifier.
    pub fn entries_for_chunk(&self, id: &str) -> Vec<&ManifestEntry> {
        self.entries
            .iter()
            .filter(|e| e.hash.as_deref() == Some(id))
            .collect()
    }

    pub fn to_json(&self) -> Result<String, ChunkError> {
        serde_json::to_string_pretty(self).map_err(ChunkError::from)
    }

    pub fn from_json(json: &str) -> Result<Self, ChunkError> {
        serde_json::from_str(json).map_err(ChunkError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_json_shape() {
        let entry = ManifestEntry::new("a/x.txt", ChunkType::File)
            .with_hash("ab".repeat(32))
            .with_size(6)
            .with_permissions(0o644);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"type\":\"file\""));
        assert!(json.contains("\"path\":\"a/x.txt\""));
        assert!(!json.contains("symlinkTarget"));
    }

    #[test]
    fn test_manifest_roundtrip() {
        let mut manifest = ArchiveManifest::new();
        manifest.push(ManifestEntry::new("a", ChunkType::Directory));
        manifest.push(
            ManifestEntry::new("a/x.txt", ChunkType::File)
                .with_hash("cd".repeat(32))
                .with_size(6),
        );
        manifest.push(ManifestEntry::new("a/link", ChunkType::Symlink).with_symlink_target("x.txt"));

        let json = manifest.to_json().unwrap();
        let back = ArchiveManifest::from_json(&json).unwrap();
        assert_eq!(back, manifest);
        assert_eq!(back.entries_for_chunk(&"cd".repeat(32)).len(), 1);
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(ArchiveManifest::from_json("{not json").is_err());
    }
}
