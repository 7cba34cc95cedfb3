// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Chunk type classification.
//!
//! Every chunk and every manifest entry carries one of these kinds. Regular
//! payload-bearing kinds are `file`, `disk-image`, and `archive`; the
//! structural kinds `directory`, `symlink`, and `special` describe tree
//! entries whose payload is empty or absent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of source entry a chunk (or manifest entry) represents.
///
/// Serialized in kebab-case (`"disk-image"`) to match the sidecar and
/// manifest wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChunkType {
    File,
    Directory,
    Special,
    DiskImage,
    Archive,
    Symlink,
}

impl ChunkType {
    /// True for kinds whose payload may legitimately be empty.
    pub fn allows_empty_payload(&self) -> bool {
        matches!(self, ChunkType::Special | ChunkType::Symlink | ChunkType::Directory)
    }

    /// True for kinds that reference a stored chunk payload.
    pub fn has_payload(&self) -> bool {
        matches!(self, ChunkType::File | ChunkType::DiskImage | ChunkType::Archive | ChunkType::Special)
    }
}

impl Default for ChunkType {
    fn default() -> Self {
        ChunkType::File
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChunkType::File => "file",
            ChunkType::Directory => "directory",
            ChunkType::Special => "special",
            ChunkType::DiskImage => "disk-image",
            ChunkType::Archive => "archive",
            ChunkType::Symlink => "symlink",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_kebab_case() {
        assert_eq!(serde_json::to_string(&ChunkType::DiskImage).unwrap(), "\"disk-image\"");
        let back: ChunkType = serde_json::from_str("\"disk-image\"").unwrap();
        assert_eq!(back, ChunkType::DiskImage);
    }

    #[test]
    fn test_empty_payload_rules() {
        assert!(ChunkType::Special.allows_empty_payload());
        assert!(ChunkType::Symlink.allows_empty_payload());
        assert!(!ChunkType::File.allows_empty_payload());
    }
}
