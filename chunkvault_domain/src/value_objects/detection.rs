// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File-Type Detection Value Objects
//!
//! The descriptor and result types behind file-type detection. A
//! [`FileTypeDescriptor`] is the immutable registration record of one file
//! type: its short identifier, its UTI with a conformance list, the
//! extensions it claims, and optional magic-number patterns anchored at
//! absolute offsets. The detection engine matches bytes and extensions
//! against registered descriptors and produces a [`DetectionResult`] naming
//! the winning type, the strategy that matched, and a confidence score.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::chunk_type::ChunkType;

/// The literal a magic-number pattern compares against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MagicLiteral {
    /// Raw byte-sequence equality.
    Bytes(Vec<u8>),
    /// ASCII string equality.
    Ascii(String),
}

impl MagicLiteral {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            MagicLiteral::Bytes(bytes) => bytes,
            MagicLiteral::Ascii(s) => s.as_bytes(),
        }
    }
}

/// A magic-number pattern anchored at an absolute offset.
///
/// The pattern matches iff the data, at exactly `offset`, contains the
/// declared literal. Data shorter than `offset + literal` never matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicPattern {
    pub offset: usize,
    pub literal: MagicLiteral,
}

impl MagicPattern {
    pub fn bytes(offset: usize, literal: impl Into<Vec<u8>>) -> Self {
        Self {
            offset,
            literal: MagicLiteral::Bytes(literal.into()),
        }
    }

    pub fn ascii(offset: usize, literal: impl Into<String>) -> Self {
        Self {
            offset,
            literal: MagicLiteral::Ascii(literal.into()),
        }
    }

    /// True iff `data` contains this pattern's literal at its offset.
    pub fn matches(&self, data: &[u8]) -> bool {
        let literal = self.literal.as_bytes();
        let end = match self.offset.checked_add(literal.len()) {
            Some(end) => end,
            None => return false,
        };
        data.len() >= end && &data[self.offset..end] == literal
    }
}

/// Broad category tag attached to a registered file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileTypeCategory {
    Document,
    Archive,
    DiskImage,
    Media,
    System,
    Other,
}

impl FileTypeCategory {
    /// The chunk type an entry of this category is stored as.
    pub fn chunk_type(&self) -> ChunkType {
        match self {
            FileTypeCategory::Archive => ChunkType::Archive,
            FileTypeCategory::DiskImage => ChunkType::DiskImage,
            _ => ChunkType::File,
        }
    }
}

/// Immutable registration record of one file type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTypeDescriptor {
    /// Short identifier, 3 to 9 characters, unique within a registry.
    pub short_id: String,

    /// Uniform type identifier, e.g. `public.plain-text`.
    pub uti: String,

    /// Parent UTIs this type conforms to.
    #[serde(default)]
    pub conforms_to: Vec<String>,

    pub display_name: String,

    /// Extensions this type claims, stored lowercase without dots.
    #[serde(default)]
    pub extensions: Vec<String>,

    #[serde(default)]
    pub magic_patterns: Vec<MagicPattern>,

    pub category: FileTypeCategory,

    /// IANA-style media type recorded into chunk metadata, when known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub media_type: Option<String>,
}

impl FileTypeDescriptor {
    pub fn new(
        short_id: impl Into<String>,
        uti: impl Into<String>,
        display_name: impl Into<String>,
        category: FileTypeCategory,
    ) -> Self {
        Self {
            short_id: short_id.into(),
            uti: uti.into(),
            conforms_to: Vec::new(),
            display_name: display_name.into(),
            extensions: Vec::new(),
            magic_patterns: Vec::new(),
            category,
            media_type: None,
        }
    }

    pub fn conforming_to(mut self, parent: impl Into<String>) -> Self {
        self.conforms_to.push(parent.into());
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extensions.push(extension.into().trim_start_matches('.').to_ascii_lowercase());
        self
    }

    pub fn with_magic(mut self, pattern: MagicPattern) -> Self {
        self.magic_patterns.push(pattern);
        self
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// True iff any magic pattern of this type matches `data`.
    pub fn matches_magic(&self, data: &[u8]) -> bool {
        self.magic_patterns.iter().any(|p| p.matches(data))
    }

    /// Case-insensitive, dot-agnostic extension match.
    pub fn matches_extension(&self, extension: &str) -> bool {
        let wanted = extension.trim_start_matches('.').to_ascii_lowercase();
        self.extensions.iter().any(|e| *e == wanted)
    }

    /// True iff this type's UTI is, or conforms to, `parent`.
    pub fn conforms_to_uti(&self, parent: &str) -> bool {
        self.uti == parent || self.conforms_to.iter().any(|c| c == parent)
    }
}

/// How a detection result was obtained, in strict priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    MagicNumber,
    Extension,
    Conformance,
}

impl DetectionStrategy {
    /// Baseline confidence attached to matches of this strategy.
    pub fn confidence(&self) -> f64 {
        match self {
            DetectionStrategy::MagicNumber => 0.9,
            DetectionStrategy::Extension => 0.6,
            DetectionStrategy::Conformance => 0.5,
        }
    }
}

impl fmt::Display for DetectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetectionStrategy::MagicNumber => "magic_number",
            DetectionStrategy::Extension => "extension",
            DetectionStrategy::Conformance => "conformance",
        };
        write!(f, "{}", name)
    }
}

/// The outcome of a detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub file_type: FileTypeDescriptor,
    pub strategy: DetectionStrategy,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

impl DetectionResult {
    pub fn new(file_type: FileTypeDescriptor, strategy: DetectionStrategy) -> Self {
        let confidence = strategy.confidence();
        Self {
            file_type,
            strategy,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_descriptor() -> FileTypeDescriptor {
        FileTypeDescriptor::new("png", "public.png", "PNG Image", FileTypeCategory::Media)
            .conforming_to("public.image")
            .with_extension(".PNG")
            .with_magic(MagicPattern::bytes(0, vec![0x89, b'P', b'N', b'G']))
    }

    #[test]
    fn test_magic_pattern_anchored_match() {
        let pattern = MagicPattern::ascii(257, "ustar");
        let mut data = vec![0u8; 512];
        data[257..262].copy_from_slice(b"ustar");
        assert!(pattern.matches(&data));
        assert!(!pattern.matches(&data[..200]));

        let mut shifted = vec![0u8; 512];
        shifted[258..263].copy_from_slice(b"ustar");
        assert!(!pattern.matches(&shifted));
    }

    #[test]
    fn test_extension_match_is_case_insensitive_and_dot_agnostic() {
        let descriptor = png_descriptor();
        assert!(descriptor.matches_extension("png"));
        assert!(descriptor.matches_extension(".PnG"));
        assert!(!descriptor.matches_extension("jpg"));
    }

    #[test]
    fn test_conformance() {
        let descriptor = png_descriptor();
        assert!(descriptor.conforms_to_uti("public.image"));
        assert!(descriptor.conforms_to_uti("public.png"));
        assert!(!descriptor.conforms_to_uti("public.audio"));
    }

    #[test]
    fn test_strategy_confidence_ordering() {
        assert!(DetectionStrategy::MagicNumber.confidence() > DetectionStrategy::Extension.confidence());
        assert!(DetectionStrategy::Extension.confidence() > DetectionStrategy::Conformance.confidence());
    }

    #[test]
    fn test_category_to_chunk_type() {
        assert_eq!(FileTypeCategory::Archive.chunk_type(), ChunkType::Archive);
        assert_eq!(FileTypeCategory::DiskImage.chunk_type(), ChunkType::DiskImage);
        assert_eq!(FileTypeCategory::Media.chunk_type(), ChunkType::File);
    }
}
