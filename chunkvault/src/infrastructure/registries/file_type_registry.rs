// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Type Registry
//!
//! Registration table for [`FileTypeDescriptor`]s, looked up by short
//! identifier, UTI, extension, or conformance to a parent UTI. Short
//! identifiers are 3 to 9 characters and unique; registering a duplicate
//! fails unless the caller passes `allow_override`.
//!
//! The process-wide instance behind [`FileTypeRegistry::global`] is filled
//! with a baseline table at first use; [`FileTypeRegistry::reset_to_builtins`]
//! is the test hook that undoes ad-hoc registrations.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

use chunkvault_domain::{ChunkError, FileTypeCategory, FileTypeDescriptor, MagicPattern};

const SHORT_ID_MIN: usize = 3;
const SHORT_ID_MAX: usize = 9;

/// The baseline file-type table registered at startup.
pub fn builtin_file_types() -> Vec<FileTypeDescriptor> {
    vec![
        FileTypeDescriptor::new("txt", "public.plain-text", "Plain Text", FileTypeCategory::Document)
            .conforming_to("public.text")
            .with_extension("txt")
            .with_extension("text")
            .with_media_type("text/plain"),
        FileTypeDescriptor::new("json", "public.json", "JSON Document", FileTypeCategory::Document)
            .conforming_to("public.text")
            .with_extension("json")
            .with_media_type("application/json"),
        FileTypeDescriptor::new("gzip", "org.gnu.gnu-zip-archive", "Gzip Archive", FileTypeCategory::Archive)
            .conforming_to("public.data")
            .with_extension("gz")
            .with_extension("gzip")
            .with_magic(MagicPattern::bytes(0, vec![0x1f, 0x8b]))
            .with_media_type("application/gzip"),
        FileTypeDescriptor::new("zip", "com.pkware.zip-archive", "Zip Archive", FileTypeCategory::Archive)
            .conforming_to("public.data")
            .with_extension("zip")
            .with_magic(MagicPattern::bytes(0, vec![0x50, 0x4b, 0x03, 0x04]))
            .with_media_type("application/zip"),
        FileTypeDescriptor::new("tar", "public.tar-archive", "Tar Archive", FileTypeCategory::Archive)
            .conforming_to("public.data")
            .with_extension("tar")
            .with_magic(MagicPattern::ascii(257, "ustar"))
            .with_media_type("application/x-tar"),
        FileTypeDescriptor::new("zstd", "org.zstandard.zstd", "Zstandard Archive", FileTypeCategory::Archive)
            .conforming_to("public.data")
            .with_extension("zst")
            .with_magic(MagicPattern::bytes(0, vec![0x28, 0xb5, 0x2f, 0xfd]))
            .with_media_type("application/zstd"),
        FileTypeDescriptor::new("png", "public.png", "PNG Image", FileTypeCategory::Media)
            .conforming_to("public.image")
            .with_extension("png")
            .with_magic(MagicPattern::bytes(0, vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a]))
            .with_media_type("image/png"),
        FileTypeDescriptor::new("jpeg", "public.jpeg", "JPEG Image", FileTypeCategory::Media)
            .conforming_to("public.image")
            .with_extension("jpg")
            .with_extension("jpeg")
            .with_magic(MagicPattern::bytes(0, vec![0xff, 0xd8, 0xff]))
            .with_media_type("image/jpeg"),
        FileTypeDescriptor::new("iso", "public.iso-image", "ISO 9660 Image", FileTypeCategory::DiskImage)
            .conforming_to("public.disk-image")
            .with_extension("iso")
            .with_magic(MagicPattern::ascii(0x8001, "CD001"))
            .with_media_type("application/x-iso9660-image"),
        FileTypeDescriptor::new("dmg", "com.apple.disk-image", "Apple Disk Image", FileTypeCategory::DiskImage)
            .conforming_to("public.disk-image")
            .with_extension("dmg")
            .with_media_type("application/x-apple-diskimage"),
    ]
}

/// Registration table of file types.
pub struct FileTypeRegistry {
    entries: RwLock<Vec<FileTypeDescriptor>>,
}

impl FileTypeRegistry {
    pub fn empty() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        for descriptor in builtin_file_types() {
            registry
                .register(descriptor, false)
                .expect("builtin file types are unique");
        }
        registry
    }

    /// The process-wide registry, initialized once with the baseline table.
    pub fn global() -> &'static FileTypeRegistry {
        static GLOBAL: Lazy<FileTypeRegistry> = Lazy::new(FileTypeRegistry::with_builtins);
        &GLOBAL
    }

    /// Registers a descriptor.
    ///
    /// The short identifier must be 3 to 9 characters; a second registration
    /// under an existing short identifier fails unless `allow_override` is
    /// set, in which case it replaces the previous entry.
    pub fn register(&self, descriptor: FileTypeDescriptor, allow_override: bool) -> Result<(), ChunkError> {
        let short_id = descriptor.short_id.clone();
        if short_id.len() < SHORT_ID_MIN || short_id.len() > SHORT_ID_MAX {
            return Err(ChunkError::InvalidConfiguration(format!(
                "short id '{}' must be {} to {} characters",
                short_id, SHORT_ID_MIN, SHORT_ID_MAX
            )));
        }

        let mut entries = self.entries.write();
        if let Some(position) = entries.iter().position(|e| e.short_id == short_id) {
            if !allow_override {
                return Err(ChunkError::InvalidConfiguration(format!(
                    "file type '{}' is already registered",
                    short_id
                )));
            }
            debug!(short_id = %short_id, "overriding registered file type");
            entries[position] = descriptor;
        } else {
            entries.push(descriptor);
        }
        Ok(())
    }

    /// Test hook: restores the registry to the baseline table.
    pub fn reset_to_builtins(&self) {
        let mut entries = self.entries.write();
        entries.clear();
        entries.extend(builtin_file_types());
    }

    pub fn by_short_id(&self, short_id: &str) -> Option<FileTypeDescriptor> {
        self.entries.read().iter().find(|e| e.short_id == short_id).cloned()
    }

    pub fn by_uti(&self, uti: &str) -> Option<FileTypeDescriptor> {
        self.entries.read().iter().find(|e| e.uti == uti).cloned()
    }

    pub fn by_extension(&self, extension: &str) -> Option<FileTypeDescriptor> {
        self.entries
            .read()
            .iter()
            .find(|e| e.matches_extension(extension))
            .cloned()
    }

    /// Every registered type whose UTI is, or conforms to, `parent`.
    pub fn conforming_to(&self, parent: &str) -> Vec<FileTypeDescriptor> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.conforms_to_uti(parent))
            .cloned()
            .collect()
    }

    /// Snapshot of all registered descriptors.
    pub fn all(&self) -> Vec<FileTypeDescriptor> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_short_id_and_uti() {
        let registry = FileTypeRegistry::with_builtins();
        assert_eq!(registry.by_short_id("png").unwrap().uti, "public.png");
        assert_eq!(registry.by_uti("public.tar-archive").unwrap().short_id, "tar");
        assert!(registry.by_short_id("nope").is_none());
    }

    #[test]
    fn test_lookup_by_extension() {
        let registry = FileTypeRegistry::with_builtins();
        assert_eq!(registry.by_extension(".JPG").unwrap().short_id, "jpeg");
    }

    #[test]
    fn test_conformance_query() {
        let registry = FileTypeRegistry::with_builtins();
        let images: Vec<String> = registry
            .conforming_to("public.image")
            .into_iter()
            .map(|d| d.short_id)
            .collect();
        assert!(images.contains(&"png".to_string()));
        assert!(images.contains(&"jpeg".to_string()));
        assert!(!images.contains(&"tar".to_string()));

        let disk_images = registry.conforming_to("public.disk-image");
        assert_eq!(disk_images.len(), 2);
    }

    #[test]
    fn test_short_id_length_enforced() {
        let registry = FileTypeRegistry::empty();
        let too_short = FileTypeDescriptor::new("ab", "x.y", "X", FileTypeCategory::Other);
        assert!(registry.register(too_short, false).is_err());
        let too_long = FileTypeDescriptor::new("abcdefghij", "x.y", "X", FileTypeCategory::Other);
        assert!(registry.register(too_long, false).is_err());
    }

    #[test]
    fn test_duplicate_requires_override() {
        let registry = FileTypeRegistry::with_builtins();
        let duplicate = FileTypeDescriptor::new("png", "custom.png", "Custom PNG", FileTypeCategory::Media);
        assert!(registry.register(duplicate.clone(), false).is_err());
        registry.register(duplicate, true).unwrap();
        assert_eq!(registry.by_short_id("png").unwrap().uti, "custom.png");

        registry.reset_to_builtins();
        assert_eq!(registry.by_short_id("png").unwrap().uti, "public.png");
    }
}
