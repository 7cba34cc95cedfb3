// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Built-in Disk Image Adapters
//!
//! Format probes and lightweight adapters for the disk-image registry. The
//! core only needs enough of each format to classify a file and surface a
//! volume name; full filesystem parsing belongs to external collaborators.
//!
//! Registered formats: ISO 9660 (identified by the `CD001` signature in the
//! primary volume descriptor), Apple disk images (identified by the `koly`
//! trailer), and raw images (extension-only, any bytes accepted).

use std::sync::Arc;

use chunkvault_domain::ChunkError;

use crate::infrastructure::registries::disk_image_registry::{
    DiskImageAdapter, DiskImageDescriptor, DiskImageEntry,
};

const ISO_SIGNATURE_OFFSET: usize = 0x8001;
const ISO_SIGNATURE: &[u8] = b"CD001";
const ISO_VOLUME_NAME_OFFSET: usize = 0x8028;
const ISO_VOLUME_NAME_LEN: usize = 32;
const DMG_TRAILER_LEN: usize = 512;
const DMG_SIGNATURE: &[u8] = b"koly";

fn is_iso9660(data: &[u8]) -> bool {
    data.len() >= ISO_SIGNATURE_OFFSET + ISO_SIGNATURE.len()
        && &data[ISO_SIGNATURE_OFFSET..ISO_SIGNATURE_OFFSET + ISO_SIGNATURE.len()] == ISO_SIGNATURE
}

fn is_apple_disk_image(data: &[u8]) -> bool {
    data.len() >= DMG_TRAILER_LEN && &data[data.len() - DMG_TRAILER_LEN..][..DMG_SIGNATURE.len()] == DMG_SIGNATURE
}

struct BasicDiskImage {
    descriptor: DiskImageDescriptor,
    volume_name: Option<String>,
    content_size: u64,
}

impl DiskImageAdapter for BasicDiskImage {
    fn descriptor(&self) -> &DiskImageDescriptor {
        &self.descriptor
    }

    fn volume_name(&self) -> Option<String> {
        self.volume_name.clone()
    }

    fn content_size(&self) -> u64 {
        self.content_size
    }
}

fn iso_descriptor() -> DiskImageDescriptor {
    DiskImageDescriptor {
        format: "iso9660".into(),
        extensions: vec!["iso".into()],
    }
}

fn dmg_descriptor() -> DiskImageDescriptor {
    DiskImageDescriptor {
        format: "apple-dmg".into(),
        extensions: vec!["dmg".into()],
    }
}

fn raw_descriptor() -> DiskImageDescriptor {
    DiskImageDescriptor {
        format: "raw".into(),
        extensions: vec!["img".into(), "raw".into()],
    }
}

/// ISO 9660 volume identifier from the primary volume descriptor.
fn iso_volume_name(data: &[u8]) -> Option<String> {
    let end = ISO_VOLUME_NAME_OFFSET + ISO_VOLUME_NAME_LEN;
    if data.len() < end {
        return None;
    }
    let raw = String::from_utf8_lossy(&data[ISO_VOLUME_NAME_OFFSET..end]);
    let trimmed = raw.trim().to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// All built-in entries, for registry initialization.
pub fn builtin_disk_image_entries() -> Vec<DiskImageEntry> {
    vec![
        DiskImageEntry {
            descriptor: iso_descriptor(),
            probe: Arc::new(is_iso9660),
            factory: Arc::new(|data: &[u8]| {
                if !is_iso9660(data) {
                    return Err(ChunkError::CorruptedData(
                        "data does not carry an ISO 9660 volume descriptor".into(),
                    ));
                }
                let adapter: Arc<dyn DiskImageAdapter> = Arc::new(BasicDiskImage {
                    descriptor: iso_descriptor(),
                    volume_name: iso_volume_name(data),
                    content_size: data.len() as u64,
                });
                Ok(adapter)
            }),
        },
        DiskImageEntry {
            descriptor: dmg_descriptor(),
            probe: Arc::new(is_apple_disk_image),
            factory: Arc::new(|data: &[u8]| {
                if !is_apple_disk_image(data) {
                    return Err(ChunkError::CorruptedData(
                        "data does not end in a koly trailer".into(),
                    ));
                }
                let adapter: Arc<dyn DiskImageAdapter> = Arc::new(BasicDiskImage {
                    descriptor: dmg_descriptor(),
                    volume_name: None,
                    content_size: data.len() as u64,
                });
                Ok(adapter)
            }),
        },
        DiskImageEntry {
            descriptor: raw_descriptor(),
            // Raw images have no signature to probe for.
            probe: Arc::new(|_: &[u8]| false),
            factory: Arc::new(|data: &[u8]| {
                let adapter: Arc<dyn DiskImageAdapter> = Arc::new(BasicDiskImage {
                    descriptor: raw_descriptor(),
                    volume_name: None,
                    content_size: data.len() as u64,
                });
                Ok(adapter)
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_probe_and_volume_name() {
        let mut data = vec![0u8; 0x8100];
        data[ISO_SIGNATURE_OFFSET..ISO_SIGNATURE_OFFSET + 5].copy_from_slice(ISO_SIGNATURE);
        let name = b"ARCHIVE_2024";
        data[ISO_VOLUME_NAME_OFFSET..ISO_VOLUME_NAME_OFFSET + name.len()].copy_from_slice(name);
        for slot in data
            .iter_mut()
            .skip(ISO_VOLUME_NAME_OFFSET + name.len())
            .take(ISO_VOLUME_NAME_LEN - name.len())
        {
            *slot = b' ';
        }

        assert!(is_iso9660(&data));
        assert_eq!(iso_volume_name(&data).as_deref(), Some("ARCHIVE_2024"));
        assert!(!is_iso9660(b"short"));
    }

    #[test]
    fn test_dmg_trailer_probe() {
        let mut data = vec![0u8; 1024];
        let trailer_start = data.len() - DMG_TRAILER_LEN;
        data[trailer_start..trailer_start + 4].copy_from_slice(DMG_SIGNATURE);
        assert!(is_apple_disk_image(&data));
        assert!(!is_apple_disk_image(&vec![0u8; 1024]));
    }
}
