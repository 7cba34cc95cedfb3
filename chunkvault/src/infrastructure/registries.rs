// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Adapter and file-type registries.
//!
//! Each registry is an instance type plus a process-wide table behind
//! `global()`, initialized once at first use and resettable from tests.

pub mod compression_registry;
pub mod disk_image_registry;
pub mod file_type_registry;

pub use compression_registry::{CompressionAdapter, CompressionAdapterRegistry, CompressionFormat};
pub use disk_image_registry::{
    DiskImageAdapter, DiskImageDescriptor, DiskImageEntry, DiskImageRegistry,
};
pub use file_type_registry::FileTypeRegistry;
