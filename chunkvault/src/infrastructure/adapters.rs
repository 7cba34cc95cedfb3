// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Built-in format adapters.

pub mod compression_adapters;
pub mod disk_image_adapters;

pub use compression_adapters::{BrotliAdapter, GzipAdapter, TarAdapter, ZstdAdapter};
