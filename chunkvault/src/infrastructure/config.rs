// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Configuration documents.

pub mod storage_policy;

pub use storage_policy::{build_mirrored_store, ResolvedStoragePolicy, StoragePolicy};
