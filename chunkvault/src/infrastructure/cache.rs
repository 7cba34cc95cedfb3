// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Caching layers.

pub mod file_hash_cache;

pub use file_hash_cache::{CacheStats, FileHashCache, FileHashCacheEntry};
