// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Layer
//!
//! Concrete implementations of the domain ports: filesystem storage
//! backends, the composable and mirrored stores, the lazy chunk reader, the
//! file-hash cache, the adapter registries with their detection engine, the
//! compression pipeline, and the storage-policy configuration.

pub mod adapters;
pub mod cache;
pub mod config;
pub mod detection;
pub mod logging;
pub mod pipeline;
pub mod registries;
pub mod storage;
