// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Logging Setup
//!
//! Tracing subscriber initialization for embedding applications and tests.
//! The engine itself only emits `tracing` events; installing a subscriber is
//! the host's decision.

use tracing::Level;

/// Installs a plain formatting subscriber at the given level.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

/// Installs the default INFO-level subscriber.
pub fn init_default_tracing() {
    init_tracing(Level::INFO);
}
