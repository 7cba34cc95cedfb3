// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The compression pipeline: shared context and composable stages.

pub mod context;
pub mod stages;

pub use context::{keys, ContextValue, PipelineContext};
pub use stages::{DecompressionStage, NestedCompressionStage, Pipeline, PipelineStage};
