// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Services
//!
//! Stateless domain logic and the infrastructure ports the engine
//! implements:
//!
//! - **Organization strategies**: the identifier-to-path bijections
//! - **Chunk validator**: pure identifier/write/read rule checks
//! - **Chunk store ports**: async retrieval, existence, and assembled store
//!   traits
//! - **DateTime serde**: ISO-8601 timestamp encoding shared by every wire
//!   format

pub mod chunk_store;
pub mod chunk_validator;
pub mod datetime_serde;
pub mod organization;

pub use chunk_store::{ChunkExistence, ChunkRetrieval, ChunkStore};
pub use chunk_validator::{
    validate_identifier, validate_read, validate_write, ValidationConfig, ValidationResult,
};
pub use organization::{FlatOrganization, GitStyleOrganization, OrganizationStrategy};
