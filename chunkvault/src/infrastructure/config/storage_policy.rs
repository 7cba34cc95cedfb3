// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Storage Policy Configuration
//!
//! The YAML storage-policy document and its resolution into tiers. A policy
//! lists storage locations (path, label, role, priority, speed class) plus
//! the mirroring switches; resolution filters the list down to locations
//! whose path actually exists, sorts by priority, and picks the tier roles:
//!
//! - the first available primary is *the* primary (a secondary location is
//!   promoted with a warning when no primary is available)
//! - every available mirror and glacier location joins its tier
//! - a missing required primary is a configuration error; missing optional
//!   tiers only produce warnings
//!
//! [`build_mirrored_store`] turns a resolved policy into a ready
//! [`MirroredChunkStore`], one git-style composable store per location.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use chunkvault_domain::{
    ChunkError, GitStyleOrganization, StorageLocation, ValidationConfig, VolumeType,
};

use crate::infrastructure::storage::composable_store::ComposableChunkStore;
use crate::infrastructure::storage::mirrored_store::{MirroredChunkStore, TierBackend};

fn default_true() -> bool {
    true
}

/// The storage-policy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoragePolicy {
    pub locations: Vec<StorageLocation>,

    #[serde(default = "default_true")]
    pub enable_mirroring: bool,

    #[serde(default)]
    pub fail_if_primary_unavailable: bool,
}

impl Default for StoragePolicy {
    fn default() -> Self {
        Self {
            locations: Vec::new(),
            enable_mirroring: true,
            fail_if_primary_unavailable: false,
        }
    }
}

/// The policy after resolution against the live filesystem.
#[derive(Debug, Clone)]
pub struct ResolvedStoragePolicy {
    pub primary: StorageLocation,
    pub mirrors: Vec<StorageLocation>,
    pub glaciers: Vec<StorageLocation>,
    pub warnings: Vec<String>,
}

impl StoragePolicy {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ChunkError> {
        serde_yaml::from_str(yaml)
            .map_err(|e| ChunkError::InvalidConfiguration(format!("storage policy: {}", e)))
    }

    pub fn to_yaml_string(&self) -> Result<String, ChunkError> {
        serde_yaml::to_string(self)
            .map_err(|e| ChunkError::InvalidConfiguration(format!("storage policy: {}", e)))
    }

    pub async fn load(path: &Path) -> Result<Self, ChunkError> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            ChunkError::InvalidConfiguration(format!("reading {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Resolves the policy against the filesystem into concrete tiers.
    pub fn resolve(&self) -> Result<ResolvedStoragePolicy, ChunkError> {
        let mut warnings = Vec::new();

        let mut available: Vec<&StorageLocation> = Vec::new();
        for location in &self.locations {
            if location.path.exists() {
                available.push(location);
            } else if location.required {
                if location.volume_type == VolumeType::Primary {
                    return Err(ChunkError::InvalidConfiguration(format!(
                        "required primary '{}' is unavailable at {}",
                        location.label,
                        location.path.display()
                    )));
                }
                warnings.push(format!(
                    "required {} '{}' is unavailable at {}",
                    location.volume_type,
                    location.label,
                    location.path.display()
                ));
            } else {
                warnings.push(format!(
                    "optional {} '{}' is unavailable at {}",
                    location.volume_type,
                    location.label,
                    location.path.display()
                ));
            }
        }

        available.sort_by_key(|l| l.effective_priority());

        let primary = available
            .iter()
            .find(|l| l.volume_type == VolumeType::Primary)
            .copied()
            .or_else(|| {
                let fallback = available
                    .iter()
                    .find(|l| l.volume_type == VolumeType::Secondary)
                    .copied();
                if let Some(secondary) = fallback {
                    warnings.push(format!(
                        "no primary location available, promoting secondary '{}'",
                        secondary.label
                    ));
                }
                fallback
            })
            .ok_or_else(|| {
                ChunkError::InvalidConfiguration("storage policy has no available primary location".into())
            })?
            .clone();

        let (mirrors, glaciers) = if self.enable_mirroring {
            (
                available
                    .iter()
                    .filter(|l| l.volume_type == VolumeType::Mirror)
                    .map(|l| (*l).clone())
                    .collect(),
                available
                    .iter()
                    .filter(|l| l.volume_type == VolumeType::Glacier)
                    .map(|l| (*l).clone())
                    .collect(),
            )
        } else {
            warnings.push("mirroring disabled, mirror and glacier locations ignored".into());
            (Vec::new(), Vec::new())
        };

        for warning in &warnings {
            warn!("{}", warning);
        }

        Ok(ResolvedStoragePolicy {
            primary,
            mirrors,
            glaciers,
            warnings,
        })
    }
}

/// Builds the tiered store a resolved policy describes: one composable
/// git-style store per location.
pub fn build_mirrored_store(
    resolved: &ResolvedStoragePolicy,
    validation: ValidationConfig,
    fail_on_primary_error: bool,
) -> MirroredChunkStore {
    let backend = |location: &StorageLocation| -> Arc<ComposableChunkStore> {
        Arc::new(
            ComposableChunkStore::filesystem(
                location.path.clone(),
                Arc::new(GitStyleOrganization::default()),
            )
            .with_validation(validation.clone()),
        )
    };

    let mut tier = TierBackend::new(
        backend(&resolved.primary),
        resolved.primary.label.clone(),
        VolumeType::Primary,
    );
    if resolved.primary.required {
        tier = tier.required();
    }
    let mut store = MirroredChunkStore::new(tier).fail_on_primary_error(fail_on_primary_error);

    for mirror in &resolved.mirrors {
        let mut tier = TierBackend::new(backend(mirror), mirror.label.clone(), VolumeType::Mirror);
        if mirror.required {
            tier = tier.required();
        }
        store = store.with_mirror(tier);
    }
    for glacier in &resolved.glaciers {
        let mut tier = TierBackend::new(backend(glacier), glacier.label.clone(), VolumeType::Glacier);
        if glacier.required {
            tier = tier.required();
        }
        store = store.with_glacier(tier);
    }

    store
}
