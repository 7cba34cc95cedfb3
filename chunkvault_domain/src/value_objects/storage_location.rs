// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Storage Location Value Object
//!
//! Describes one storage tier backend in the storage policy: where it lives,
//! what role it plays (primary, secondary, mirror, glacier), how urgent its
//! availability is, and where it sorts among its peers.
//!
//! Priorities default by role (primary=0, secondary=100, mirror=150,
//! glacier=200); an explicit priority in the policy document overrides the
//! default.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Role a storage location plays in the tiered store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeType {
    Primary,
    Secondary,
    Mirror,
    Glacier,
}

impl VolumeType {
    /// Default sort priority for this role; lower sorts first.
    pub fn default_priority(&self) -> i32 {
        match self {
            VolumeType::Primary => 0,
            VolumeType::Secondary => 100,
            VolumeType::Mirror => 150,
            VolumeType::Glacier => 200,
        }
    }
}

impl fmt::Display for VolumeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VolumeType::Primary => "primary",
            VolumeType::Secondary => "secondary",
            VolumeType::Mirror => "mirror",
            VolumeType::Glacier => "glacier",
        };
        write!(f, "{}", name)
    }
}

/// Rough access-latency class of a storage location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedClass {
    Fast,
    Medium,
    Slow,
}

impl Default for SpeedClass {
    fn default() -> Self {
        SpeedClass::Medium
    }
}

/// One storage backend in the tiered storage policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageLocation {
    /// Root directory of this backend's chunk tree.
    pub path: PathBuf,

    /// Human-readable label used in logs and warnings.
    pub label: String,

    /// Whether resolution fails when this location is unavailable.
    #[serde(default)]
    pub required: bool,

    /// Explicit sort priority; when absent the role default applies.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub priority: Option<i32>,

    #[serde(default)]
    pub speed: SpeedClass,

    pub volume_type: VolumeType,
}

impl StorageLocation {
    pub fn new(path: impl Into<PathBuf>, label: impl Into<String>, volume_type: VolumeType) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
            required: false,
            priority: None,
            speed: SpeedClass::default(),
            volume_type,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_speed(mut self, speed: SpeedClass) -> Self {
        self.speed = speed;
        self
    }

    /// Explicit priority when set, role default otherwise.
    pub fn effective_priority(&self) -> i32 {
        self.priority.unwrap_or_else(|| self.volume_type.default_priority())
    }
}
