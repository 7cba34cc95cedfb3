// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Hash Algorithm Value Object
//!
//! This module provides the [`HashAlgorithm`] value object, the closed set of
//! content-hash algorithms the store accepts for chunk identifiers. Each
//! algorithm knows its canonical lowercase-hex digest length, which the
//! validator uses to sanity-check identifiers, and can compute digests
//! directly.
//!
//! SHA-256 is the default and the recommended algorithm; SHA-1, MD5, and
//! CRC32 exist for interoperability with caches and manifests produced by
//! older tooling.

use crc32fast::Hasher as Crc32;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::ChunkError;

/// Supported content-hash algorithms for chunk identification.
///
/// Serialized in lowercase (`"sha256"`, `"sha1"`, `"md5"`, `"crc32"`) to
/// match the sidecar and hash-cache wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha256,
    Sha1,
    Md5,
    Crc32,
}

impl HashAlgorithm {
    /// All supported algorithms, in preference order.
    pub const ALL: [HashAlgorithm; 4] = [
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha1,
        HashAlgorithm::Md5,
        HashAlgorithm::Crc32,
    ];

    /// Canonical length of this algorithm's lowercase-hex digest.
    pub fn hex_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha1 => 40,
            HashAlgorithm::Md5 => 32,
            HashAlgorithm::Crc32 => 8,
        }
    }

    /// Guesses the algorithm from a digest's hex length.
    ///
    /// Returns `None` when the length matches no canonical digest size.
    pub fn from_hex_len(len: usize) -> Option<HashAlgorithm> {
        Self::ALL.iter().copied().find(|a| a.hex_len() == len)
    }

    /// Computes the lowercase-hex digest of `data` with this algorithm.
    pub fn digest_hex(&self, data: &[u8]) -> String {
        match self {
            HashAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(data);
                hex::encode(hasher.finalize())
            }
            HashAlgorithm::Sha1 => {
                let mut hasher = Sha1::new();
                hasher.update(data);
                hex::encode(hasher.finalize())
            }
            HashAlgorithm::Md5 => {
                let mut hasher = Md5::new();
                hasher.update(data);
                hex::encode(hasher.finalize())
            }
            HashAlgorithm::Crc32 => {
                let mut hasher = Crc32::new();
                hasher.update(data);
                format!("{:08x}", hasher.finalize())
            }
        }
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Sha256
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Crc32 => "crc32",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for HashAlgorithm {
    type Err = ChunkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "sha1" | "sha-1" => Ok(HashAlgorithm::Sha1),
            "md5" => Ok(HashAlgorithm::Md5),
            "crc32" => Ok(HashAlgorithm::Crc32),
            other => Err(ChunkError::InvalidHashAlgorithm(format!(
                "unknown hash algorithm '{}'",
                other
            ))),
        }
    }
}
