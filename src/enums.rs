// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::traits::SketchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hash algorithm used to derive a [`HashPair`](crate::hash::HashPair) from raw bytes.
///
/// Every variant is keyless, so the same bytes hash to the same pair in every
/// process. Two structures can only be merged when they agree on this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// 128-bit XXH3, split into its high and low halves.
    #[default]
    Xxh3,
    /// 128-bit SipHash-1-3 with a zero key.
    Sip128,
    /// FNV-1a 64, digested twice; the second digest follows one extra `0x01` byte.
    Fnv,
    /// FNV-1a 64 for the first value, XXH64 for the second.
    Combo,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Xxh3 => write!(f, "xxh3"),
            HashAlgorithm::Sip128 => write!(f, "sip128"),
            HashAlgorithm::Fnv => write!(f, "fnv"),
            HashAlgorithm::Combo => write!(f, "combo"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = SketchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "xxh3" | "xxhash" => Ok(HashAlgorithm::Xxh3),
            "sip128" | "siphash" => Ok(HashAlgorithm::Sip128),
            "fnv" | "fnv1a" => Ok(HashAlgorithm::Fnv),
            "combo" => Ok(HashAlgorithm::Combo),
            _ => Err(SketchError::InvalidInput(format!("Unknown hash algorithm: {}", s))),
        }
    }
}

/// Formula used to expand a hash pair into `N` indices.
///
/// The two schemes produce different indices for the same pair. A structure
/// picks one at construction and keeps it; adding with one scheme and querying
/// with the other would break the no-false-negative guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexScheme {
    /// `(h1 + i*h2) mod bound`
    #[default]
    Linear,
    /// `(h1 + i*h2 + i^2) mod bound`
    Quadratic,
}

impl fmt::Display for IndexScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexScheme::Linear => write!(f, "linear"),
            IndexScheme::Quadratic => write!(f, "quadratic"),
        }
    }
}

impl FromStr for IndexScheme {
    type Err = SketchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "linear" => Ok(IndexScheme::Linear),
            "quadratic" => Ok(IndexScheme::Quadratic),
            _ => Err(SketchError::InvalidInput(format!("Unknown index scheme: {}", s))),
        }
    }
}

fn normalize(s: &str) -> String {
    s.replace(['_', '-'], "").to_lowercase()
}
