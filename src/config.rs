// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::enums::{HashAlgorithm, IndexScheme};
use crate::probabilistic::{BloomFilter, CountMinSketch, HyperLogLog};
use crate::traits::{Sketch, SketchError};
use serde::{Deserialize, Serialize};

/// Declarative description of one structure, suitable for config files.
///
/// Only sizing and algorithm choices are described; the structures' contents
/// are never serialized.
///
/// # Example
///
/// ```
/// use probstruct::{AnySketch, SketchConfig};
///
/// let config: SketchConfig = serde_json::from_str(
///     r#"{"type": "count_min", "epsilon": 0.01, "delta": 0.001, "hash": "fnv"}"#,
/// ).unwrap();
///
/// match config.build().unwrap() {
///     AnySketch::CountMin(cms) => assert_eq!(cms.dimensions(), (272, 7)),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SketchConfig {
    Bloom {
        #[serde(flatten)]
        sizing: BloomSizing,
        #[serde(default)]
        hash: HashAlgorithm,
        #[serde(default)]
        scheme: IndexScheme,
    },
    CountMin {
        #[serde(flatten)]
        sizing: CountMinSizing,
        #[serde(default)]
        hash: HashAlgorithm,
    },
    HyperLogLog {
        precision: u8,
        #[serde(default)]
        hash: HashAlgorithm,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BloomSizing {
    Estimate {
        expected_items: u64,
        false_positive_rate: f64,
    },
    Explicit {
        bits: u64,
        hashes: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountMinSizing {
    Estimate { epsilon: f64, delta: f64 },
    Explicit { width: u64, depth: u64 },
}

impl SketchConfig {
    /// Builds the described structure through its ordinary constructor.
    pub fn build(&self) -> Result<AnySketch, SketchError> {
        match *self {
            SketchConfig::Bloom {
                ref sizing,
                hash,
                scheme,
            } => {
                let (m, k) = match *sizing {
                    BloomSizing::Estimate {
                        expected_items,
                        false_positive_rate,
                    } => BloomFilter::estimate_size(expected_items, false_positive_rate)?,
                    BloomSizing::Explicit { bits, hashes } => (bits, hashes),
                };
                BloomFilter::with_scheme(m, k, hash, scheme).map(AnySketch::Bloom)
            }
            SketchConfig::CountMin { ref sizing, hash } => {
                let cms = match *sizing {
                    CountMinSizing::Estimate { epsilon, delta } => {
                        CountMinSketch::with_estimate(epsilon, delta, hash)?
                    }
                    CountMinSizing::Explicit { width, depth } => {
                        CountMinSketch::new(width, depth, hash)?
                    }
                };
                Ok(AnySketch::CountMin(cms))
            }
            SketchConfig::HyperLogLog { precision, hash } => {
                HyperLogLog::new(precision, hash).map(AnySketch::HyperLogLog)
            }
        }
    }
}

/// Any structure this crate can build from a [`SketchConfig`].
#[derive(Debug, Clone)]
pub enum AnySketch {
    Bloom(BloomFilter),
    CountMin(CountMinSketch),
    HyperLogLog(HyperLogLog),
}

impl AnySketch {
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        match self {
            AnySketch::Bloom(s) => s.hash_algorithm(),
            AnySketch::CountMin(s) => s.hash_algorithm(),
            AnySketch::HyperLogLog(s) => s.hash_algorithm(),
        }
    }
}

impl Sketch for AnySketch {
    fn assess_fill(&self) -> f64 {
        match self {
            AnySketch::Bloom(s) => s.assess_fill(),
            AnySketch::CountMin(s) => s.assess_fill(),
            AnySketch::HyperLogLog(s) => s.assess_fill(),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            AnySketch::Bloom(s) => s.is_empty(),
            AnySketch::CountMin(s) => s.is_empty(),
            AnySketch::HyperLogLog(s) => s.is_empty(),
        }
    }
}
