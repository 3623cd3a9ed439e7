// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::enums::{HashAlgorithm, IndexScheme};
use crate::traits::{Sketch, SketchError};
use std::f64::consts::LN_2;
use tracing::{debug, warn};

/// Largest bit vector a filter may allocate.
pub const MAX_BITS: u64 = u32::MAX as u64;

/// Largest number of indices per item.
pub const MAX_HASHES: u64 = 1024;

/// Bloom Filter - Set Membership
///
/// A bit vector of `m` bits. Each item sets `k` bits chosen by double hashing
/// a single [`HashPair`](crate::hash::HashPair).
///
/// # Key Properties
///
/// - **Fixed Memory**: `m` is chosen at construction and never changes.
/// - **No False Negatives**: An added item is always reported present.
/// - **Bounded False Positives**: Roughly the target `p` as long as no more than
///   the `n` items used for sizing have been added.
///
/// # Example
///
/// ```
/// use probstruct::{BloomFilter, HashAlgorithm};
///
/// let mut bloom = BloomFilter::with_estimate(1000, 0.01, HashAlgorithm::Xxh3).unwrap();
/// bloom.add_str("apple");
/// bloom.add(b"banana");
///
/// assert!(bloom.query_str("apple"));
/// assert!(bloom.query(b"banana"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomFilter {
    m: u64,
    k: u64,
    bits: Vec<bool>,
    hash: HashAlgorithm,
    scheme: IndexScheme,
}

impl BloomFilter {
    /// Computes `(m, k)` for `n` expected items at false positive rate `p`.
    ///
    /// `m = ceil(-n ln(p) / ln(2)^2)` and `k = round(ln(2) m / n)`, with `k`
    /// floored at 1.
    pub fn estimate_size(n: u64, p: f64) -> Result<(u64, u64), SketchError> {
        if n == 0 {
            return Err(SketchError::InvalidParameter(
                "expected item count must be greater than 0".into(),
            ));
        }
        if !(p > 0.0 && p < 1.0) {
            return Err(SketchError::InvalidParameter(format!(
                "false positive rate must be 0 < p < 1, got {}",
                p
            )));
        }

        let size = (-(n as f64) * p.ln() / (LN_2 * LN_2)).ceil();
        if size > MAX_BITS as f64 {
            return Err(SketchError::Oversized {
                requested: size as u64,
                limit: MAX_BITS,
            });
        }

        let m = size as u64;
        let k = ((LN_2 * size / n as f64).round() as u64).max(1);
        Ok((m, k))
    }

    /// Creates a filter of `m` bits and `k` indices per item.
    pub fn new(m: u64, k: u64, hash: HashAlgorithm) -> Result<Self, SketchError> {
        Self::with_scheme(m, k, hash, IndexScheme::default())
    }

    /// Creates a filter sized for `n` items at false positive rate `p`.
    pub fn with_estimate(n: u64, p: f64, hash: HashAlgorithm) -> Result<Self, SketchError> {
        let (m, k) = Self::estimate_size(n, p).map_err(|e| {
            warn!(n, p, error = %e, "refusing to size bloom filter");
            e
        })?;
        Self::new(m, k, hash)
    }

    /// Creates a filter with an explicit index scheme.
    pub fn with_scheme(
        m: u64,
        k: u64,
        hash: HashAlgorithm,
        scheme: IndexScheme,
    ) -> Result<Self, SketchError> {
        if m == 0 || k == 0 {
            warn!(m, k, "refusing to build bloom filter with zero size");
            return Err(SketchError::InvalidParameter(format!(
                "bloom filter needs m > 0 and k > 0, got m={} k={}",
                m, k
            )));
        }
        if m > MAX_BITS {
            warn!(m, limit = MAX_BITS, "refusing to build oversized bloom filter");
            return Err(SketchError::Oversized {
                requested: m,
                limit: MAX_BITS,
            });
        }
        if k > MAX_HASHES {
            warn!(k, limit = MAX_HASHES, "refusing to build bloom filter with too many hashes");
            return Err(SketchError::Oversized {
                requested: k,
                limit: MAX_HASHES,
            });
        }
        let len = usize::try_from(m).map_err(|_| SketchError::Oversized {
            requested: m,
            limit: usize::MAX as u64,
        })?;

        debug!(m, k, %hash, %scheme, "bloom filter created");
        Ok(Self {
            m,
            k,
            bits: vec![false; len],
            hash,
            scheme,
        })
    }

    /// Adds an item. Adding the same item again changes nothing.
    pub fn add(&mut self, item: &[u8]) {
        self.add_many(&[item]);
    }

    pub fn add_str(&mut self, item: &str) {
        self.add(item.as_bytes());
    }

    /// Adds a composite key: all parts are hashed as one stream.
    ///
    /// An empty slice is a no-op.
    pub fn add_many<I: AsRef<[u8]>>(&mut self, parts: &[I]) {
        if parts.is_empty() {
            return;
        }
        let pair = self.hash.base_hash(parts);
        for idx in pair.indices(self.m, self.k, self.scheme) {
            self.bits[idx as usize] = true;
        }
    }

    /// Adds each item independently.
    pub fn add_each<I: AsRef<[u8]>>(&mut self, items: &[I]) {
        for item in items {
            self.add(item.as_ref());
        }
    }

    /// Returns `false` if the item was definitely never added.
    pub fn query(&self, item: &[u8]) -> bool {
        self.query_many(&[item])
    }

    pub fn query_str(&self, item: &str) -> bool {
        self.query(item.as_bytes())
    }

    /// Tests a composite key built the same way as [`BloomFilter::add_many`].
    ///
    /// An empty slice is never present.
    pub fn query_many<I: AsRef<[u8]>>(&self, parts: &[I]) -> bool {
        if parts.is_empty() {
            return false;
        }
        let pair = self.hash.base_hash(parts);
        pair.indices(self.m, self.k, self.scheme)
            .all(|idx| self.bits[idx as usize])
    }

    /// Tests each item independently.
    pub fn query_each<I: AsRef<[u8]>>(&self, items: &[I]) -> Vec<bool> {
        items.iter().map(|item| self.query(item.as_ref())).collect()
    }

    pub fn m(&self) -> u64 {
        self.m
    }

    pub fn k(&self) -> u64 {
        self.k
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash
    }

    pub fn index_scheme(&self) -> IndexScheme {
        self.scheme
    }

    /// Raw bit vector.
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }
}

impl Sketch for BloomFilter {
    fn assess_fill(&self) -> f64 {
        let set = self.bits.iter().filter(|&&b| b).count();
        set as f64 / self.m as f64
    }

    fn is_empty(&self) -> bool {
        !self.bits.iter().any(|&b| b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_matches_closed_form() {
        let (m, k) = BloomFilter::estimate_size(10_000, 0.01).unwrap();
        // -10000 * ln(0.01) / ln(2)^2 = 95850.58...
        assert_eq!(m, 95_851);
        assert_eq!(k, 7);
    }

    #[test]
    fn estimate_rejects_bad_parameters() {
        for p in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                BloomFilter::estimate_size(100, p),
                Err(SketchError::InvalidParameter(_))
            ));
        }
        assert!(matches!(
            BloomFilter::estimate_size(0, 0.01),
            Err(SketchError::InvalidParameter(_))
        ));
    }

    #[test]
    fn oversized_estimate_is_an_error() {
        let err = BloomFilter::estimate_size(1_000_000_000, 1e-9).unwrap_err();
        assert!(matches!(err, SketchError::Oversized { limit: MAX_BITS, .. }));
    }

    #[test]
    fn explicit_oversized_sizes_rejected() {
        assert_eq!(
            BloomFilter::new(1 << 50, 3, HashAlgorithm::Xxh3).unwrap_err(),
            SketchError::Oversized {
                requested: 1 << 50,
                limit: MAX_BITS,
            }
        );
        assert!(BloomFilter::new(MAX_BITS + 1, 3, HashAlgorithm::Xxh3).is_err());
        assert_eq!(
            BloomFilter::new(64, u64::MAX, HashAlgorithm::Xxh3).unwrap_err(),
            SketchError::Oversized {
                requested: u64::MAX,
                limit: MAX_HASHES,
            }
        );
        assert!(BloomFilter::new(64, MAX_HASHES, HashAlgorithm::Xxh3).is_ok());
    }

    #[test]
    fn loose_rate_still_uses_one_index() {
        let (_, k) = BloomFilter::estimate_size(100, 0.9).unwrap();
        assert_eq!(k, 1);
    }

    #[test]
    fn zero_sizes_rejected() {
        assert!(BloomFilter::new(0, 3, HashAlgorithm::Xxh3).is_err());
        assert!(BloomFilter::new(64, 0, HashAlgorithm::Xxh3).is_err());
    }

    #[test]
    fn add_is_idempotent() {
        let mut bloom = BloomFilter::new(1024, 4, HashAlgorithm::Fnv).unwrap();
        bloom.add_str("consectetur");
        let snapshot = bloom.clone();
        bloom.add_str("consectetur");
        assert_eq!(bloom, snapshot);
    }

    #[test]
    fn sets_at_most_k_bits_per_item() {
        let mut bloom = BloomFilter::new(1 << 16, 5, HashAlgorithm::Xxh3).unwrap();
        assert!(bloom.is_empty());
        bloom.add(b"adipiscing");
        let set = bloom.bits().iter().filter(|&&b| b).count();
        assert!(set >= 1 && set <= 5);
        assert!((bloom.assess_fill() - set as f64 / (1 << 16) as f64).abs() < f64::EPSILON);
    }

    #[test]
    fn composite_and_empty_keys() {
        let mut bloom = BloomFilter::new(4096, 4, HashAlgorithm::Combo).unwrap();
        bloom.add_many(&["192.168.0.1", "53"]);
        assert!(bloom.query_many(&["192.168.0.1", "53"]));

        let empty: [&str; 0] = [];
        bloom.add_many(&empty);
        assert!(!bloom.query_many(&empty));
        assert!(bloom.query_each(&empty).is_empty());
    }
}
