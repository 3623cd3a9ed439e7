// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::enums::HashAlgorithm;
use crate::traits::{Sketch, SketchError};
use tracing::{debug, warn};

/// Smallest supported precision (16 registers).
pub const MIN_PRECISION: u8 = 4;

/// Largest supported precision (65,536 registers).
pub const MAX_PRECISION: u8 = 16;

/// Bias correction constant for `m` registers.
fn alpha_for(m: usize) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / m as f64),
    }
}

/// HyperLogLog - Cardinality Estimation
///
/// `2^p` registers, each holding the longest leading-zero run (plus one) seen
/// among the hashes routed to it. The top `p` bits of an item's first hash
/// value pick the register; the remaining `64 - p` bits supply the run.
///
/// # Key Properties
///
/// - **Fixed Memory**: One byte per register.
/// - **Idempotent**: Adding the same element multiple times does not change any register.
/// - **Mergeable**: The union of two streams is the element-wise maximum of their registers.
///
/// # Estimator
///
/// [`count`](Self::count) is the raw harmonic-mean estimator over the non-zero
/// registers, scaled by `alpha`. There is no small-range or large-range
/// correction, so it is reliable only when the cardinality is well above the
/// register count (a few times `m`) and far below `2^64`.
///
/// # Example
///
/// ```
/// use probstruct::{HashAlgorithm, HyperLogLog};
///
/// let mut hll = HyperLogLog::new(10, HashAlgorithm::Xxh3).unwrap();
/// for i in 0..50_000 {
///     hll.add_str(&format!("user{}", i));
/// }
///
/// let count = hll.count();
/// assert!(count > 40_000 && count < 60_000);
/// ```
#[derive(Debug, Clone)]
pub struct HyperLogLog {
    p: u8,
    buckets: Vec<u8>,
    alpha: f64,
    cardinality: u64,
    hash: HashAlgorithm,
}

impl HyperLogLog {
    /// Creates an empty sketch with `2^precision` registers.
    ///
    /// `precision` must lie in `4..=16`.
    pub fn new(precision: u8, hash: HashAlgorithm) -> Result<Self, SketchError> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            warn!(precision, "refusing to build hyperloglog");
            return Err(SketchError::InvalidParameter(format!(
                "precision must be between {} and {}, got {}",
                MIN_PRECISION, MAX_PRECISION, precision
            )));
        }
        let m = 1usize << precision;

        debug!(precision, registers = m, %hash, "hyperloglog created");
        Ok(Self {
            p: precision,
            buckets: vec![0u8; m],
            alpha: alpha_for(m),
            cardinality: 0,
            hash,
        })
    }

    /// Add an element.
    ///
    /// Returns `true` if a register changed.
    pub fn add(&mut self, item: &[u8]) -> bool {
        let hash = self.hash.hash_one(item).h1;
        self.add_hash(hash)
    }

    pub fn add_str(&mut self, item: &str) -> bool {
        self.add(item.as_bytes())
    }

    /// Adds each item independently.
    pub fn add_many<I: AsRef<[u8]>>(&mut self, items: &[I]) {
        for item in items {
            self.add(item.as_ref());
        }
    }

    fn add_hash(&mut self, hash: u64) -> bool {
        let p = u32::from(self.p);
        let index = (hash >> (64 - p)) as usize;
        // All-zero tails cap out at 64 - p zeros.
        let tail = hash << p;
        let run = tail.leading_zeros().min(64 - p) as u8 + 1;

        let register = &mut self.buckets[index];
        if run > *register {
            *register = run;
            true
        } else {
            false
        }
    }

    /// Recomputes the cardinality estimate from the registers and caches it.
    ///
    /// Registers still at zero are left out of the harmonic sum. An untouched
    /// sketch counts as 0.
    pub fn count(&mut self) -> u64 {
        let sum: f64 = self
            .buckets
            .iter()
            .filter(|&&r| r > 0)
            .map(|&r| 2f64.powi(-i32::from(r)))
            .sum();

        self.cardinality = if sum == 0.0 {
            0
        } else {
            let m = self.buckets.len() as f64;
            (self.alpha * m * m / sum).floor() as u64
        };
        self.cardinality
    }

    /// The estimate computed by the last [`count`](Self::count) call.
    pub fn cardinality(&self) -> u64 {
        self.cardinality
    }

    /// Returns a new sketch holding the union of `self` and `other`.
    ///
    /// Fails without touching either operand if precision or hash algorithm differ.
    pub fn merge(&self, other: &Self) -> Result<Self, SketchError> {
        Self::merge_all(&[self, other])
    }

    /// Merges any number of compatible sketches into a new one.
    pub fn merge_all(sketches: &[&Self]) -> Result<Self, SketchError> {
        let first = sketches.first().ok_or_else(|| {
            SketchError::MergeMismatch("at least one hyperloglog is needed for merging".into())
        })?;

        for other in &sketches[1..] {
            if other.p != first.p {
                warn!(left = first.p, right = other.p, "hyperloglog precision mismatch");
                return Err(SketchError::MergeMismatch(format!(
                    "hyperloglog precision mismatch {} - {}",
                    first.p, other.p
                )));
            }
            if other.hash != first.hash {
                warn!(left = %first.hash, right = %other.hash, "hyperloglog hash mismatch");
                return Err(SketchError::MergeMismatch(format!(
                    "hyperloglog hash algorithm mismatch {} - {}",
                    first.hash, other.hash
                )));
            }
        }

        let mut merged = Self::new(first.p, first.hash)?;
        for sketch in sketches {
            for (mine, &theirs) in merged.buckets.iter_mut().zip(&sketch.buckets) {
                *mine = (*mine).max(theirs);
            }
        }
        debug!(precision = first.p, operands = sketches.len(), "hyperloglogs merged");
        Ok(merged)
    }

    pub fn precision(&self) -> u8 {
        self.p
    }

    /// Number of registers, `2^p`.
    pub fn register_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash
    }

    pub fn registers(&self) -> &[u8] {
        &self.buckets
    }
}

/// Equal when precision, hash algorithm and registers match; the cached
/// cardinality is ignored.
impl PartialEq for HyperLogLog {
    fn eq(&self, other: &Self) -> bool {
        self.p == other.p && self.hash == other.hash && self.buckets == other.buckets
    }
}

impl Sketch for HyperLogLog {
    fn assess_fill(&self) -> f64 {
        let used = self.buckets.iter().filter(|&&r| r > 0).count();
        used as f64 / self.buckets.len() as f64
    }

    fn is_empty(&self) -> bool {
        self.buckets.iter().all(|&r| r == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_bounds() {
        assert!(HyperLogLog::new(3, HashAlgorithm::Xxh3).is_err());
        assert!(HyperLogLog::new(17, HashAlgorithm::Xxh3).is_err());
        assert_eq!(HyperLogLog::new(4, HashAlgorithm::Xxh3).unwrap().register_count(), 16);
        assert_eq!(HyperLogLog::new(16, HashAlgorithm::Xxh3).unwrap().register_count(), 65_536);
    }

    #[test]
    fn alpha_table_and_formula() {
        assert_eq!(alpha_for(16), 0.673);
        assert_eq!(alpha_for(32), 0.697);
        assert_eq!(alpha_for(64), 0.709);
        let expected = 0.7213 / (1.0 + 1.079 / 1024.0);
        assert!((alpha_for(1024) - expected).abs() < 1e-12);
    }

    #[test]
    fn register_selection_and_run_length() {
        let mut hll = HyperLogLog::new(4, HashAlgorithm::Xxh3).unwrap();

        // index 0b1010, tail starts with 0b001 -> two zeros, run 3
        let hash = (0b1010u64 << 60) | (0b001u64 << 57);
        assert!(hll.add_hash(hash));
        assert_eq!(hll.registers()[10], 3);

        // smaller run keeps the register
        assert!(!hll.add_hash((0b1010u64 << 60) | (1u64 << 59)));
        assert_eq!(hll.registers()[10], 3);
    }

    #[test]
    fn zero_tail_is_capped() {
        let mut hll = HyperLogLog::new(16, HashAlgorithm::Xxh3).unwrap();
        hll.add_hash(0xFFFF << 48);
        assert_eq!(hll.registers()[0xFFFF], 64 - 16 + 1);
    }

    #[test]
    fn empty_counts_zero() {
        let mut hll = HyperLogLog::new(8, HashAlgorithm::Fnv).unwrap();
        assert!(hll.is_empty());
        assert_eq!(hll.count(), 0);
    }

    #[test]
    fn count_uses_nonzero_registers_only() {
        let mut hll = HyperLogLog::new(4, HashAlgorithm::Xxh3).unwrap();
        hll.buckets[0] = 1;
        hll.buckets[1] = 2;
        // 0.673 * 256 / (0.5 + 0.25) = 229.71
        assert_eq!(hll.count(), 229);
        assert_eq!(hll.cardinality(), 229);
    }

    #[test]
    fn equality_ignores_cached_cardinality() {
        let mut a = HyperLogLog::new(6, HashAlgorithm::Xxh3).unwrap();
        for i in 0..500u32 {
            a.add(&i.to_le_bytes());
        }
        let b = a.clone();
        assert!(a.count() > 0);
        assert_ne!(a.cardinality(), b.cardinality());
        assert_eq!(a, b);

        let other_hash = HyperLogLog::new(6, HashAlgorithm::Fnv).unwrap();
        assert_ne!(HyperLogLog::new(6, HashAlgorithm::Xxh3).unwrap(), other_hash);
    }

    #[test]
    fn merge_all_needs_operands() {
        assert!(matches!(
            HyperLogLog::merge_all(&[]),
            Err(SketchError::MergeMismatch(_))
        ));
    }
}
