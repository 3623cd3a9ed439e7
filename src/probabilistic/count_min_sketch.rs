// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::enums::{HashAlgorithm, IndexScheme};
use crate::traits::{Sketch, SketchError};
use std::f64::consts::E;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Largest counter matrix (`width * depth`) a sketch may allocate.
pub const MAX_CELLS: u64 = u32::MAX as u64;

/// Count-Min Sketch - Frequency Estimation
///
/// A `depth × width` matrix of counters stored row-major in one flat buffer.
/// Each item touches one cell per row; row `i` uses index `i` of the item's
/// double-hashing sequence as its column.
///
/// # Key Properties
///
/// - **Fixed Memory**: `width * depth * 8` bytes, regardless of the number of unique items.
/// - **Conservative**: Frequencies are never underestimated, but may be overestimated due to collisions.
/// - **Lock-free**: Every cell update is an atomic add, so [`increment`](Self::increment)
///   takes `&self` and may be called from many threads at once.
///
/// # Concurrency
///
/// The `depth` cell reads for one item are not a snapshot. A concurrent
/// increment of the same item may be visible in some rows and not yet in
/// others; the returned minimum is then slightly stale but never corrupt.
///
/// # Zero cells
///
/// A cell holding 0 has never been written by anything and carries no
/// information, so it is skipped when taking the minimum. The estimate is 0
/// only if every touched cell is 0.
///
/// # Example
///
/// ```
/// use probstruct::{CountMinSketch, HashAlgorithm};
///
/// let cms = CountMinSketch::with_estimate(0.01, 0.01, HashAlgorithm::Xxh3).unwrap();
/// cms.increment_str("apple");
/// cms.increment_str("apple");
/// cms.increment_str("banana");
///
/// assert!(cms.query_str("apple") >= 2);
/// assert!(cms.query_str("banana") >= 1);
/// ```
#[derive(Debug)]
pub struct CountMinSketch {
    width: u64,
    depth: u64,
    /// Row-major, `depth * width` cells
    count: Vec<AtomicU64>,
    hash: HashAlgorithm,
}

impl CountMinSketch {
    /// Computes `(width, depth)` for additive error `epsilon` with probability `1 - delta`.
    ///
    /// `width = ceil(e / epsilon)`, `depth = ceil(ln(1 / delta))`.
    pub fn estimate_size(epsilon: f64, delta: f64) -> Result<(u64, u64), SketchError> {
        if !(epsilon > 0.0 && epsilon < 1.0) {
            return Err(SketchError::InvalidParameter(format!(
                "epsilon must be 0 < eps < 1, got {}",
                epsilon
            )));
        }
        if !(delta > 0.0 && delta < 1.0) {
            return Err(SketchError::InvalidParameter(format!(
                "delta must be 0 < delta < 1, got {}",
                delta
            )));
        }

        let width = (E / epsilon).ceil();
        let depth = (1.0 / delta).ln().ceil().max(1.0);
        if width * depth > MAX_CELLS as f64 {
            return Err(SketchError::Oversized {
                requested: (width * depth) as u64,
                limit: MAX_CELLS,
            });
        }
        Ok((width as u64, depth as u64))
    }

    /// Creates a zeroed `depth × width` sketch.
    pub fn new(width: u64, depth: u64, hash: HashAlgorithm) -> Result<Self, SketchError> {
        if width == 0 || depth == 0 {
            warn!(width, depth, "refusing to build count-min sketch with zero size");
            return Err(SketchError::InvalidParameter(format!(
                "count-min sketch needs width > 0 and depth > 0, got width={} depth={}",
                width, depth
            )));
        }
        let cells = width
            .checked_mul(depth)
            .filter(|&c| c <= MAX_CELLS)
            .ok_or(SketchError::Oversized {
                requested: width.saturating_mul(depth),
                limit: MAX_CELLS,
            })?;

        debug!(width, depth, %hash, "count-min sketch created");
        Ok(Self {
            width,
            depth,
            count: (0..cells).map(|_| AtomicU64::new(0)).collect(),
            hash,
        })
    }

    /// Creates a sketch sized by [`CountMinSketch::estimate_size`].
    pub fn with_estimate(
        epsilon: f64,
        delta: f64,
        hash: HashAlgorithm,
    ) -> Result<Self, SketchError> {
        let (width, depth) = Self::estimate_size(epsilon, delta).map_err(|e| {
            warn!(epsilon, delta, error = %e, "refusing to size count-min sketch");
            e
        })?;
        Self::new(width, depth, hash)
    }

    /// Counts one occurrence of `item` and returns its new estimated frequency.
    pub fn increment(&self, item: &[u8]) -> u64 {
        self.increment_by(item, 1)
    }

    pub fn increment_str(&self, item: &str) -> u64 {
        self.increment(item.as_bytes())
    }

    /// Counts `n` occurrences of `item` and returns its new estimated frequency.
    ///
    /// Counters saturate at `u64::MAX`.
    pub fn increment_by(&self, item: &[u8], n: u64) -> u64 {
        let mut min = None;
        for cell in self.cells(item) {
            let value = bump(&self.count[cell], n);
            min = lower(min, value);
        }
        min.unwrap_or(0)
    }

    /// Estimated frequency of `item`. Never less than the true count.
    pub fn query(&self, item: &[u8]) -> u64 {
        let mut min = None;
        for cell in self.cells(item) {
            let value = self.count[cell].load(Ordering::Relaxed);
            min = lower(min, value);
        }
        min.unwrap_or(0)
    }

    pub fn query_str(&self, item: &str) -> u64 {
        self.query(item.as_bytes())
    }

    /// Adds every counter of `other` into this sketch.
    ///
    /// Both sketches must share dimensions and hash algorithm. Nothing is
    /// written on mismatch.
    pub fn merge(&self, other: &Self) -> Result<(), SketchError> {
        if self.dimensions() != other.dimensions() || self.hash != other.hash {
            warn!(
                left = ?self.dimensions(),
                right = ?other.dimensions(),
                "count-min sketch merge rejected"
            );
            return Err(SketchError::MergeMismatch(format!(
                "count-min sketches differ: {}x{} {} vs {}x{} {}",
                self.width, self.depth, self.hash, other.width, other.depth, other.hash
            )));
        }

        for (mine, theirs) in self.count.iter().zip(&other.count) {
            let delta = theirs.load(Ordering::Relaxed);
            if delta > 0 {
                bump(mine, delta);
            }
        }
        debug!(width = self.width, depth = self.depth, "count-min sketches merged");
        Ok(())
    }

    /// `(width, depth)`
    pub fn dimensions(&self) -> (u64, u64) {
        (self.width, self.depth)
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash
    }

    /// Row-major snapshot of all counters.
    pub fn raw_counts(&self) -> Vec<u64> {
        self.count.iter().map(|c| c.load(Ordering::Relaxed)).collect()
    }

    /// Flat positions of the cells `item` maps to, one per row.
    fn cells(&self, item: &[u8]) -> impl Iterator<Item = usize> {
        let width = self.width;
        self.hash
            .hash_one(item)
            .indices(width, self.depth, IndexScheme::Linear)
            .enumerate()
            .map(move |(row, col)| (row as u64 * width + col) as usize)
    }
}

/// Saturating atomic add; returns the value after the add.
fn bump(cell: &AtomicU64, n: u64) -> u64 {
    let prev = cell
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| {
            Some(c.saturating_add(n))
        })
        .unwrap_or_else(|c| c);
    prev.saturating_add(n)
}

/// Running minimum over non-zero cells. `None` stands for "no information yet".
fn lower(min: Option<u64>, value: u64) -> Option<u64> {
    if value == 0 {
        return min;
    }
    Some(min.map_or(value, |m| m.min(value)))
}

impl Clone for CountMinSketch {
    fn clone(&self) -> Self {
        Self {
            width: self.width,
            depth: self.depth,
            count: self.raw_counts().into_iter().map(AtomicU64::new).collect(),
            hash: self.hash,
        }
    }
}

impl Sketch for CountMinSketch {
    fn assess_fill(&self) -> f64 {
        let used = self
            .count
            .iter()
            .filter(|c| c.load(Ordering::Relaxed) > 0)
            .count();
        used as f64 / self.count.len() as f64
    }

    fn is_empty(&self) -> bool {
        self.count.iter().all(|c| c.load(Ordering::Relaxed) == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_matches_closed_form() {
        let (width, depth) = CountMinSketch::estimate_size(0.01, 0.01).unwrap();
        // e / 0.01 = 271.8..., ln(100) = 4.6...
        assert_eq!(width, 272);
        assert_eq!(depth, 5);
    }

    #[test]
    fn estimate_rejects_out_of_range() {
        for (eps, delta) in [(0.0, 0.1), (1.0, 0.1), (0.1, 0.0), (0.1, 1.0), (f64::NAN, 0.1)] {
            assert!(matches!(
                CountMinSketch::estimate_size(eps, delta),
                Err(SketchError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn oversized_matrix_rejected() {
        assert!(matches!(
            CountMinSketch::estimate_size(1e-12, 0.01),
            Err(SketchError::Oversized { .. })
        ));
        assert!(matches!(
            CountMinSketch::new(u64::MAX, 2, HashAlgorithm::Xxh3),
            Err(SketchError::Oversized { .. })
        ));
    }

    #[test]
    fn lower_skips_zero_cells() {
        assert_eq!(lower(None, 0), None);
        assert_eq!(lower(None, 5), Some(5));
        assert_eq!(lower(Some(5), 0), Some(5));
        assert_eq!(lower(Some(5), 3), Some(3));
    }

    #[test]
    fn bump_saturates() {
        let cell = AtomicU64::new(u64::MAX - 1);
        assert_eq!(bump(&cell, 5), u64::MAX);
        assert_eq!(cell.load(Ordering::Relaxed), u64::MAX);
    }

    #[test]
    fn increment_touches_one_cell_per_row() {
        let cms = CountMinSketch::new(50, 4, HashAlgorithm::Sip128).unwrap();
        assert_eq!(cms.increment(b"lorem"), 1);

        let counts = cms.raw_counts();
        assert_eq!(counts.len(), 200);
        for row in counts.chunks(50) {
            assert_eq!(row.iter().sum::<u64>(), 1);
        }
        assert!((cms.assess_fill() - 4.0 / 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unseen_item_on_fresh_sketch_is_zero() {
        let cms = CountMinSketch::new(16, 3, HashAlgorithm::Xxh3).unwrap();
        assert!(cms.is_empty());
        assert_eq!(cms.query(b"nothing"), 0);
    }

    #[test]
    fn increment_by_adds_weight() {
        let cms = CountMinSketch::new(64, 3, HashAlgorithm::Fnv).unwrap();
        assert_eq!(cms.increment_by(b"ipsum", 10), 10);
        assert_eq!(cms.increment(b"ipsum"), 11);
        assert_eq!(cms.query(b"ipsum"), 11);
    }

    #[test]
    fn merge_requires_matching_shape() {
        let a = CountMinSketch::new(64, 3, HashAlgorithm::Xxh3).unwrap();
        let b = CountMinSketch::new(32, 3, HashAlgorithm::Xxh3).unwrap();
        let c = CountMinSketch::new(64, 3, HashAlgorithm::Fnv).unwrap();
        b.increment(b"x");
        assert!(matches!(a.merge(&b), Err(SketchError::MergeMismatch(_))));
        assert!(matches!(a.merge(&c), Err(SketchError::MergeMismatch(_))));
        assert!(a.is_empty());
    }

    #[test]
    fn clone_is_independent() {
        let a = CountMinSketch::new(64, 3, HashAlgorithm::Xxh3).unwrap();
        a.increment(b"dolor");
        let b = a.clone();
        a.increment(b"dolor");
        assert_eq!(b.query(b"dolor"), 1);
        assert_eq!(a.query(b"dolor"), 2);
    }
}
