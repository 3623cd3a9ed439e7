// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use thiserror::Error;

/// Error type for sketch construction and merging.
///
/// Data-dependent conditions (collisions, saturated bit vectors, counters near
/// `u64::MAX`) are never errors; they only degrade accuracy.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SketchError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Oversized estimate: {requested} exceeds the limit of {limit}")]
    Oversized { requested: u64, limit: u64 },
    #[error("Merge error: {0}")]
    MergeMismatch(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Read-only diagnostics shared by every structure in this crate.
///
/// Nothing here is needed for add/query to work; the accessors exist for
/// external analysis and tests and never mutate state.
pub trait Sketch {
    /// Fraction of storage cells that are no longer in their initial state.
    ///
    /// Bits set for a Bloom filter, non-zero counters for a Count-Min Sketch,
    /// non-zero registers for a HyperLogLog.
    fn assess_fill(&self) -> f64;

    /// Returns true if nothing has been recorded yet.
    fn is_empty(&self) -> bool;
}
