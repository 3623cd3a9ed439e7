//! # probstruct
//!
//! Approximate streaming data structures built on one shared double-hashing
//! scheme: a Bloom filter for membership, a Count-Min Sketch for frequencies
//! and a HyperLogLog for cardinality.

pub mod config;
pub mod enums;
pub mod hash;
pub mod probabilistic;
pub mod traits;

// Re-export core traits
pub use traits::{Sketch, SketchError};

pub use config::{AnySketch, BloomSizing, CountMinSizing, SketchConfig};
pub use enums::{HashAlgorithm, IndexScheme};
pub use hash::HashPair;
pub use probabilistic::{BloomFilter, CountMinSketch, HyperLogLog};
