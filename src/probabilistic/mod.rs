// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Probabilistic Data Structures (Sketches)
//!
//! These data structures provide approximate answers to membership, frequency
//! and cardinality queries using a fixed amount of memory. All of them hash an
//! item once into a [`HashPair`](crate::hash::HashPair) and derive every index
//! they need from that pair.

pub mod bloom_filter;
pub mod count_min_sketch;
pub mod hyperloglog;

pub use bloom_filter::BloomFilter;
pub use count_min_sketch::CountMinSketch;
pub use hyperloglog::HyperLogLog;
