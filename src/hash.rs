// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Base hashing and double-hashing index generation.
//!
//! Every structure in this crate hashes an item exactly once into a
//! [`HashPair`] and expands that pair into as many indices as it needs
//! (Kirsch & Mitzenmacher, "Less Hashing, Same Performance").

use crate::enums::{HashAlgorithm, IndexScheme};
use fnv::FnvHasher;
use siphasher::sip128::{Hasher128, SipHasher13};
use std::hash::Hasher;
use xxhash_rust::xxh3::Xxh3;
use xxhash_rust::xxh64::Xxh64;

/// Two 64-bit values derived from the same input, used as double-hashing seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HashPair {
    pub h1: u64,
    pub h2: u64,
}

impl HashPair {
    pub fn new(h1: u64, h2: u64) -> Self {
        Self { h1, h2 }
    }

    /// Expands the pair into `n` indices in `[0, bound)` with the linear formula
    /// `(h1 + i*h2) mod bound`, using wrapping `u64` arithmetic.
    ///
    /// This is the index contract for every structure built with the default
    /// [`IndexScheme::Linear`]. `bound` must be non-zero; callers guarantee it.
    pub fn transform(&self, bound: u64, n: u64) -> Vec<u64> {
        self.indices(bound, n, IndexScheme::Linear).collect()
    }

    /// Lazily yields `n` indices in `[0, bound)` using the given scheme.
    pub fn indices(&self, bound: u64, n: u64, scheme: IndexScheme) -> Indices {
        Indices {
            pair: *self,
            bound,
            n,
            i: 0,
            scheme,
        }
    }
}

/// Iterator returned by [`HashPair::indices`].
#[derive(Debug, Clone)]
pub struct Indices {
    pair: HashPair,
    bound: u64,
    n: u64,
    i: u64,
    scheme: IndexScheme,
}

impl Iterator for Indices {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.i >= self.n {
            return None;
        }
        let i = self.i;
        self.i += 1;

        let mut x = self.pair.h1.wrapping_add(i.wrapping_mul(self.pair.h2));
        if self.scheme == IndexScheme::Quadratic {
            x = x.wrapping_add(i.wrapping_mul(i));
        }
        Some(x % self.bound)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.n - self.i) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Indices {}

impl HashAlgorithm {
    /// Hashes a sequence of byte strings into a single [`HashPair`].
    ///
    /// All parts are fed into one accumulator in order before finalizing, so a
    /// composite key yields one pair rather than one pair per part. An empty
    /// sequence yields `(0, 0)`.
    pub fn base_hash<I: AsRef<[u8]>>(&self, items: &[I]) -> HashPair {
        if items.is_empty() {
            return HashPair::default();
        }

        match self {
            HashAlgorithm::Xxh3 => {
                let mut hasher = Xxh3::new();
                for item in items {
                    hasher.update(item.as_ref());
                }
                let digest = hasher.digest128();
                HashPair::new((digest >> 64) as u64, digest as u64)
            }
            HashAlgorithm::Sip128 => {
                let mut hasher = SipHasher13::new();
                for item in items {
                    hasher.write(item.as_ref());
                }
                let digest = hasher.finish128();
                HashPair::new(digest.h1, digest.h2)
            }
            HashAlgorithm::Fnv => {
                let mut hasher = FnvHasher::default();
                for item in items {
                    hasher.write(item.as_ref());
                }
                let h1 = hasher.finish();
                // Perturb the same accumulator for a second value.
                hasher.write(&[1]);
                HashPair::new(h1, hasher.finish())
            }
            HashAlgorithm::Combo => {
                let mut fnv = FnvHasher::default();
                let mut xxh = Xxh64::new(0);
                for item in items {
                    fnv.write(item.as_ref());
                    xxh.update(item.as_ref());
                }
                HashPair::new(fnv.finish(), xxh.digest())
            }
        }
    }

    /// Shorthand for hashing a single item.
    pub fn hash_one(&self, item: &[u8]) -> HashPair {
        self.base_hash(&[item])
    }
}
