//! Bloom filter sizing and position hashing.
//!
//! The filter itself is never materialized: the private key holds one slot per
//! bit and puncturing a slot plays the role of setting the bit.

use std::f64::consts::LN_2;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Domain separation tag of the position hash.
const POSITION_DOMAIN: &[u8] = b"BFE_HASH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BloomFilterParameters {
    bitset_size: usize,
    hash_count: usize,
}

impl BloomFilterParameters {
    /// Derives the filter size `m` and the number of hash functions `k` from
    /// the number of expected punctures `n` and the targeted false-positive
    /// probability `p`:
    ///
    /// - `m = ceil(-n ln(p) / ln(2)^2)`
    /// - `k = ceil(m / n ln(2))`
    pub fn new(capacity: u64, false_positive_probability: f64) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::ParameterError(
                "the capacity of the filter must be positive".to_string(),
            ));
        }
        if !(false_positive_probability > 0.0 && false_positive_probability < 1.0) {
            return Err(Error::ParameterError(format!(
                "false positive probability {false_positive_probability} is not in (0, 1)"
            )));
        }

        let n = capacity as f64;
        let m = -(n * false_positive_probability.ln() / (LN_2 * LN_2)).floor();
        if !m.is_finite() || m >= usize::MAX as f64 {
            return Err(Error::ParameterError(format!(
                "a filter of {m} slots cannot be addressed on this platform"
            )));
        }
        let k = (m / n * LN_2).ceil();

        Self::from_raw(m as usize, k as usize)
    }

    /// Builds parameters from an already derived bitset size and hash count.
    ///
    /// Derived parameters never use more hash functions than there are slots.
    pub fn from_raw(bitset_size: usize, hash_count: usize) -> Result<Self, Error> {
        if bitset_size == 0 || hash_count == 0 {
            return Err(Error::ParameterError(format!(
                "empty filter: bitset size {bitset_size}, hash count {hash_count}"
            )));
        }
        if hash_count > bitset_size {
            return Err(Error::ParameterError(format!(
                "{hash_count} hash functions for a filter of {bitset_size} slots"
            )));
        }
        Ok(Self {
            bitset_size,
            hash_count,
        })
    }

    /// Number of slots `m`.
    #[must_use]
    pub fn bitset_size(&self) -> usize {
        self.bitset_size
    }

    /// Number of positions `k` per element.
    #[must_use]
    pub fn hash_count(&self) -> usize {
        self.hash_count
    }

    /// Returns the position in `[0, m)` given by the `hash_index`-th hash
    /// function for the given data.
    #[must_use]
    pub fn position(&self, hash_index: u64, data: &[u8]) -> usize {
        let mut digest = [0; 8];
        shake256!(&mut digest, POSITION_DOMAIN, &hash_index.to_le_bytes(), data);
        // The remainder is lower than `m` which is a `usize`.
        (u64::from_le_bytes(digest) % self.bitset_size as u64) as usize
    }

    /// Returns the `k` positions of the given data, in hash order. Positions
    /// may repeat.
    #[must_use]
    pub fn positions(&self, data: &[u8]) -> Vec<usize> {
        (0..self.hash_count as u64)
            .map(|hash_index| self.position(hash_index, data))
            .collect()
    }

    /// Expected probability that all positions of a fresh element are already
    /// set after `punctures` insertions.
    #[must_use]
    pub fn false_positive_rate(&self, punctures: u64) -> f64 {
        let k = self.hash_count as f64;
        let m = self.bitset_size as f64;
        (1.0 - (-k * punctures as f64 / m).exp()).powf(k)
    }
}
