//! Deterministic PRNG used for sampling and transform instantiation.

/// Minimal xorshift64 PRNG — deterministic and reproducible.
///
/// Every randomized decision in the dataset (excerpt offset, transform
/// parameters) draws from a stream derived from `(seed, index)`, so a sample
/// can be regenerated bit-identically by any replica.
#[derive(Clone, Debug)]
pub struct Xorshift64(u64);

impl Xorshift64 {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        // xorshift64 has a fixed point at zero.
        Self(if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed })
    }

    /// Stream for one dataset index: independent across indices, identical
    /// across replicas.
    #[must_use]
    pub fn for_index(seed: u64, index: u64) -> Self {
        Self::new(splitmix64(seed ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15)))
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    /// Returns `f64` in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Returns `f64` in `[min, max)`.
    pub fn range_f64(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.next_f64()
    }

    /// Returns `u64` in `[min, max)`.
    pub fn range_u64(&mut self, min: u64, max: u64) -> u64 {
        min + ((max - min) as f64 * self.next_f64()) as u64
    }

    /// Bernoulli draw with probability `p`.
    pub fn next_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}
