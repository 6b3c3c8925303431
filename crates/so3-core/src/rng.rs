use rand::{RngCore, SeedableRng};
/// RNG key system for reproducible parameter initialization.
///
/// Keys are plain u64 seeds. Splitting and sampling both go through ChaCha8,
/// so a given key produces the same values on every platform and backend.
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// An RNG key for deterministic random number generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RngKey(pub u64);

impl RngKey {
    /// Create a new RNG key from a seed.
    pub fn new(seed: u64) -> Self {
        RngKey(seed)
    }

    /// A key seeded from the thread-local entropy source.
    pub fn from_entropy() -> Self {
        RngKey(rand::random())
    }

    /// Split this key into `n` independent keys.
    pub fn split(self, n: usize) -> Vec<RngKey> {
        if n == 0 {
            return Vec::new();
        }
        if n == 1 {
            return vec![self];
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.0);
        (0..n).map(|_| RngKey(rng.next_u64())).collect()
    }

    /// Split into exactly two keys (common case).
    pub fn split_two(self) -> (RngKey, RngKey) {
        let keys = self.split(2);
        (keys[0], keys[1])
    }

    /// Get the seed value.
    pub fn seed(&self) -> u64 {
        self.0
    }

    /// Draw `n` samples from `N(mean, std²)`.
    ///
    /// A non-finite or negative `std` yields zeros rather than panicking;
    /// degenerate layer shapes (empty grid, zero channels) end up here.
    pub fn normal(self, n: usize, mean: f64, std: f64) -> Vec<f32> {
        if !std.is_finite() {
            return vec![0.0; n];
        }
        let mut rng = ChaCha8Rng::seed_from_u64(self.0);
        match Normal::new(mean, std) {
            Ok(dist) => (0..n).map(|_| dist.sample(&mut rng) as f32).collect(),
            Err(_) => vec![0.0; n],
        }
    }
}
