//! Stateless hashing for draw-time jitter, plus seeding for scenario RNGs.
//!
//! Rendering must not touch simulation state, so decorative randomness in
//! `compose` (rain streaks, flicker) is a pure function of the tick.

use rand::{SeedableRng, rngs::StdRng};

#[inline]
pub fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Uniform value in `[0, 1)` derived from `(tick, salt)`.
#[inline]
pub fn hash_unit(tick: u64, salt: u64) -> f32 {
    let h = splitmix64(tick ^ splitmix64(salt));
    (h >> 40) as f32 / 16777216.0
}

/// Seeded generator for one scenario. `salt` keeps scenarios sharing a seed
/// from drawing identical streams.
pub fn scenario_rng(seed: u64, salt: u64) -> StdRng {
    StdRng::seed_from_u64(splitmix64(seed ^ salt))
}
