//! Seeded random number generation.
//!
//! Every engine receives its generator explicitly; nothing in the crate draws
//! from thread-local or global randomness once a seed has been fixed.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// The generator type used by all engines.
pub type RosterRng = StdRng;

/// Creates a deterministic generator from `seed`.
pub fn create_rng(seed: u64) -> RosterRng {
    StdRng::seed_from_u64(seed)
}

/// Resolves an optional seed, drawing a fresh one when `None`.
///
/// The resolved seed is recorded in results so any run can be replayed.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(rand::random)
}

/// Derives an independent child seed for sub-run `stream`.
///
/// SplitMix64 finalizer; used to give concurrent refinement runs their own
/// reproducible streams.
pub fn derive_seed(seed: u64, stream: u64) -> u64 {
    let mut z = seed.wrapping_add(stream.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
