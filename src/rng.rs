use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

/// The single random source threaded through an environment
pub type SimRng = ChaCha12Rng;

/// Create a deterministic RNG from a seed.
pub fn create_rng(seed: u64) -> SimRng {
    SimRng::seed_from_u64(seed)
}
