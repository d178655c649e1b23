//! Deterministic random rolls for damage snapshots.
//!
//! Every roll is a pure function of its seed, so a cast replayed with the
//! same stats, seed and tick sequence produces the same critical hits.

/// Stateless random source keyed by an explicit seed.
pub trait RngOracle {
    fn next_u32(&self, seed: u64) -> u32;

    /// Uniform value in `[0, 1)`.
    fn unit_f32(&self, seed: u64) -> f32 {
        // 24 bits is the f32 mantissa width.
        (self.next_u32(seed) >> 8) as f32 / (1u32 << 24) as f32
    }
}

/// PCG-XSH-RR generator: one LCG step, then an xorshift and a random rotate.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::pcg_output(Self::pcg_step(seed))
    }
}

/// Mixes a base seed with the cast number and the firing counter.
///
/// `firing` distinguishes the damage firings of one cast, so every firing
/// rolls independently while a whole firing shares one roll.
pub fn compute_seed(base_seed: u64, cast: u64, firing: u32) -> u64 {
    let mut hash = base_seed;
    hash ^= cast.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= (firing as u64).wrapping_mul(0x85ebca6b);

    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash
}
