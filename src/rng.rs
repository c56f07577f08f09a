//! Reproducible random streams.
//!
//! Every random source in the model is an [`RngStream`] derived from a run
//! seed and a stream index, so a harness can hand out disjoint, repeatable
//! streams across a whole topology.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp};

pub const DEFAULT_SEED: u64 = 1;

/// Anything that owns random sources.
pub trait AssignStreams {
    /// Re-seeds every internal source starting at `first_stream`; returns how
    /// many stream indices were consumed.
    fn assign_streams(&mut self, seed: u64, first_stream: u64) -> u64;
}

#[derive(Debug, Clone)]
pub struct RngStream {
    seed: u64,
    stream: u64,
    rng: StdRng,
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

impl RngStream {
    pub fn new(seed: u64, stream: u64) -> Self {
        Self {
            seed,
            stream,
            rng: StdRng::seed_from_u64(splitmix64(seed ^ splitmix64(stream))),
        }
    }

    pub fn set_stream(&mut self, seed: u64, stream: u64) {
        *self = Self::new(seed, stream);
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn stream(&self) -> u64 {
        self.stream
    }

    /// Uniform in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Uniform integer in `[0, max]`.
    pub fn uniform_int(&mut self, max: u32) -> u32 {
        self.rng.random_range(0..=max)
    }

    /// Exponential sample with the given mean; a non-positive mean yields 0.
    pub fn exponential(&mut self, mean: f64) -> f64 {
        if !(mean > 0.0) {
            return 0.0;
        }
        match Exp::new(1.0 / mean) {
            Ok(exp) => exp.sample(&mut self.rng),
            Err(_) => 0.0,
        }
    }
}

impl Default for RngStream {
    fn default() -> Self {
        Self::new(DEFAULT_SEED, 0)
    }
}
