//! Fixture records and seeded generators for Strata development.
//!
//! Provides zerocopy record types shared by integration tests and benches
//! ([`fixtures`]), plus deterministic generators built on a seeded
//! ChaCha stream so failures reproduce from the seed alone.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{JumpParams, JumpRoutine, Occupation, SiteCountRoutine, Vec3};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use strata_interop::Lattice;

/// Deterministic RNG for a test seed.
pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

pub fn random_vec3(rng: &mut impl Rng) -> Vec3 {
    Vec3::new(
        rng.random_range(-10.0..10.0),
        rng.random_range(-10.0..10.0),
        rng.random_range(-10.0..10.0),
    )
}

/// `count` random vectors from `seed`.
pub fn random_vec3s(seed: u64, count: usize) -> Vec<Vec3> {
    let mut rng = rng(seed);
    (0..count).map(|_| random_vec3(&mut rng)).collect()
}

pub fn random_occupation(rng: &mut impl Rng) -> Occupation {
    Occupation {
        particle: rng.random_range(0..8),
        flags: rng.random(),
        padding: [0; 2],
        site: rng.random(),
    }
}

pub fn random_jump_params(rng: &mut impl Rng) -> JumpParams {
    JumpParams {
        attempt_frequency: rng.random_range(1.0e12..1.0e14),
        temperature: rng.random_range(100.0..2000.0),
        seed: rng.random(),
        mcs_target: rng.random_range(1..100_000),
        flags: rng.random(),
    }
}

/// A lattice of `dims` filled with random vectors from `seed`.
pub fn vec3_lattice(seed: u64, dims: &[usize]) -> Lattice<Vec3> {
    let mut rng = rng(seed);
    Lattice::from_fn(dims, |_| random_vec3(&mut rng))
        .unwrap_or_else(|e| panic!("fixture lattice {dims:?}: {e}"))
}

/// A lattice of `dims` filled with random occupations from `seed`.
pub fn occupation_lattice(seed: u64, dims: &[usize]) -> Lattice<Occupation> {
    let mut rng = rng(seed);
    Lattice::from_fn(dims, |_| random_occupation(&mut rng))
        .unwrap_or_else(|e| panic!("fixture lattice {dims:?}: {e}"))
}
