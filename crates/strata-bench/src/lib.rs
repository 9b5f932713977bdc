//! Benchmark workloads and utilities for the Strata marshaling crates.
//!
//! - [`reference_lattice`]: 32x32x32 lattice of `Vec3` (32K elements)
//! - [`reference_occupations`]: 64x64 site occupations
//! - [`init_tracing`]: opt-in log output for bench runs via `RUST_LOG`

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Once;

use strata_interop::Lattice;
use strata_test_utils::{occupation_lattice, vec3_lattice, Occupation, Vec3};
use tracing_subscriber::EnvFilter;

/// Dimensions of the reference vector lattice.
pub const REFERENCE_DIMS: [usize; 3] = [32, 32, 32];

/// Dimensions of the reference occupation lattice.
pub const OCCUPATION_DIMS: [usize; 2] = [64, 64];

/// Build the reference vector lattice for `seed`.
pub fn reference_lattice(seed: u64) -> Lattice<Vec3> {
    vec3_lattice(seed, &REFERENCE_DIMS)
}

/// Build the reference occupation lattice for `seed`.
pub fn reference_occupations(seed: u64) -> Lattice<Occupation> {
    occupation_lattice(seed, &OCCUPATION_DIMS)
}

/// Install a `fmt` subscriber filtered by `RUST_LOG`, if it is set.
///
/// Safe to call from every bench; only the first call has an effect.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        if std::env::var_os("RUST_LOG").is_none() {
            return;
        }
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .try_init();
    });
}
