//! Reusable fixture records.
//!
//! Three record shapes that mirror what the native engine exchanges:
//!
//! - [`Vec3`]: a Cartesian vector, the typical array element.
//! - [`Occupation`]: a small packed record with explicit padding.
//! - [`JumpParams`]: a routine parameter record, paired with [`JumpRoutine`].

use strata_interop::{Routine, RoutineId};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Cartesian vector of three doubles (24 bytes).
#[derive(Clone, Copy, Debug, Default, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Occupation of one lattice site (8 bytes).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct Occupation {
    pub particle: u8,
    pub flags: u8,
    pub padding: [u8; 2],
    pub site: u32,
}

/// Parameters of a kinetic jump routine (32 bytes).
#[derive(Clone, Copy, Debug, Default, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct JumpParams {
    pub attempt_frequency: f64,
    pub temperature: f64,
    pub seed: u64,
    pub mcs_target: u32,
    pub flags: u32,
}

/// Marker routine consuming [`JumpParams`].
pub struct JumpRoutine;

impl Routine for JumpRoutine {
    type Params = JumpParams;
    const ID: RoutineId = RoutineId::from_u128(0x4f2c_9a10_5e3b_4c71_8d06_a2e4_17b9_c3d5);
    const ALIAS: &'static str = "jump";
}

/// Marker routine whose parameters are a bare site count.
pub struct SiteCountRoutine;

impl Routine for SiteCountRoutine {
    type Params = u64;
    const ID: RoutineId = RoutineId::from_u128(0x9e71_02bd_c4a8_4f5e_b319_6d0a_e5c2_8f47);
    const ALIAS: &'static str = "site-count";
}
