//! Strata: binary marshaling of lattices, records and routine parameters
//! for native simulation engines.
//!
//! This is the top-level facade crate that re-exports the public API of the
//! Strata sub-crates. Most users only need `strata` as a dependency.
//!
//! # Quick start
//!
//! ```rust
//! use strata::prelude::*;
//! use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
//!
//! #[derive(Clone, Copy, Debug, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
//! #[repr(C)]
//! struct Site {
//!     energy: f64,
//!     particle: u32,
//!     flags: u32,
//! }
//!
//! let service = MarshalService::new();
//! let lattice = Lattice::from_fn(&[4, 4], |idx| Site {
//!     energy: idx[0] as f64 - idx[1] as f64,
//!     particle: 1,
//!     flags: 0,
//! })
//! .unwrap();
//!
//! let mut array = InteropArray::from_lattice(lattice);
//! array.to_binary(&service).unwrap();
//! let bytes = array.into_binary().unwrap();
//! assert_eq!(bytes.len(), 12 + 16 * 16);
//!
//! let mut back = InteropArray::<Site>::from_binary(bytes);
//! back.to_object(&service).unwrap();
//! assert_eq!(back.get(&[3, 1]).unwrap().energy, 2.0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`marshal`] | `strata-marshal` | Record codec, buffer pool, marshal service |
//! | [`interop`] | `strata-interop` | Arrays, lists, records, routine blobs, registry |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Record codec, scratch pools and the marshal service (`strata-marshal`).
///
/// [`marshal::MarshalService`] is the entry point; [`marshal::PoolConfig`]
/// tunes scratch entries per record type and the optional lease timeout.
pub use strata_marshal as marshal;

/// Expand/collapse containers (`strata-interop`).
///
/// [`interop::InteropArray`] for N-dimensional lattices,
/// [`interop::InteropList`] for flat sequences,
/// [`interop::RoutineData`] for tagged routine parameters.
pub use strata_interop as interop;

/// Common imports for typical Strata usage.
///
/// ```rust
/// use strata::prelude::*;
/// ```
pub mod prelude {
    // Marshal
    pub use strata_marshal::{FixedLayout, MarshalError, MarshalService, PoolConfig};

    // Containers
    pub use strata_interop::{
        BlobEntity, EntityState, InteropArray, InteropError, InteropList, InteropRecord, Lattice,
    };

    // Routines
    pub use strata_interop::{Routine, RoutineData, RoutineId, RoutineRegistry};
}
