//! Expand/collapse interop containers for native simulation data.
//!
//! Each container holds its data either as typed Rust values or as the
//! flat byte image the native engine reads, never both at once. Switching
//! between the two goes through a shared
//! [`MarshalService`](strata_marshal::MarshalService).
//!
//! # Containers
//!
//! | Type                | Binary form                                      |
//! |---------------------|--------------------------------------------------|
//! | [`InteropArray`]    | `[rank][length][skips..]` header + row-major data |
//! | [`InteropList`]     | records back to back, no header                  |
//! | [`InteropRecord`]   | one record, no header                            |
//! | [`RoutineData`]     | 16-byte routine id + one parameter record        |
//!
//! All of them implement [`BlobEntity`]. Header integers are little-endian
//! `i32`; records are copied in host layout.
//!
//! # Example
//!
//! ```
//! use strata_interop::{BlobEntity, InteropArray, Lattice};
//! use strata_marshal::MarshalService;
//!
//! let service = MarshalService::new();
//! let lattice = Lattice::from_fn(&[2, 3], |idx| (idx[0] * 3 + idx[1]) as u32).unwrap();
//! let mut array = InteropArray::from_lattice(lattice);
//!
//! array.to_binary(&service).unwrap();
//! assert_eq!(array.header_byte_count(), 12);
//! assert_eq!(array.blob_byte_count(), 12 + 6 * 4);
//!
//! array.to_object(&service).unwrap();
//! assert_eq!(array.get(&[1, 2]).unwrap(), 5);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod array;
pub mod error;
pub mod lattice;
pub mod list;
pub mod record;
pub mod registry;
pub mod routine;
pub mod state;

pub use array::{header_size, InteropArray};
pub use error::InteropError;
pub use lattice::{Dims, Lattice};
pub use list::InteropList;
pub use record::InteropRecord;
pub use registry::{RegistryError, RoutineRegistry};
pub use routine::{
    ParseRoutineIdError, Routine, RoutineData, RoutineEntity, RoutineId, ROUTINE_HEADER_SIZE,
};
pub use state::{collapse_all, expand_all, BlobEntity, EntityState, Payload};
