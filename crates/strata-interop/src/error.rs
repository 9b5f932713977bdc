//! Error types for interop containers.

use std::error::Error;
use std::fmt;

use strata_marshal::MarshalError;

use crate::state::EntityState;

/// Errors that can occur while building, indexing, or transitioning a
/// container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteropError {
    /// The marshal layer rejected a record layout or a byte range.
    Marshal(MarshalError),
    /// A transition or accessor was used in the wrong state.
    InvalidState {
        /// The state the operation requires.
        expected: EntityState,
        /// The state the entity is in.
        found: EntityState,
    },
    /// The number of indices does not match the array rank.
    IndexCount {
        /// The array rank.
        expected: usize,
        /// Number of indices supplied.
        found: usize,
    },
    /// One index component is not below its dimension size.
    IndexOutOfRange {
        /// Dimension the index addresses.
        axis: usize,
        /// The offending index.
        index: usize,
        /// Size of that dimension.
        size: usize,
    },
    /// A linear index is not below the array length.
    LinearIndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of elements in the array.
        length: usize,
    },
    /// Dimensions and value count disagree when building a lattice.
    ShapeMismatch {
        /// Element count implied by the dimensions.
        expected: usize,
        /// Number of values supplied.
        found: usize,
    },
    /// The binary payload size is inconsistent with the element type.
    TypeMismatch {
        /// Name of the container's element type.
        type_name: &'static str,
        /// Byte size of one element.
        element_size: usize,
        /// Number of payload bytes after the header.
        payload_len: usize,
    },
    /// The binary header holds impossible values.
    MalformedHeader {
        /// Human-readable description of what went wrong.
        detail: String,
    },
}

impl InteropError {
    /// True for errors in the bounds category: index count or range
    /// mismatches and out-of-range byte access.
    pub fn is_bounds(&self) -> bool {
        match self {
            Self::Marshal(e) => e.is_bounds(),
            Self::IndexCount { .. }
            | Self::IndexOutOfRange { .. }
            | Self::LinearIndexOutOfRange { .. } => true,
            _ => false,
        }
    }

    pub(crate) fn type_mismatch<T>(payload_len: usize) -> Self {
        Self::TypeMismatch {
            type_name: std::any::type_name::<T>(),
            element_size: std::mem::size_of::<T>(),
            payload_len,
        }
    }
}

impl fmt::Display for InteropError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Marshal(e) => write!(f, "marshal error: {e}"),
            Self::InvalidState { expected, found } => {
                write!(f, "entity is {found}, operation requires {expected}")
            }
            Self::IndexCount { expected, found } => {
                write!(f, "cannot index rank-{expected} array with {found} indices")
            }
            Self::IndexOutOfRange { axis, index, size } => {
                write!(f, "index {index} out of range for axis {axis} of size {size}")
            }
            Self::LinearIndexOutOfRange { index, length } => {
                write!(f, "linear index {index} out of range for length {length}")
            }
            Self::ShapeMismatch { expected, found } => {
                write!(f, "dimensions imply {expected} values, got {found}")
            }
            Self::TypeMismatch {
                type_name,
                element_size,
                payload_len,
            } => {
                write!(
                    f,
                    "{payload_len} payload bytes do not hold whole {type_name} elements \
                     of {element_size} bytes"
                )
            }
            Self::MalformedHeader { detail } => write!(f, "malformed header: {detail}"),
        }
    }
}

impl Error for InteropError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Marshal(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MarshalError> for InteropError {
    fn from(e: MarshalError) -> Self {
        Self::Marshal(e)
    }
}
