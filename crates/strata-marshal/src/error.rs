//! Marshal-specific error types.

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Errors that can occur while marshaling records or leasing scratch memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarshalError {
    /// The record type cannot be used for the requested operation
    /// (e.g. a zero-sized type where an element count must be derived).
    Layout {
        /// Name of the offending type.
        type_name: &'static str,
        /// Human-readable description of what went wrong.
        reason: String,
    },
    /// A byte range lies (partly) outside the buffer it addresses.
    Bounds {
        /// First byte of the requested range.
        offset: usize,
        /// Length of the requested range in bytes.
        len: usize,
        /// Length of the buffer.
        buffer_len: usize,
    },
    /// Every scratch entry for the type stayed leased for the whole timeout.
    LeaseTimeout {
        /// Name of the record type whose pool was exhausted.
        type_name: &'static str,
        /// How long the caller waited.
        waited: Duration,
    },
    /// The pool's free-entry queue was disconnected.
    PoolDisconnected {
        /// Name of the record type whose pool was affected.
        type_name: &'static str,
    },
    /// The pool's type map lock was poisoned by a panicking thread.
    PoolPoisoned,
    /// A [`PoolConfig`](crate::PoolConfig) value is out of range.
    InvalidConfig {
        /// Human-readable description of the invalid setting.
        reason: String,
    },
}

impl MarshalError {
    /// Build a [`MarshalError::Layout`] for type `T`.
    pub fn layout<T: ?Sized>(reason: impl Into<String>) -> Self {
        Self::Layout {
            type_name: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }

    /// True for [`MarshalError::Bounds`].
    pub fn is_bounds(&self) -> bool {
        matches!(self, Self::Bounds { .. })
    }
}

impl fmt::Display for MarshalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layout { type_name, reason } => {
                write!(f, "layout error for {type_name}: {reason}")
            }
            Self::Bounds {
                offset,
                len,
                buffer_len,
            } => {
                write!(
                    f,
                    "byte range {offset}..{} out of bounds for buffer of {buffer_len} bytes",
                    offset.saturating_add(*len)
                )
            }
            Self::LeaseTimeout { type_name, waited } => {
                write!(
                    f,
                    "no scratch entry for {type_name} became free within {waited:?}"
                )
            }
            Self::PoolDisconnected { type_name } => {
                write!(f, "scratch pool for {type_name} is disconnected")
            }
            Self::PoolPoisoned => write!(f, "buffer pool lock poisoned"),
            Self::InvalidConfig { reason } => write!(f, "invalid pool config: {reason}"),
        }
    }
}

impl Error for MarshalError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_message_shows_range() {
        let err = MarshalError::Bounds {
            offset: 12,
            len: 8,
            buffer_len: 16,
        };
        assert_eq!(
            err.to_string(),
            "byte range 12..20 out of bounds for buffer of 16 bytes"
        );
        assert!(err.is_bounds());
    }

    #[test]
    fn layout_captures_type_name() {
        let err = MarshalError::layout::<u32>("zero-sized");
        match err {
            MarshalError::Layout { type_name, .. } => assert_eq!(type_name, "u32"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
