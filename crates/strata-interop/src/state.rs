//! The expanded/collapsed entity state machine.
//!
//! Every container stores its data as a [`Payload`]: either the typed
//! object (`Expanded`) or its byte image (`Collapsed`), never both. The only
//! transitions are [`BlobEntity::to_binary`] and [`BlobEntity::to_object`];
//! each builds the new representation first and replaces the old one as its
//! last step, so a failed transition leaves the entity untouched.

use std::fmt;

use strata_marshal::MarshalService;
use tracing::trace;

use crate::error::InteropError;

/// Which representation an entity currently holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityState {
    /// Typed in-memory representation.
    Expanded,
    /// Binary representation.
    Collapsed,
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expanded => write!(f, "expanded"),
            Self::Collapsed => write!(f, "collapsed"),
        }
    }
}

/// Storage of an entity in exactly one of its two representations.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload<O> {
    /// The typed object.
    Expanded(O),
    /// The binary image.
    Collapsed(Vec<u8>),
}

impl<O> Payload<O> {
    /// The current state.
    pub fn state(&self) -> EntityState {
        match self {
            Self::Expanded(_) => EntityState::Expanded,
            Self::Collapsed(_) => EntityState::Collapsed,
        }
    }

    /// The typed object, if expanded.
    pub fn expanded(&self) -> Option<&O> {
        match self {
            Self::Expanded(o) => Some(o),
            Self::Collapsed(_) => None,
        }
    }

    /// The typed object, mutably, if expanded.
    pub fn expanded_mut(&mut self) -> Option<&mut O> {
        match self {
            Self::Expanded(o) => Some(o),
            Self::Collapsed(_) => None,
        }
    }

    /// The binary image, if collapsed.
    pub fn binary(&self) -> Option<&[u8]> {
        match self {
            Self::Expanded(_) => None,
            Self::Collapsed(b) => Some(b),
        }
    }

    /// The typed object, or [`InteropError::InvalidState`].
    pub fn require_expanded(&self) -> Result<&O, InteropError> {
        self.expanded().ok_or(InteropError::InvalidState {
            expected: EntityState::Expanded,
            found: EntityState::Collapsed,
        })
    }

    /// The typed object mutably, or [`InteropError::InvalidState`].
    pub fn require_expanded_mut(&mut self) -> Result<&mut O, InteropError> {
        self.expanded_mut().ok_or(InteropError::InvalidState {
            expected: EntityState::Expanded,
            found: EntityState::Collapsed,
        })
    }

    /// The binary image, or [`InteropError::InvalidState`].
    pub fn require_collapsed(&self) -> Result<&[u8], InteropError> {
        self.binary().ok_or(InteropError::InvalidState {
            expected: EntityState::Collapsed,
            found: EntityState::Expanded,
        })
    }

    /// Consume the payload, returning the binary image if collapsed.
    pub fn into_binary(self) -> Option<Vec<u8>> {
        match self {
            Self::Expanded(_) => None,
            Self::Collapsed(b) => Some(b),
        }
    }

    /// Consume the payload, returning the typed object if expanded.
    pub fn into_expanded(self) -> Option<O> {
        match self {
            Self::Expanded(o) => Some(o),
            Self::Collapsed(_) => None,
        }
    }
}

/// An entity that can switch between typed and binary representations.
///
/// Implementations must fail with [`InteropError::InvalidState`] when a
/// transition is requested from the wrong state, and must not alter the
/// entity when any transition fails.
pub trait BlobEntity {
    /// The current state.
    fn state(&self) -> EntityState;

    /// Collapse: encode the typed payload and discard it.
    fn to_binary(&mut self, service: &MarshalService) -> Result<(), InteropError>;

    /// Expand: decode the binary payload and discard it.
    fn to_object(&mut self, service: &MarshalService) -> Result<(), InteropError>;

    /// The binary payload, if collapsed.
    fn binary(&self) -> Option<&[u8]>;

    /// Number of header bytes preceding the record data in the binary form.
    fn header_byte_count(&self) -> usize;

    /// Total size of the binary form in bytes.
    fn blob_byte_count(&self) -> usize;
}

/// Collapse every expanded entity in `entities`.
///
/// Entities already collapsed are skipped. Stops at the first failure;
/// entities before it stay collapsed.
pub fn collapse_all(
    entities: &mut [&mut dyn BlobEntity],
    service: &MarshalService,
) -> Result<usize, InteropError> {
    let mut changed = 0;
    for entity in entities.iter_mut() {
        if entity.state() == EntityState::Expanded {
            entity.to_binary(service)?;
            changed += 1;
        }
    }
    trace!(changed, total = entities.len(), "collapsed entities");
    Ok(changed)
}

/// Expand every collapsed entity in `entities`.
///
/// Entities already expanded are skipped. Stops at the first failure;
/// entities before it stay expanded.
pub fn expand_all(
    entities: &mut [&mut dyn BlobEntity],
    service: &MarshalService,
) -> Result<usize, InteropError> {
    let mut changed = 0;
    for entity in entities.iter_mut() {
        if entity.state() == EntityState::Collapsed {
            entity.to_object(service)?;
            changed += 1;
        }
    }
    trace!(changed, total = entities.len(), "expanded entities");
    Ok(changed)
}
