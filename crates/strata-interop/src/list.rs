//! Flat record sequences with a header-less binary form.
//!
//! The binary form is the records back to back; the element count is the
//! payload length divided by the record size.

use strata_marshal::{size_of_record, FixedLayout, MarshalError, MarshalService};
use tracing::trace;

use crate::error::InteropError;
use crate::state::{BlobEntity, EntityState, Payload};

/// A sequence of records that can collapse to contiguous bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct InteropList<T: FixedLayout> {
    payload: Payload<Vec<T>>,
}

impl<T: FixedLayout> InteropList<T> {
    /// An expanded, empty list.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// An expanded list holding `values`.
    pub fn from_vec(values: Vec<T>) -> Self {
        Self {
            payload: Payload::Expanded(values),
        }
    }

    /// A collapsed list holding `bytes`. Not validated until expanded.
    pub fn from_binary(bytes: Vec<u8>) -> Self {
        Self {
            payload: Payload::Collapsed(bytes),
        }
    }

    /// Number of elements, in either state.
    ///
    /// For a collapsed list of a zero-sized type this is 0.
    pub fn len(&self) -> usize {
        match &self.payload {
            Payload::Expanded(values) => values.len(),
            Payload::Collapsed(bytes) => bytes
                .len()
                .checked_div(size_of_record::<T>())
                .unwrap_or(0),
        }
    }

    /// True if the list holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The elements.
    pub fn values(&self) -> Result<&[T], InteropError> {
        self.payload.require_expanded().map(Vec::as_slice)
    }

    /// The elements, mutably. Growing or shrinking is allowed.
    pub fn values_mut(&mut self) -> Result<&mut Vec<T>, InteropError> {
        self.payload.require_expanded_mut()
    }

    /// Take the elements. Requires the expanded state.
    pub fn into_vec(self) -> Result<Vec<T>, InteropError> {
        match self.payload {
            Payload::Expanded(values) => Ok(values),
            Payload::Collapsed(_) => Err(InteropError::InvalidState {
                expected: EntityState::Expanded,
                found: EntityState::Collapsed,
            }),
        }
    }
}

impl<T: FixedLayout> Default for InteropList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FixedLayout> From<Vec<T>> for InteropList<T> {
    fn from(values: Vec<T>) -> Self {
        Self::from_vec(values)
    }
}

impl<T: FixedLayout> FromIterator<T> for InteropList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: FixedLayout> BlobEntity for InteropList<T> {
    fn state(&self) -> EntityState {
        self.payload.state()
    }

    fn to_binary(&mut self, service: &MarshalService) -> Result<(), InteropError> {
        let values = self.payload.require_expanded()?;
        let size = size_of_record::<T>();
        let len = values
            .len()
            .checked_mul(size)
            .ok_or_else(|| MarshalError::layout::<T>("payload size overflows usize"))?;
        let mut bytes = vec![0u8; len];
        service.get_bytes_many(&mut bytes, 0, values)?;
        trace!(count = values.len(), bytes = len, "list collapsed");
        self.payload = Payload::Collapsed(bytes);
        Ok(())
    }

    fn to_object(&mut self, service: &MarshalService) -> Result<(), InteropError> {
        let bytes = self.payload.require_collapsed()?;
        let size = size_of_record::<T>();
        if size == 0 {
            return Err(
                MarshalError::layout::<T>("element count cannot be derived for zero-sized records")
                    .into(),
            );
        }
        if bytes.len() % size != 0 {
            return Err(InteropError::type_mismatch::<T>(bytes.len()));
        }
        let values: Vec<T> = service.get_structures::<T>(bytes, 0, bytes.len())?.collect();
        trace!(count = values.len(), "list expanded");
        self.payload = Payload::Expanded(values);
        Ok(())
    }

    fn binary(&self) -> Option<&[u8]> {
        self.payload.binary()
    }

    fn header_byte_count(&self) -> usize {
        0
    }

    fn blob_byte_count(&self) -> usize {
        match &self.payload {
            Payload::Expanded(values) => values.len() * size_of_record::<T>(),
            Payload::Collapsed(bytes) => bytes.len(),
        }
    }
}
