//! A single record that can collapse to its byte image.

use strata_marshal::{size_of_record, FixedLayout, MarshalService};
use tracing::trace;

use crate::error::InteropError;
use crate::state::{BlobEntity, EntityState, Payload};

/// One fixed-layout record with a header-less binary form.
///
/// Besides the usual transitions, an expanded record can be written
/// into (or read from) a region of a larger buffer, which is how records
/// are embedded inside other blobs.
#[derive(Clone, Debug, PartialEq)]
pub struct InteropRecord<T: FixedLayout> {
    payload: Payload<T>,
}

impl<T: FixedLayout> InteropRecord<T> {
    /// An expanded record.
    pub fn new(value: T) -> Self {
        Self {
            payload: Payload::Expanded(value),
        }
    }

    /// A collapsed record. Not validated until expanded.
    pub fn from_binary(bytes: Vec<u8>) -> Self {
        Self {
            payload: Payload::Collapsed(bytes),
        }
    }

    /// Decode one record from `buffer` at `offset` into an expanded container.
    pub fn read_from(
        buffer: &[u8],
        offset: usize,
        service: &MarshalService,
    ) -> Result<Self, InteropError> {
        Ok(Self::new(service.get_structure(buffer, offset)?))
    }

    /// The record.
    pub fn value(&self) -> Result<&T, InteropError> {
        self.payload.require_expanded()
    }

    /// The record, mutably.
    pub fn value_mut(&mut self) -> Result<&mut T, InteropError> {
        self.payload.require_expanded_mut()
    }

    /// Take the record. Requires the expanded state.
    pub fn into_value(self) -> Result<T, InteropError> {
        match self.payload {
            Payload::Expanded(value) => Ok(value),
            Payload::Collapsed(_) => Err(InteropError::InvalidState {
                expected: EntityState::Expanded,
                found: EntityState::Collapsed,
            }),
        }
    }

    /// Encode the expanded record into `buffer` at `offset`.
    ///
    /// Returns the number of bytes written.
    pub fn write_into(
        &self,
        buffer: &mut [u8],
        offset: usize,
        service: &MarshalService,
    ) -> Result<usize, InteropError> {
        let value = self.payload.require_expanded()?;
        service.get_bytes(buffer, offset, value)?;
        Ok(size_of_record::<T>())
    }
}

impl<T: FixedLayout> From<T> for InteropRecord<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: FixedLayout> BlobEntity for InteropRecord<T> {
    fn state(&self) -> EntityState {
        self.payload.state()
    }

    fn to_binary(&mut self, service: &MarshalService) -> Result<(), InteropError> {
        let value = self.payload.require_expanded()?;
        let bytes = service.to_vec(value)?;
        trace!(bytes = bytes.len(), "record collapsed");
        self.payload = Payload::Collapsed(bytes);
        Ok(())
    }

    fn to_object(&mut self, service: &MarshalService) -> Result<(), InteropError> {
        let bytes = self.payload.require_collapsed()?;
        if bytes.len() != size_of_record::<T>() {
            return Err(InteropError::type_mismatch::<T>(bytes.len()));
        }
        let value = service.get_structure::<T>(bytes, 0)?;
        trace!("record expanded");
        self.payload = Payload::Expanded(value);
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
            Payload::Expanded(_) => size_of_record::<T>(),
            Payload::Collapsed(bytes) => bytes.len(),
        }
    }
}
