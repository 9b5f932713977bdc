//! Fixed-layout record transcoding through a leased scratch entry.
//!
//! Every function here stages the record in the lease's scratch bytes and
//! copies between the scratch and the caller's buffer; the record is never
//! reinterpreted in place, so the caller's buffer needs no alignment.
//! Ranges are checked before any byte is copied.
//!
//! Records are copied in host layout. The integer headers written by the
//! container types are little-endian, matching the native engine's target.

use std::iter::FusedIterator;
use std::ops::Range;

use crate::error::MarshalError;
use crate::layout::{size_of_record, FixedLayout};
use crate::pool::Lease;

/// Validate that `offset..offset + len` lies within a buffer of `buffer_len`.
pub fn check_range(
    buffer_len: usize,
    offset: usize,
    len: usize,
) -> Result<Range<usize>, MarshalError> {
    match offset.checked_add(len) {
        Some(end) if end <= buffer_len => Ok(offset..end),
        _ => Err(MarshalError::Bounds {
            offset,
            len,
            buffer_len,
        }),
    }
}

fn stage<T: FixedLayout>(scratch: &mut Lease<T>, record: &T) -> Result<(), MarshalError> {
    record
        .write_to(scratch.as_bytes_mut())
        .map_err(|_| MarshalError::layout::<T>("scratch entry does not match record size"))
}

fn unstage<T: FixedLayout>(scratch: &Lease<T>) -> Result<T, MarshalError> {
    T::read_from_bytes(scratch.as_bytes())
        .map_err(|_| MarshalError::layout::<T>("scratch entry does not match record size"))
}

/// Write `record` into `buffer` at `offset`.
pub fn write_record<T: FixedLayout>(
    scratch: &mut Lease<T>,
    buffer: &mut [u8],
    offset: usize,
    record: &T,
) -> Result<(), MarshalError> {
    let range = check_range(buffer.len(), offset, size_of_record::<T>())?;
    stage(scratch, record)?;
    buffer[range].copy_from_slice(scratch.as_bytes());
    Ok(())
}

/// Read one `T` from `buffer` at `offset`.
pub fn read_record<T: FixedLayout>(
    scratch: &mut Lease<T>,
    buffer: &[u8],
    offset: usize,
) -> Result<T, MarshalError> {
    let range = check_range(buffer.len(), offset, size_of_record::<T>())?;
    scratch.as_bytes_mut().copy_from_slice(&buffer[range]);
    unstage(scratch)
}

/// Write `records` contiguously into `buffer` starting at `offset`.
///
/// Returns the number of bytes written. Fails without writing anything
/// if the whole run does not fit.
pub fn write_records<T: FixedLayout>(
    scratch: &mut Lease<T>,
    buffer: &mut [u8],
    offset: usize,
    records: &[T],
) -> Result<usize, MarshalError> {
    let size = size_of_record::<T>();
    let total = records
        .len()
        .checked_mul(size)
        .ok_or(MarshalError::Bounds {
            offset,
            len: usize::MAX,
            buffer_len: buffer.len(),
        })?;
    check_range(buffer.len(), offset, total)?;

    let mut cursor = offset;
    for record in records {
        stage(scratch, record)?;
        buffer[cursor..cursor + size].copy_from_slice(scratch.as_bytes());
        cursor += size;
    }
    Ok(total)
}

/// Lazy sequence of records read from a byte range.
///
/// Yields one record per `size_of::<T>()` bytes starting at `offset` and
/// stops once the cursor reaches `upper_bound`. Holds its scratch lease
/// until dropped; not restartable.
pub struct Structures<'b, T: FixedLayout> {
    scratch: Lease<T>,
    buffer: &'b [u8],
    offset: usize,
    upper_bound: usize,
}

impl<'b, T: FixedLayout> Structures<'b, T> {
    /// Validate the range and wrap `scratch` into a record iterator.
    ///
    /// The last record starting below `upper_bound` must end within
    /// `buffer`, otherwise this fails with [`MarshalError::Bounds`]. Zero-sized
    /// records are rejected with [`MarshalError::Layout`] since they would
    /// never advance the cursor.
    pub fn new(
        scratch: Lease<T>,
        buffer: &'b [u8],
        offset: usize,
        upper_bound: usize,
    ) -> Result<Self, MarshalError> {
        let size = size_of_record::<T>();
        if size == 0 {
            return Err(MarshalError::layout::<T>(
                "zero-sized records cannot be read as a sequence",
            ));
        }
        if upper_bound > offset {
            let count = (upper_bound - offset).div_ceil(size);
            let span = count.checked_mul(size).ok_or(MarshalError::Bounds {
                offset,
                len: usize::MAX,
                buffer_len: buffer.len(),
            })?;
            check_range(buffer.len(), offset, span)?;
        }
        Ok(Self {
            scratch,
            buffer,
            offset,
            upper_bound,
        })
    }

    fn remaining(&self) -> usize {
        self.upper_bound
            .saturating_sub(self.offset)
            .div_ceil(size_of_record::<T>())
    }
}

impl<T: FixedLayout> Iterator for Structures<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.offset >= self.upper_bound {
            return None;
        }
        match read_record(&mut self.scratch, self.buffer, self.offset) {
            Ok(record) => {
                self.offset += size_of_record::<T>();
                Some(record)
            }
            Err(_) => {
                self.offset = self.upper_bound;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl<T: FixedLayout> ExactSizeIterator for Structures<'_, T> {}

impl<T: FixedLayout> FusedIterator for Structures<'_, T> {}
