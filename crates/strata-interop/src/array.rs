//! Linearized N-dimensional arrays of fixed-layout records.
//!
//! Binary layout (all header integers little-endian `i32`):
//!
//! ```text
//! [rank] [length] [skip_0] .. [skip_{rank-2}] [element_0] .. [element_{length-1}]
//! ```
//!
//! Elements follow in row-major order, each `size_of::<T>()` bytes. The
//! header lets the native engine index the payload without any other
//! metadata. A rank-0 array (no elements) is written as the two leading
//! integers only; an empty binary payload expands to a rank-0 array.

use smallvec::smallvec;
use strata_marshal::{codec, size_of_record, FixedLayout, MarshalError, MarshalService};
use tracing::trace;

use crate::error::InteropError;
use crate::lattice::{checked_index, element_count, index_skips, multi_index, Dims, Lattice};
use crate::state::{BlobEntity, EntityState, Payload};

const INT_SIZE: usize = std::mem::size_of::<i32>();

/// Header size in bytes for an array of `rank`.
pub fn header_size(rank: usize) -> usize {
    INT_SIZE * (rank + 1).max(2)
}

/// Expanded form: row-major values plus cached shape.
#[derive(Clone, Debug, PartialEq)]
struct Linearized<T> {
    values: Vec<T>,
    dims: Dims,
    skips: Dims,
}

impl<T> Linearized<T> {
    fn from_lattice(lattice: Lattice<T>) -> Self {
        let (dims, values) = lattice.into_parts();
        let skips = index_skips(&dims);
        Self {
            values,
            dims,
            skips,
        }
    }

    fn rank(&self) -> usize {
        self.dims.len()
    }
}

impl<T> Default for Linearized<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            dims: Dims::new(),
            skips: Dims::new(),
        }
    }
}

fn read_i32(bytes: &[u8], offset: usize) -> Result<i32, InteropError> {
    let range = codec::check_range(bytes.len(), offset, INT_SIZE)?;
    let mut raw = [0u8; INT_SIZE];
    raw.copy_from_slice(&bytes[range]);
    Ok(i32::from_le_bytes(raw))
}

fn write_i32(bytes: &mut [u8], offset: usize, value: i32) {
    bytes[offset..offset + INT_SIZE].copy_from_slice(&value.to_le_bytes());
}

fn header_field<T>(what: &str, value: usize) -> Result<i32, InteropError> {
    i32::try_from(value).map_err(|_| {
        MarshalError::layout::<T>(format!("{what} {value} exceeds i32::MAX")).into()
    })
}

fn read_header_field(bytes: &[u8], offset: usize, what: &str) -> Result<usize, InteropError> {
    let raw = read_i32(bytes, offset)?;
    usize::try_from(raw).map_err(|_| InteropError::MalformedHeader {
        detail: format!("negative {what} {raw}"),
    })
}

fn require_sized<T: FixedLayout>() -> Result<usize, InteropError> {
    match size_of_record::<T>() {
        0 => Err(MarshalError::layout::<T>("zero-sized elements cannot be linearized").into()),
        size => Ok(size),
    }
}

fn encode<T: FixedLayout>(
    linear: &Linearized<T>,
    service: &MarshalService,
) -> Result<Vec<u8>, InteropError> {
    let size = require_sized::<T>()?;
    let header = header_size(linear.rank());
    let payload = linear
        .values
        .len()
        .checked_mul(size)
        .ok_or_else(|| MarshalError::layout::<T>("payload size overflows usize"))?;

    let rank = header_field::<T>("rank", linear.rank())?;
    let length = header_field::<T>("length", linear.values.len())?;
    let mut bytes = vec![0u8; header + payload];
    write_i32(&mut bytes, 0, rank);
    write_i32(&mut bytes, INT_SIZE, length);
    for (i, &skip) in linear.skips.iter().enumerate() {
        let skip = header_field::<T>("index skip", skip)?;
        write_i32(&mut bytes, INT_SIZE * (2 + i), skip);
    }
    service.get_bytes_many(&mut bytes, header, &linear.values)?;
    Ok(bytes)
}

fn decode<T: FixedLayout>(
    bytes: &[u8],
    service: &MarshalService,
) -> Result<Linearized<T>, InteropError> {
    let size = require_sized::<T>()?;
    if bytes.is_empty() {
        return Ok(Linearized::default());
    }

    let rank = read_header_field(bytes, 0, "rank")?;
    let header = header_size(rank);
    codec::check_range(bytes.len(), 0, header)?;
    let length = read_header_field(bytes, INT_SIZE, "length")?;
    if rank == 0 && length != 0 {
        return Err(InteropError::MalformedHeader {
            detail: format!("rank 0 with length {length}"),
        });
    }
    let skips: Dims = (0..rank.saturating_sub(1))
        .map(|i| read_header_field(bytes, INT_SIZE * (2 + i), "index skip"))
        .collect::<Result<_, _>>()?;

    let payload_len = bytes.len() - header;
    if length.checked_mul(size) != Some(payload_len) {
        return Err(InteropError::type_mismatch::<T>(payload_len));
    }

    let dims: Dims = if length == 0 {
        smallvec![0; rank]
    } else {
        if skips.contains(&0) {
            return Err(InteropError::MalformedHeader {
                detail: "zero index skip in a non-empty array".into(),
            });
        }
        let mut dims = multi_index(&skips, length - 1);
        dims.iter_mut().for_each(|d| *d += 1);
        if element_count(&dims) != Some(length) || index_skips(&dims) != skips {
            return Err(InteropError::MalformedHeader {
                detail: format!("index skips {skips:?} do not describe {length} elements"),
            });
        }
        dims
    };

    let values: Vec<T> = service
        .get_structures::<T>(bytes, header, bytes.len())?
        .collect();
    Ok(Linearized {
        values,
        dims,
        skips,
    })
}

/// Rank stored in a binary header, or 0 if there is none.
fn peek_rank(bytes: &[u8]) -> usize {
    read_i32(bytes, 0).map_or(0, |r| r.max(0) as usize)
}

/// Length stored in a binary header, or 0 if there is none.
fn peek_length(bytes: &[u8]) -> usize {
    read_i32(bytes, INT_SIZE).map_or(0, |l| l.max(0) as usize)
}

/// An N-dimensional record array that can collapse to the linear binary
/// layout understood by the native engine.
///
/// Shape queries ([`index_of`](Self::index_of),
/// [`indices_of`](Self::indices_of), [`dimensions`](Self::dimensions))
/// need the expanded state; [`rank`](Self::rank) and [`len`](Self::len)
/// work in both states.
#[derive(Clone, Debug, PartialEq)]
pub struct InteropArray<T: FixedLayout> {
    payload: Payload<Linearized<T>>,
}

impl<T: FixedLayout> InteropArray<T> {
    /// An expanded, empty rank-0 array.
    pub fn new() -> Self {
        Self {
            payload: Payload::Expanded(Linearized::default()),
        }
    }

    /// An expanded array holding `lattice`.
    pub fn from_lattice(lattice: Lattice<T>) -> Self {
        Self {
            payload: Payload::Expanded(Linearized::from_lattice(lattice)),
        }
    }

    /// A collapsed array holding `bytes`. Not validated until expanded.
    pub fn from_binary(bytes: Vec<u8>) -> Self {
        Self {
            payload: Payload::Collapsed(bytes),
        }
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        match &self.payload {
            Payload::Expanded(linear) => linear.rank(),
            Payload::Collapsed(bytes) => peek_rank(bytes),
        }
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        match &self.payload {
            Payload::Expanded(linear) => linear.values.len(),
            Payload::Collapsed(bytes) => peek_length(bytes),
        }
    }

    /// True if the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index skips (`rank - 1` entries).
    pub fn index_skips(&self) -> Result<&[usize], InteropError> {
        Ok(&self.payload.require_expanded()?.skips)
    }

    /// Linear index of a multi-index.
    ///
    /// Fails if `indices.len() != rank` or any component is outside its
    /// dimension.
    pub fn index_of(&self, indices: &[usize]) -> Result<usize, InteropError> {
        let linear = self.payload.require_expanded()?;
        checked_index(&linear.dims, &linear.skips, indices)
    }

    /// Multi-index of a linear index.
    pub fn indices_of(&self, index: usize) -> Result<Dims, InteropError> {
        let linear = self.payload.require_expanded()?;
        let length = linear.values.len();
        if index >= length {
            return Err(InteropError::LinearIndexOutOfRange { index, length });
        }
        Ok(multi_index(&linear.skips, index))
    }

    /// Dimension sizes, derived from the multi-index of the last element.
    ///
    /// An empty array reports `rank` zeros.
    pub fn dimensions(&self) -> Result<Dims, InteropError> {
        let length = self.payload.require_expanded()?.values.len();
        if length == 0 {
            return Ok(smallvec![0; self.rank()]);
        }
        let mut dims = self.indices_of(length - 1)?;
        dims.iter_mut().for_each(|d| *d += 1);
        Ok(dims)
    }

    /// The element at `indices`.
    pub fn get(&self, indices: &[usize]) -> Result<T, InteropError> {
        let index = self.index_of(indices)?;
        Ok(self.payload.require_expanded()?.values[index])
    }

    /// Overwrite the element at `indices`.
    pub fn set(&mut self, indices: &[usize], value: T) -> Result<(), InteropError> {
        let index = self.index_of(indices)?;
        self.payload.require_expanded_mut()?.values[index] = value;
        Ok(())
    }

    /// Row-major values.
    pub fn values(&self) -> Result<&[T], InteropError> {
        Ok(&self.payload.require_expanded()?.values)
    }

    /// Row-major values, mutably. The shape cannot change.
    pub fn values_mut(&mut self) -> Result<&mut [T], InteropError> {
        Ok(&mut self.payload.require_expanded_mut()?.values)
    }

    /// Convert back into a lattice. Requires the expanded state.
    pub fn into_lattice(self) -> Result<Lattice<T>, InteropError> {
        match self.payload {
            Payload::Expanded(linear) => Lattice::new(&linear.dims, linear.values),
            Payload::Collapsed(_) => Err(InteropError::InvalidState {
                expected: EntityState::Expanded,
                found: EntityState::Collapsed,
            }),
        }
    }

    /// Take the binary payload. Requires the collapsed state.
    pub fn into_binary(self) -> Result<Vec<u8>, InteropError> {
        match self.payload {
            Payload::Collapsed(bytes) => Ok(bytes),
            Payload::Expanded(_) => Err(InteropError::InvalidState {
                expected: EntityState::Collapsed,
                found: EntityState::Expanded,
            }),
        }
    }
}

impl<T: FixedLayout> Default for InteropArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FixedLayout> From<Lattice<T>> for InteropArray<T> {
    fn from(lattice: Lattice<T>) -> Self {
        Self::from_lattice(lattice)
    }
}

impl<T: FixedLayout> BlobEntity for InteropArray<T> {
    fn state(&self) -> EntityState {
        self.payload.state()
    }

    fn to_binary(&mut self, service: &MarshalService) -> Result<(), InteropError> {
        let linear = self.payload.require_expanded()?;
        let bytes = encode(linear, service)?;
        trace!(
            rank = linear.rank(),
            length = linear.values.len(),
            bytes = bytes.len(),
            "array collapsed"
        );
        self.payload = Payload::Collapsed(bytes);
        Ok(())
    }

    fn to_object(&mut self, service: &MarshalService) -> Result<(), InteropError> {
        let bytes = self.payload.require_collapsed()?;
        let linear = decode::<T>(bytes, service)?;
        trace!(
            rank = linear.rank(),
            length = linear.values.len(),
            "array expanded"
        );
        self.payload = Payload::Expanded(linear);
        Ok(())
    }

    fn binary(&self) -> Option<&[u8]> {
        self.payload.binary()
    }

    fn header_byte_count(&self) -> usize {
        header_size(self.rank())
    }

    fn blob_byte_count(&self) -> usize {
        match &self.payload {
            Payload::Expanded(linear) => {
                header_size(linear.rank()) + linear.values.len() * size_of_record::<T>()
            }
            Payload::Collapsed(bytes) => bytes.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InteropArray<u32> {
        InteropArray::from_lattice(
            Lattice::from_fn(&[2, 3, 4], |idx| (idx[0] * 100 + idx[1] * 10 + idx[2]) as u32)
                .unwrap(),
        )
    }

    #[test]
    fn skips_and_index_of_for_2_3_4() {
        let array = sample();
        assert_eq!(array.rank(), 3);
        assert_eq!(array.len(), 24);
        assert_eq!(array.index_skips().unwrap(), &[12, 4]);
        assert_eq!(array.index_of(&[1, 2, 3]).unwrap(), 23);
        assert_eq!(array.indices_of(23).unwrap().as_slice(), &[1, 2, 3]);
        assert_eq!(array.dimensions().unwrap().as_slice(), &[2, 3, 4]);
    }

    #[test]
    fn header_layout_is_rank_length_skips() {
        let service = MarshalService::new();
        let mut array = sample();
        array.to_binary(&service).unwrap();
        let bytes = array.binary().unwrap();
        assert_eq!(bytes.len(), 16 + 24 * 4);
        assert_eq!(&bytes[0..4], &3i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &24i32.to_le_bytes());
        assert_eq!(&bytes[8..12], &12i32.to_le_bytes());
        assert_eq!(&bytes[12..16], &4i32.to_le_bytes());
        assert_eq!(&bytes[16..20], &0u32.to_ne_bytes());
        assert_eq!(&bytes[bytes.len() - 4..], &123u32.to_ne_bytes());
        assert_eq!(array.rank(), 3);
        assert_eq!(array.len(), 24);
    }

    #[test]
    fn round_trip_restores_shape_and_values() {
        let service = MarshalService::new();
        let before = sample();
        let mut array = before.clone();
        array.to_binary(&service).unwrap();
        assert_eq!(array.state(), EntityState::Collapsed);
        assert!(array.values().is_err());
        array.to_object(&service).unwrap();
        assert_eq!(array, before);
        assert!(array.binary().is_none());
    }

    #[test]
    fn empty_binary_expands_to_rank_zero() {
        let service = MarshalService::new();
        let mut array = InteropArray::<u32>::from_binary(Vec::new());
        assert_eq!(array.rank(), 0);
        array.to_object(&service).unwrap();
        assert_eq!(array.rank(), 0);
        assert!(array.is_empty());
        assert!(array.dimensions().unwrap().is_empty());
    }

    #[test]
    fn rank_zero_collapses_to_two_ints() {
        let service = MarshalService::new();
        let mut array = InteropArray::<u32>::new();
        array.to_binary(&service).unwrap();
        assert_eq!(array.binary().unwrap(), &[0u8; 8]);
        array.to_object(&service).unwrap();
        assert_eq!(array.rank(), 0);
    }

    #[test]
    fn rank_one_index_is_identity() {
        let array = InteropArray::from_lattice(Lattice::from_vec(vec![5u8, 6, 7]));
        assert!(array.index_skips().unwrap().is_empty());
        assert_eq!(array.index_of(&[2]).unwrap(), 2);
        assert_eq!(array.header_byte_count(), 8);
    }

    #[test]
    fn wrong_index_count_is_bounds_error() {
        let array = sample();
        let err = array.index_of(&[1, 2]).unwrap_err();
        assert!(err.is_bounds());
        assert!(array.indices_of(24).unwrap_err().is_bounds());
    }

    #[test]
    fn double_transitions_fail_without_change() {
        let service = MarshalService::new();
        let mut array = sample();
        assert!(matches!(
            array.to_object(&service),
            Err(InteropError::InvalidState { .. })
        ));
        array.to_binary(&service).unwrap();
        let before = array.binary().unwrap().to_vec();
        assert!(matches!(
            array.to_binary(&service),
            Err(InteropError::InvalidState { .. })
        ));
        assert_eq!(array.binary().unwrap(), before.as_slice());
    }

    #[test]
    fn truncated_payload_is_type_mismatch_and_keeps_binary() {
        let service = MarshalService::new();
        let mut array = sample();
        array.to_binary(&service).unwrap();
        let mut bytes = array.into_binary().unwrap();
        bytes.pop();
        let mut array = InteropArray::<u32>::from_binary(bytes.clone());
        assert!(matches!(
            array.to_object(&service),
            Err(InteropError::TypeMismatch { .. })
        ));
        assert_eq!(array.binary().unwrap(), bytes.as_slice());
    }

    #[test]
    fn inconsistent_skips_are_malformed() {
        let service = MarshalService::new();
        let mut bytes = Vec::new();
        for v in [2i32, 10, 3] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.extend_from_slice(&[0u8; 10]);
        let mut array = InteropArray::<u8>::from_binary(bytes);
        assert!(matches!(
            array.to_object(&service),
            Err(InteropError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn negative_rank_is_malformed() {
        let service = MarshalService::new();
        let mut bytes = (-1i32).to_le_bytes().to_vec();
        bytes.extend_from_slice(&0i32.to_le_bytes());
        let mut array = InteropArray::<u8>::from_binary(bytes);
        assert!(matches!(
            array.to_object(&service),
            Err(InteropError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn short_header_is_bounds_error() {
        let service = MarshalService::new();
        let mut array = InteropArray::<u8>::from_binary(3i32.to_le_bytes().to_vec());
        assert!(array.to_object(&service).unwrap_err().is_bounds());
    }

    #[test]
    fn set_and_get_by_indices() {
        let mut array = sample();
        array.set(&[0, 1, 2], 999).unwrap();
        assert_eq!(array.get(&[0, 1, 2]).unwrap(), 999);
        assert_eq!(array.values().unwrap()[6], 999);
    }

    #[test]
    fn blob_byte_count_matches_binary_len() {
        let service = MarshalService::new();
        let mut array = sample();
        let predicted = array.blob_byte_count();
        array.to_binary(&service).unwrap();
        assert_eq!(array.blob_byte_count(), predicted);
        assert_eq!(array.binary().unwrap().len(), predicted);
    }

    #[test]
    fn zero_length_keeps_rank_through_round_trip() {
        let service = MarshalService::new();
        let mut array = InteropArray::from_lattice(Lattice::<u16>::new(&[0, 3], vec![]).unwrap());
        array.to_binary(&service).unwrap();
        assert_eq!(array.binary().unwrap().len(), 12);
        array.to_object(&service).unwrap();
        assert_eq!(array.rank(), 2);
        assert_eq!(array.dimensions().unwrap().as_slice(), &[0, 0]);
    }

    #[test]
    #[tracing_test::traced_test]
    fn transitions_are_traced() {
        let service = MarshalService::new();
        let mut array = sample();
        array.to_binary(&service).unwrap();
        array.to_object(&service).unwrap();
        assert!(logs_contain("array collapsed"));
        assert!(logs_contain("array expanded"));
    }
}
