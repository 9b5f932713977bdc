//! Parameter records tagged with a 16-byte routine identifier.
//!
//! The binary form is the identifier followed by one parameter record:
//!
//! ```text
//! [id: 16 bytes][params: size_of::<T>() bytes]
//! ```
//!
//! The identifier tells the native engine which custom routine the
//! parameters belong to. It is supplied explicitly, or through a
//! [`Routine`] marker type that fixes the id and alias at compile time.

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::str::FromStr;

use strata_marshal::codec::check_range;
use strata_marshal::{size_of_record, FixedLayout, MarshalService};
use tracing::trace;

use crate::error::InteropError;
use crate::state::{BlobEntity, EntityState, Payload};

/// Size of the identifier preceding the parameter record.
pub const ROUTINE_HEADER_SIZE: usize = 16;

/// A 16-byte routine identifier.
///
/// Textual form is the hyphenated `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`
/// layout with bytes in the order they appear in the text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutineId([u8; ROUTINE_HEADER_SIZE]);

impl RoutineId {
    /// The all-zero identifier used by untagged parameter blobs.
    pub const EMPTY: Self = Self([0; ROUTINE_HEADER_SIZE]);

    /// Wrap raw identifier bytes.
    pub const fn from_bytes(bytes: [u8; ROUTINE_HEADER_SIZE]) -> Self {
        Self(bytes)
    }

    /// Identifier whose bytes are the big-endian image of `value`, so that
    /// `from_u128(0x0123_4567_89ab_...)` prints as `01234567-89ab-...`.
    pub const fn from_u128(value: u128) -> Self {
        Self(value.to_be_bytes())
    }

    /// The raw identifier bytes.
    pub const fn as_bytes(&self) -> &[u8; ROUTINE_HEADER_SIZE] {
        &self.0
    }

    /// True for the all-zero identifier.
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

const GROUP_ENDS: [usize; 4] = [4, 6, 8, 10];

impl fmt::Display for RoutineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if GROUP_ENDS.contains(&i) {
                f.write_str("-")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Error returned when a routine identifier string is not in the
/// hyphenated 36-character form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseRoutineIdError {
    input: String,
}

impl fmt::Display for ParseRoutineIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid routine id {:?}", self.input)
    }
}

impl Error for ParseRoutineIdError {}

impl FromStr for RoutineId {
    type Err = ParseRoutineIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseRoutineIdError {
            input: s.to_owned(),
        };
        let text = s.as_bytes();
        if text.len() != 36 || [8, 13, 18, 23].iter().any(|&i| text[i] != b'-') {
            return Err(err());
        }
        let digits: Vec<u8> = text.iter().copied().filter(|&c| c != b'-').collect();
        if digits.len() != 2 * ROUTINE_HEADER_SIZE {
            return Err(err());
        }
        let mut bytes = [0u8; ROUTINE_HEADER_SIZE];
        for (byte, pair) in bytes.iter_mut().zip(digits.chunks_exact(2)) {
            let hi = (pair[0] as char).to_digit(16).ok_or_else(err)?;
            let lo = (pair[1] as char).to_digit(16).ok_or_else(err)?;
            *byte = (hi * 16 + lo) as u8;
        }
        Ok(Self(bytes))
    }
}

/// Read the identifier at the start of a tagged binary.
pub fn peek_id(bytes: &[u8]) -> Result<RoutineId, InteropError> {
    let range = check_range(bytes.len(), 0, ROUTINE_HEADER_SIZE)?;
    let mut id = [0u8; ROUTINE_HEADER_SIZE];
    id.copy_from_slice(&bytes[range]);
    Ok(RoutineId(id))
}

/// A custom routine known at compile time.
///
/// ```
/// use strata_interop::{Routine, RoutineData, RoutineId};
///
/// struct Relax;
///
/// impl Routine for Relax {
///     type Params = [f64; 2];
///     const ID: RoutineId = RoutineId::from_u128(0x6b1e_04a2_0c7d_4d3e_9a51_3f0b_77c2_1e90);
///     const ALIAS: &'static str = "relax";
/// }
///
/// let data = RoutineData::for_routine::<Relax>([0.5, 300.0]);
/// assert_eq!(data.id().to_string(), "6b1e04a2-0c7d-4d3e-9a51-3f0b77c21e90");
/// ```
pub trait Routine: 'static {
    /// The parameter record the routine consumes.
    type Params: FixedLayout;
    /// Identifier written ahead of the parameters.
    const ID: RoutineId;
    /// Human-readable name used for lookup.
    const ALIAS: &'static str;
}

/// A routine parameter blob that knows its identifier.
///
/// Object safe, so registries can hand out `Box<dyn RoutineEntity>`.
pub trait RoutineEntity: BlobEntity + fmt::Debug + Send + Sync {
    /// The identifier the blob is tagged with.
    fn routine_id(&self) -> RoutineId;

    /// Downcast support for recovering the concrete `RoutineData<T>`.
    fn as_any(&self) -> &dyn Any;
}

/// A parameter record tagged with a routine identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct RoutineData<T: FixedLayout> {
    id: RoutineId,
    payload: Payload<T>,
}

impl<T: FixedLayout> RoutineData<T> {
    /// Expanded parameters tagged with `id`.
    pub fn new(id: RoutineId, params: T) -> Self {
        Self {
            id,
            payload: Payload::Expanded(params),
        }
    }

    /// Expanded parameters tagged with [`RoutineId::EMPTY`].
    pub fn untagged(params: T) -> Self {
        Self::new(RoutineId::EMPTY, params)
    }

    /// Expanded parameters tagged with the id of routine `R`.
    pub fn for_routine<R: Routine<Params = T>>(params: T) -> Self {
        Self::new(R::ID, params)
    }

    /// A collapsed blob. The id is read from the first 16 bytes when
    /// present, otherwise it is empty until the blob is expanded.
    pub fn from_binary(bytes: Vec<u8>) -> Self {
        Self {
            id: peek_id(&bytes).unwrap_or(RoutineId::EMPTY),
            payload: Payload::Collapsed(bytes),
        }
    }

    /// The routine identifier.
    pub fn id(&self) -> RoutineId {
        self.id
    }

    /// The parameter record.
    pub fn params(&self) -> Result<&T, InteropError> {
        self.payload.require_expanded()
    }

    /// The parameter record, mutably.
    pub fn params_mut(&mut self) -> Result<&mut T, InteropError> {
        self.payload.require_expanded_mut()
    }
}

impl RoutineData<()> {
    /// The empty routine: zero id and no parameter bytes.
    pub fn empty() -> Self {
        Self::untagged(())
    }
}

impl<T: FixedLayout> BlobEntity for RoutineData<T> {
    fn state(&self) -> EntityState {
        self.payload.state()
    }

    fn to_binary(&mut self, service: &MarshalService) -> Result<(), InteropError> {
        let params = self.payload.require_expanded()?;
        let mut bytes = vec![0u8; ROUTINE_HEADER_SIZE + size_of_record::<T>()];
        bytes[..ROUTINE_HEADER_SIZE].copy_from_slice(self.id.as_bytes());
        service.get_bytes(&mut bytes, ROUTINE_HEADER_SIZE, params)?;
        trace!(id = %self.id, bytes = bytes.len(), "routine data collapsed");
        self.payload = Payload::Collapsed(bytes);
        Ok(())
    }

    fn to_object(&mut self, service: &MarshalService) -> Result<(), InteropError> {
        let bytes = self.payload.require_collapsed()?;
        let id = peek_id(bytes)?;
        let trailing = bytes.len() - ROUTINE_HEADER_SIZE;
        if trailing != size_of_record::<T>() {
            return Err(InteropError::type_mismatch::<T>(trailing));
        }
        let params = service.get_structure::<T>(bytes, ROUTINE_HEADER_SIZE)?;
        trace!(%id, "routine data expanded");
        self.id = id;
        self.payload = Payload::Expanded(params);
        Ok(())
    }

    fn binary(&self) -> Option<&[u8]> {
        self.payload.binary()
    }

    fn header_byte_count(&self) -> usize {
        ROUTINE_HEADER_SIZE
    }

    fn blob_byte_count(&self) -> usize {
        match &self.payload {
            Payload::Expanded(_) => ROUTINE_HEADER_SIZE + size_of_record::<T>(),
            Payload::Collapsed(bytes) => bytes.len(),
        }
    }
}

impl<T: FixedLayout + fmt::Debug> RoutineEntity for RoutineData<T> {
    fn routine_id(&self) -> RoutineId {
        self.id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
