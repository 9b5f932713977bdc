//! The fixed-layout record contract.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// A value type with a fixed, statically known byte size and no embedded
/// references.
///
/// Implemented automatically for every type that satisfies the `zerocopy`
/// layout traits. Derive them on a `#[repr(C)]` struct without padding:
///
/// ```
/// use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
///
/// #[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
/// #[repr(C)]
/// struct Site {
///     position: [f64; 3],
///     particle: u32,
///     flags: u32,
/// }
///
/// assert_eq!(strata_marshal::size_of_record::<Site>(), 32);
/// ```
pub trait FixedLayout:
    FromBytes + IntoBytes + Immutable + KnownLayout + Copy + Send + Sync + 'static
{
}

impl<T> FixedLayout for T where
    T: FromBytes + IntoBytes + Immutable + KnownLayout + Copy + Send + Sync + 'static
{
}

/// Byte size of one record of type `T`.
///
/// Computed from the type alone; no value is constructed.
pub const fn size_of_record<T: FixedLayout>() -> usize {
    std::mem::size_of::<T>()
}

/// Short, stable-enough name of `T` for diagnostics.
pub(crate) fn type_name_of<T: ?Sized>() -> &'static str {
    std::any::type_name::<T>()
}
