//! Row-major N-dimensional lattices and their index arithmetic.
//!
//! A [`Lattice`] is the typed payload of an
//! [`InteropArray`](crate::InteropArray). Dimensions are stored outermost
//! first; the last dimension varies fastest. The index skip vector holds,
//! for every dimension except the last, the number of elements spanned by
//! one step along it:
//!
//! ```text
//! dims  = [2, 3, 4]
//! skips = [12, 4]          (3*4, 4; the last skip is implicitly 1)
//! index_of([1, 2, 3]) = 3 + 2*4 + 1*12 = 23
//! ```
//!
//! A lattice with no dimensions has rank 0 and holds no elements.

use smallvec::{smallvec, SmallVec};

use crate::error::InteropError;

/// Dimension sizes, multi-indices, and skip vectors.
pub type Dims = SmallVec<[usize; 4]>;

/// Index skips for row-major `dims`. Has `dims.len() - 1` entries.
pub fn index_skips(dims: &[usize]) -> Dims {
    let rank = dims.len();
    if rank < 2 {
        return Dims::new();
    }
    let mut skips: Dims = smallvec![0; rank - 1];
    let mut span = 1usize;
    for axis in (0..rank - 1).rev() {
        span = span.saturating_mul(dims[axis + 1]);
        skips[axis] = span;
    }
    skips
}

/// Number of elements spanned by `dims`, or `None` on overflow.
pub fn element_count(dims: &[usize]) -> Option<usize> {
    if dims.is_empty() {
        return Some(0);
    }
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Linear offset of `indices`. Callers guarantee `indices.len() == skips.len() + 1`.
pub(crate) fn linear_index(skips: &[usize], indices: &[usize]) -> usize {
    let last = indices[indices.len() - 1];
    skips
        .iter()
        .zip(indices)
        .fold(last, |acc, (&skip, &index)| acc + index * skip)
}

/// Multi-index of `linear`. Callers guarantee every skip is non-zero.
pub(crate) fn multi_index(skips: &[usize], mut linear: usize) -> Dims {
    let mut indices = Dims::with_capacity(skips.len() + 1);
    for &skip in skips {
        indices.push(linear / skip);
        linear %= skip;
    }
    indices.push(linear);
    indices
}

/// Range-checked linear offset of `indices` within `dims`.
pub(crate) fn checked_index(
    dims: &[usize],
    skips: &[usize],
    indices: &[usize],
) -> Result<usize, InteropError> {
    if indices.len() != dims.len() || dims.is_empty() {
        return Err(InteropError::IndexCount {
            expected: dims.len(),
            found: indices.len(),
        });
    }
    for (axis, (&index, &size)) in indices.iter().zip(dims).enumerate() {
        if index >= size {
            return Err(InteropError::IndexOutOfRange { axis, index, size });
        }
    }
    Ok(linear_index(skips, indices))
}

/// A dense row-major N-dimensional array of `T`.
#[derive(Clone, Debug, PartialEq)]
pub struct Lattice<T> {
    dims: Dims,
    values: Vec<T>,
}

impl<T> Lattice<T> {
    /// Build a lattice from dimension sizes and row-major values.
    ///
    /// Fails with [`InteropError::ShapeMismatch`] if the value count is not
    /// the product of `dims`.
    pub fn new(dims: &[usize], values: Vec<T>) -> Result<Self, InteropError> {
        let expected = element_count(dims).unwrap_or(usize::MAX);
        if expected != values.len() {
            return Err(InteropError::ShapeMismatch {
                expected,
                found: values.len(),
            });
        }
        Ok(Self {
            dims: Dims::from_slice(dims),
            values,
        })
    }

    /// Build a lattice by evaluating `f` at every multi-index, row-major.
    pub fn from_fn(
        dims: &[usize],
        mut f: impl FnMut(&[usize]) -> T,
    ) -> Result<Self, InteropError> {
        let count = element_count(dims).ok_or(InteropError::ShapeMismatch {
            expected: usize::MAX,
            found: 0,
        })?;
        let skips = index_skips(dims);
        let values = (0..count).map(|i| f(&multi_index(&skips, i))).collect();
        Self::new(dims, values)
    }

    /// Wrap a flat vector as a rank-1 lattice.
    pub fn from_vec(values: Vec<T>) -> Self {
        Self {
            dims: smallvec![values.len()],
            values,
        }
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the lattice holds no elements.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Dimension sizes, outermost first.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Index skips for this lattice's dimensions.
    pub fn skips(&self) -> Dims {
        index_skips(&self.dims)
    }

    /// Row-major values.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Row-major values, mutably.
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Split into dimensions and row-major values.
    pub fn into_parts(self) -> (Dims, Vec<T>) {
        (self.dims, self.values)
    }

    /// Linear offset of `indices`.
    pub fn index_of(&self, indices: &[usize]) -> Result<usize, InteropError> {
        checked_index(&self.dims, &self.skips(), indices)
    }

    /// The element at `indices`, if in range.
    pub fn get(&self, indices: &[usize]) -> Option<&T> {
        let index = self.index_of(indices).ok()?;
        self.values.get(index)
    }

    /// The element at `indices` mutably, if in range.
    pub fn get_mut(&mut self, indices: &[usize]) -> Option<&mut T> {
        let index = self.index_of(indices).ok()?;
        self.values.get_mut(index)
    }
}

impl<T: Clone> Lattice<T> {
    /// A lattice of `dims` with every element set to `value`.
    pub fn filled(dims: &[usize], value: T) -> Result<Self, InteropError> {
        let count = element_count(dims).ok_or(InteropError::ShapeMismatch {
            expected: usize::MAX,
            found: 0,
        })?;
        Self::new(dims, vec![value; count])
    }
}

impl<T> Default for Lattice<T> {
    fn default() -> Self {
        Self {
            dims: Dims::new(),
            values: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn skips_for_2_3_4() {
        assert_eq!(index_skips(&[2, 3, 4]).as_slice(), &[12, 4]);
        assert_eq!(linear_index(&[12, 4], &[1, 2, 3]), 23);
    }

    #[test]
    fn rank_one_has_no_skips() {
        assert!(index_skips(&[7]).is_empty());
        assert_eq!(linear_index(&[], &[5]), 5);
        assert_eq!(multi_index(&[], 5).as_slice(), &[5]);
    }

    #[test]
    fn element_count_of_empty_dims_is_zero() {
        assert_eq!(element_count(&[]), Some(0));
        assert_eq!(element_count(&[3, 0, 2]), Some(0));
        assert_eq!(element_count(&[usize::MAX, 2]), None);
    }

    #[test]
    fn new_checks_value_count() {
        assert!(Lattice::new(&[2, 2], vec![1, 2, 3, 4]).is_ok());
        assert_eq!(
            Lattice::new(&[2, 2], vec![1, 2, 3]).unwrap_err(),
            InteropError::ShapeMismatch {
                expected: 4,
                found: 3
            }
        );
    }

    #[test]
    fn from_fn_visits_row_major() {
        let lattice = Lattice::from_fn(&[2, 3], |idx| idx[0] * 10 + idx[1]).unwrap();
        assert_eq!(lattice.values(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(lattice.get(&[1, 2]), Some(&12));
    }

    #[test]
    fn get_rejects_out_of_range_components() {
        let mut lattice = Lattice::filled(&[2, 3], 0u8).unwrap();
        assert_eq!(lattice.get(&[0, 3]), None);
        assert_eq!(lattice.get(&[2, 0]), None);
        assert_eq!(lattice.get(&[1]), None);
        *lattice.get_mut(&[1, 1]).unwrap() = 9;
        assert_eq!(lattice.values()[4], 9);
    }

    #[test]
    fn index_errors_are_specific() {
        let lattice = Lattice::filled(&[2, 3], 0u8).unwrap();
        assert_eq!(
            lattice.index_of(&[0, 0, 0]).unwrap_err(),
            InteropError::IndexCount {
                expected: 2,
                found: 3
            }
        );
        assert_eq!(
            lattice.index_of(&[0, 4]).unwrap_err(),
            InteropError::IndexOutOfRange {
                axis: 1,
                index: 4,
                size: 3
            }
        );
    }

    proptest! {
        #[test]
        fn index_duality(dims in proptest::collection::vec(1usize..6, 1..5), seed in any::<u64>()) {
            let skips = index_skips(&dims);
            let count = element_count(&dims).unwrap();
            let linear = (seed as usize) % count;
            let indices = multi_index(&skips, linear);
            prop_assert_eq!(indices.len(), dims.len());
            for (i, d) in indices.iter().zip(&dims) {
                prop_assert!(i < d);
            }
            prop_assert_eq!(linear_index(&skips, &indices), linear);
        }
    }
}
