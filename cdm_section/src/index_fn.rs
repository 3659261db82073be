use std::iter::FusedIterator;

use crate::{ArrayIndices, ArrayIndicesTinyVec, ArrayShape, InvalidRangeError};

/// Converts between linearised (row-major) indices and coordinates of a shape.
///
/// The last dimension varies fastest.
/// For a 2x3 shape, linear index 4 has coordinates `[1, 1]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexFn {
    shape: ArrayShape,
    strides: Vec<u64>,
    size: u64,
}

impl IndexFn {
    /// Create a new index function for `shape`.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError::Overflow`] if the number of elements in `shape` exceeds [`u64::MAX`].
    pub fn new(shape: &[u64]) -> Result<Self, InvalidRangeError> {
        let mut strides = vec![0; shape.len()];
        let mut size: u64 = 1;
        for (stride, &dim) in std::iter::zip(strides.iter_mut(), shape).rev() {
            *stride = size;
            size = size.checked_mul(dim).ok_or(InvalidRangeError::Overflow)?;
        }
        Ok(Self {
            shape: shape.to_vec(),
            strides,
            size,
        })
    }

    /// The number of dimensions.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// The shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// The element stride of each dimension.
    #[must_use]
    pub fn strides(&self) -> &[u64] {
        &self.strides
    }

    /// The number of elements.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Return the coordinates of the element at `linear`.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError::IndicesOutOfBounds`] if `linear >= self.size()`.
    pub fn odometer(&self, mut linear: u64) -> Result<ArrayIndicesTinyVec, InvalidRangeError> {
        if linear >= self.size {
            return Err(InvalidRangeError::IndicesOutOfBounds {
                indices: vec![linear],
                shape: vec![self.size],
            });
        }
        let mut coords = ArrayIndicesTinyVec::new();
        coords.resize(self.rank(), 0);
        for (coord, &dim) in std::iter::zip(coords.iter_mut(), &self.shape).rev() {
            *coord = linear % dim;
            linear /= dim;
        }
        Ok(coords)
    }

    /// Return the linearised index of `coords`, the inverse of [`odometer`](Self::odometer).
    ///
    /// # Errors
    /// Returns [`InvalidRangeError`] if the rank of `coords` does not match or any coordinate is out-of-bounds.
    pub fn linear_of(&self, coords: &[u64]) -> Result<u64, InvalidRangeError> {
        if coords.len() != self.rank() {
            return Err(InvalidRangeError::IncompatibleRank {
                got: coords.len(),
                expected: self.rank(),
            });
        }
        if std::iter::zip(coords, &self.shape).any(|(c, s)| c >= s) {
            return Err(InvalidRangeError::IndicesOutOfBounds {
                indices: coords.to_vec(),
                shape: self.shape.clone(),
            });
        }
        Ok(std::iter::zip(coords, &self.strides)
            .map(|(c, s)| c * s)
            .sum())
    }
}

/// A row-major counter over a shape.
///
/// Each [`increment`](Odometer::increment) advances the innermost coordinate and carries into outer dimensions.
/// The odometer also iterates over its coordinates, starting from all zeros.
#[derive(Clone, Debug)]
pub struct Odometer {
    shape: ArrayShape,
    current: ArrayIndicesTinyVec,
    remaining: u64,
}

impl Odometer {
    /// Create a new odometer positioned at the origin of `shape`.
    ///
    /// An odometer over a shape with a zero-length dimension is exhausted from the start.
    /// An odometer over a rank 0 shape visits the single empty coordinate.
    #[must_use]
    pub fn new(shape: ArrayShape) -> Self {
        let remaining = shape
            .iter()
            .try_fold(1u64, |acc, &dim| acc.checked_mul(dim))
            .unwrap_or(u64::MAX);
        let mut current = ArrayIndicesTinyVec::new();
        current.resize(shape.len(), 0);
        Self {
            shape,
            current,
            remaining,
        }
    }

    /// The current coordinates.
    #[must_use]
    pub fn current(&self) -> &[u64] {
        &self.current
    }

    /// The shape being counted over.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Returns true if every coordinate has been visited.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.remaining == 0
    }

    /// Advance to the next coordinate.
    ///
    /// Returns the outermost dimension that changed, or [`None`] once the odometer is exhausted.
    pub fn increment(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            return None;
        }
        for dim in (0..self.shape.len()).rev() {
            self.current[dim] += 1;
            if self.current[dim] < self.shape[dim] {
                return Some(dim);
            }
            self.current[dim] = 0;
        }
        None
    }

    /// The number of coordinates left to visit, including the current one.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Return the current coordinates as [`ArrayIndices`].
    #[must_use]
    pub fn to_indices(&self) -> ArrayIndices {
        self.current.to_vec()
    }
}

impl Iterator for Odometer {
    type Item = ArrayIndicesTinyVec;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_done() {
            return None;
        }
        let current = self.current.clone();
        self.increment();
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl FusedIterator for Odometer {}
