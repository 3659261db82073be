use std::iter::FusedIterator;

use crate::{ArrayIndicesTinyVec, ArrayShape, Range};

/// An iterator over the indices of the elements in a filled section.
///
/// Iterates over the last dimension fastest (i.e. C-contiguous order).
/// For example, the section `2:3,1:2` of a 4x3 array produces `[(2, 1), (2, 2), (3, 1), (3, 2)]`.
///
/// Created with [`Section::iter_indices`](crate::Section::iter_indices).
#[derive(Clone, Debug)]
pub struct SectionIndices {
    ranges: Vec<Range>,
    shape: ArrayShape,
    linear: std::ops::Range<u64>,
}

impl SectionIndices {
    pub(crate) fn new(ranges: Vec<Range>) -> Self {
        let shape: ArrayShape = ranges.iter().map(Range::len).collect();
        let length = shape
            .iter()
            .try_fold(1u64, |acc, &len| acc.checked_mul(len))
            .unwrap_or(u64::MAX);
        Self {
            ranges,
            shape,
            linear: 0..length,
        }
    }

    /// Map a linearised position in the section to the indices of the element it selects.
    fn unravel(&self, mut position: u64) -> ArrayIndicesTinyVec {
        let mut indices = ArrayIndicesTinyVec::new();
        indices.resize(self.ranges.len(), 0);
        for (index, range, &len) in itertools::izip!(indices.iter_mut(), &self.ranges, &self.shape).rev() {
            *index = range.start() + (position % len) * range.stride();
            position /= len;
        }
        indices
    }
}

impl Iterator for SectionIndices {
    type Item = ArrayIndicesTinyVec;

    fn next(&mut self) -> Option<Self::Item> {
        let position = self.linear.next()?;
        Some(self.unravel(position))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let length = usize::try_from(self.linear.end - self.linear.start).unwrap_or(usize::MAX);
        (length, Some(length))
    }
}

impl DoubleEndedIterator for SectionIndices {
    fn next_back(&mut self) -> Option<Self::Item> {
        let position = self.linear.next_back()?;
        Some(self.unravel(position))
    }
}

impl ExactSizeIterator for SectionIndices {}

impl FusedIterator for SectionIndices {}
