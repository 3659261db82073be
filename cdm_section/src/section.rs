//! Sections.
//!
//! A [`Section`] selects a possibly strided sub-array of a shaped variable with one [`Range`] per dimension.
//! A dimension without a range means "all of it", resolved against a shape with [`Section::fill`].

use std::fmt::Display;
use std::str::FromStr;

use itertools::Itertools;

use crate::iterators::SectionIndices;
use crate::{ArrayIndices, ArrayShape, InvalidRangeError, Range};

/// An ordered tuple of optional ranges, one per dimension.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Section {
    ranges: Vec<Option<Range>>,
}

impl Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ranges = self
            .ranges
            .iter()
            .map(|range| range.map_or_else(|| ":".to_string(), |range| range.to_string()))
            .join(",");
        write!(f, "{ranges}")
    }
}

impl FromStr for Section {
    type Err = InvalidRangeError;

    /// Parse a comma separated list of ranges, e.g. `"1:3,:,0:9:2"`.
    ///
    /// A `:` leaves the dimension unfilled.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::default());
        }
        let ranges = s
            .split(',')
            .map(|range| match range.trim() {
                ":" => Ok(None),
                range => range.parse::<Range>().map(Some),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { ranges })
    }
}

impl From<Vec<Range>> for Section {
    fn from(ranges: Vec<Range>) -> Self {
        Self::new_with_ranges(ranges)
    }
}

impl Section {
    /// Create a new section from optional ranges.
    #[must_use]
    pub fn new(ranges: Vec<Option<Range>>) -> Self {
        Self { ranges }
    }

    /// Create a new unfilled section of rank `rank`.
    #[must_use]
    pub fn new_unfilled(rank: usize) -> Self {
        Self {
            ranges: vec![None; rank],
        }
    }

    /// Create a new section from ranges.
    #[must_use]
    pub fn new_with_ranges(ranges: Vec<Range>) -> Self {
        Self {
            ranges: ranges.into_iter().map(Some).collect(),
        }
    }

    /// Create a new section covering all of `shape`.
    #[must_use]
    pub fn new_with_shape(shape: &[u64]) -> Self {
        Self {
            ranges: shape.iter().map(|&len| Some(Range::full(len))).collect(),
        }
    }

    /// Create a new unit-stride section with `shape` starting at `origin`.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError::IncompatibleRank`] if `origin` and `shape` have different lengths.
    pub fn new_with_origin_shape(origin: &[u64], shape: &[u64]) -> Result<Self, InvalidRangeError> {
        if origin.len() != shape.len() {
            return Err(InvalidRangeError::IncompatibleRank {
                got: origin.len(),
                expected: shape.len(),
            });
        }
        Ok(Self {
            ranges: std::iter::zip(origin, shape)
                .map(|(&start, &length)| Range::new(start, 1, length).map(Some))
                .collect::<Result<_, _>>()?,
        })
    }

    /// The number of dimensions.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.ranges.len()
    }

    /// The ranges of the section.
    #[must_use]
    pub fn ranges(&self) -> &[Option<Range>] {
        &self.ranges
    }

    /// The range of dimension `dim`, [`None`] if unfilled or out of rank.
    #[must_use]
    pub fn range(&self, dim: usize) -> Option<Range> {
        self.ranges.get(dim).copied().flatten()
    }

    /// Returns true if every dimension has a range.
    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.ranges.iter().all(Option::is_some)
    }

    /// Return the ranges of a filled section.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError::Unfilled`] if any dimension has no range.
    pub fn filled_ranges(&self) -> Result<Vec<Range>, InvalidRangeError> {
        self.ranges
            .iter()
            .enumerate()
            .map(|(dim, range)| range.ok_or(InvalidRangeError::Unfilled(dim)))
            .collect()
    }

    /// Resolve the section against a variable of `shape`.
    ///
    /// Unfilled dimensions become the full range of the dimension.
    /// An empty section (rank 0) is filled to the full section of `shape`.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError`] if the rank mismatches or an explicit range extends beyond its dimension.
    pub fn fill(&self, shape: &[u64]) -> Result<Self, InvalidRangeError> {
        if self.ranges.is_empty() {
            return Ok(Self::new_with_shape(shape));
        }
        if self.rank() != shape.len() {
            return Err(InvalidRangeError::IncompatibleRank {
                got: self.rank(),
                expected: shape.len(),
            });
        }
        let ranges = std::iter::zip(&self.ranges, shape)
            .enumerate()
            .map(|(dim, (range, &length))| match range {
                None => Ok(Some(Range::full(length))),
                Some(range) if range.end_exc() > length && !range.is_empty() => {
                    Err(InvalidRangeError::OutOfBounds {
                        dim,
                        range: *range,
                        length,
                    })
                }
                Some(range) => Ok(Some(*range)),
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { ranges })
    }

    /// Concatenate `inner` after the ranges of this section.
    ///
    /// This addresses a member of a nested structure: outer dimensions first, then the member's dimensions.
    #[must_use]
    pub fn compose(&self, inner: &Self) -> Self {
        Self {
            ranges: self
                .ranges
                .iter()
                .chain(inner.ranges.iter())
                .copied()
                .collect(),
        }
    }

    /// Return the per-dimension intersection with `other`.
    ///
    /// An unfilled dimension intersects as the whole dimension.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError::IncompatibleRank`] if the ranks differ.
    pub fn intersect(&self, other: &Self) -> Result<Self, InvalidRangeError> {
        self.check_rank(other.rank())?;
        Ok(Self {
            ranges: std::iter::zip(&self.ranges, &other.ranges)
                .map(|(a, b)| match (a, b) {
                    (Some(a), Some(b)) => Some(a.intersect(b)),
                    (Some(r), None) | (None, Some(r)) => Some(*r),
                    (None, None) => None,
                })
                .collect(),
        })
    }

    /// Returns true if the section shares at least one element with `other`.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError::IncompatibleRank`] if the ranks differ.
    pub fn intersects(&self, other: &Self) -> Result<bool, InvalidRangeError> {
        Ok(self
            .intersect(other)?
            .ranges
            .iter()
            .all(|range| range.is_none_or(|range| !range.is_empty())))
    }

    /// Select a subsection, where `want` indexes the elements of this (filled) section.
    ///
    /// Unfilled dimensions of `want` select all elements of the corresponding range.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError`] if the ranks differ, this section is unfilled, or `want` is out-of-bounds.
    pub fn subsection(&self, want: &Self) -> Result<Self, InvalidRangeError> {
        self.check_rank(want.rank())?;
        let ranges = self.filled_ranges()?;
        let ranges = std::iter::zip(ranges, &want.ranges)
            .map(|(range, want)| match want {
                Some(want) => range.compose(want).map(Some),
                None => Ok(Some(range)),
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { ranges })
    }

    /// Subtract `origin` from the start of each range.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError`] if the rank mismatches, the section is unfilled, or `origin` exceeds a start.
    pub fn shift_origin(&self, origin: &[u64]) -> Result<Self, InvalidRangeError> {
        self.check_rank(origin.len())?;
        let ranges = std::iter::zip(self.filled_ranges()?, origin)
            .map(|(range, &origin)| range.shift_origin(origin).map(Some))
            .collect::<Result<_, _>>()?;
        Ok(Self { ranges })
    }

    /// The number of elements selected in each dimension.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError::Unfilled`] if the section is unfilled.
    pub fn shape(&self) -> Result<ArrayShape, InvalidRangeError> {
        Ok(self.filled_ranges()?.iter().map(Range::len).collect())
    }

    /// The first index of each dimension.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError::Unfilled`] if the section is unfilled.
    pub fn origin(&self) -> Result<ArrayIndices, InvalidRangeError> {
        Ok(self.filled_ranges()?.iter().map(Range::start).collect())
    }

    /// The stride of each dimension.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError::Unfilled`] if the section is unfilled.
    pub fn stride(&self) -> Result<Vec<u64>, InvalidRangeError> {
        Ok(self.filled_ranges()?.iter().map(Range::stride).collect())
    }

    /// The number of elements in the section.
    ///
    /// A rank 0 section has one element.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError`] if the section is unfilled or the count overflows [`u64`].
    pub fn num_elements(&self) -> Result<u64, InvalidRangeError> {
        self.filled_ranges()?
            .iter()
            .try_fold(1u64, |acc, range| acc.checked_mul(range.len()))
            .ok_or(InvalidRangeError::Overflow)
    }

    /// Returns true if the section is filled and selects no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is_filled() && self.ranges.iter().flatten().any(Range::is_empty)
    }

    /// Returns true if the section covers every element of a variable of `shape`.
    #[must_use]
    pub fn is_full(&self, shape: &[u64]) -> bool {
        self.rank() == shape.len()
            && std::iter::zip(&self.ranges, shape)
                .all(|(range, &length)| range.is_none_or(|range| range.is_full(length)))
    }

    /// Returns true if the filled section contains the element at `coords`.
    #[must_use]
    pub fn contains(&self, coords: &[u64]) -> bool {
        coords.len() == self.rank()
            && std::iter::zip(&self.ranges, coords)
                .all(|(range, &coord)| range.is_some_and(|range| range.contains(coord)))
    }

    /// Return an iterator over the coordinates of the section in row-major order.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError::Unfilled`] if the section is unfilled.
    pub fn iter_indices(&self) -> Result<SectionIndices, InvalidRangeError> {
        Ok(SectionIndices::new(self.filled_ranges()?))
    }

    fn check_rank(&self, rank: usize) -> Result<(), InvalidRangeError> {
        if self.rank() == rank {
            Ok(())
        } else {
            Err(InvalidRangeError::IncompatibleRank {
                got: rank,
                expected: self.rank(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_parse_display() {
        let section: Section = "1:3,:,0:9:2".parse().unwrap();
        assert_eq!(section.rank(), 3);
        assert_eq!(section.range(0), Some(Range::new(1, 1, 3).unwrap()));
        assert_eq!(section.range(1), None);
        assert_eq!(section.range(2), Some(Range::new(0, 2, 5).unwrap()));
        assert_eq!(section.to_string(), "1:3,:,0:8:2");
        assert!(!section.is_filled());
        assert!("1:3,x".parse::<Section>().is_err());
        assert_eq!("".parse::<Section>().unwrap().rank(), 0);
    }

    #[test]
    fn section_fill() {
        let section: Section = "1:3,:".parse().unwrap();
        let filled = section.fill(&[4, 5]).unwrap();
        assert!(filled.is_filled());
        assert_eq!(filled.shape().unwrap(), vec![3, 5]);
        assert_eq!(filled.origin().unwrap(), vec![1, 0]);
        assert_eq!(filled.num_elements().unwrap(), 15);

        assert_eq!(
            section.fill(&[3, 5]),
            Err(InvalidRangeError::OutOfBounds {
                dim: 0,
                range: Range::new(1, 1, 3).unwrap(),
                length: 3
            })
        );
        assert_eq!(
            section.fill(&[4]),
            Err(InvalidRangeError::IncompatibleRank {
                got: 2,
                expected: 1
            })
        );
        assert_eq!(
            Section::default().fill(&[2, 3]).unwrap(),
            Section::new_with_shape(&[2, 3])
        );
        assert!(section.shape().is_err());
        assert_eq!(section.num_elements(), Err(InvalidRangeError::Unfilled(1)));
    }

    #[test]
    fn section_intersect() {
        let a = Section::new_with_origin_shape(&[0, 0], &[8, 8]).unwrap();
        let b = Section::new_with_origin_shape(&[4, 6], &[4, 4]).unwrap();
        let c = a.intersect(&b).unwrap();
        assert_eq!(c.origin().unwrap(), vec![4, 6]);
        assert_eq!(c.shape().unwrap(), vec![4, 2]);
        assert!(a.intersects(&b).unwrap());

        let d = Section::new_with_origin_shape(&[8, 0], &[4, 4]).unwrap();
        assert!(a.intersect(&d).unwrap().is_empty());
        assert!(!a.intersects(&d).unwrap());
        assert!(a.intersect(&Section::new_unfilled(3)).is_err());

        let e = Section::new(vec![None, Some(Range::scalar(3))]);
        assert_eq!(
            a.intersect(&e).unwrap().shape().unwrap(),
            vec![8, 1]
        );
    }

    #[test]
    fn section_compose_subsection() {
        let outer: Section = "0:9:2".parse().unwrap();
        let inner: Section = "1:2,:".parse().unwrap();
        let composed = outer.compose(&inner);
        assert_eq!(composed.rank(), 3);
        assert_eq!(composed.to_string(), "0:8:2,1:2,:");

        let section: Section = "10:28:2,0:4".parse().unwrap();
        let want: Section = "1:7:3,:".parse().unwrap();
        let sub = section.subsection(&want).unwrap();
        assert_eq!(sub.to_string(), "12:24:6,0:4");
        assert!(section.subsection(&"0:10,:".parse().unwrap()).is_err());
    }

    #[test]
    fn section_shift_origin() {
        let section = Section::new_with_origin_shape(&[4, 6], &[2, 2]).unwrap();
        let shifted = section.shift_origin(&[4, 4]).unwrap();
        assert_eq!(shifted.origin().unwrap(), vec![0, 2]);
        assert!(section.shift_origin(&[5, 0]).is_err());
    }

    #[test]
    fn section_contains_full() {
        let section: Section = "0:3:2,1:2".parse().unwrap();
        assert!(section.contains(&[2, 1]));
        assert!(!section.contains(&[1, 1]));
        assert!(!section.contains(&[2]));
        assert!(Section::new_with_shape(&[3, 4]).is_full(&[3, 4]));
        assert!(Section::new_unfilled(2).is_full(&[3, 4]));
        assert!(!section.is_full(&[4, 3]));
    }

    #[test]
    fn section_rank0() {
        let section = Section::new_with_shape(&[]);
        assert_eq!(section.num_elements().unwrap(), 1);
        assert!(!section.is_empty());
        assert_eq!(section.iter_indices().unwrap().count(), 1);
    }
}
