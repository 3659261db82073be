//! Strided ranges along a single dimension.

use std::fmt::Display;
use std::str::FromStr;

use num::integer::Integer;

use crate::iterators::RangeIterator;
use crate::InvalidRangeError;

/// An arithmetic progression of indices along one dimension.
///
/// A range with `start` 2, `stride` 3 and `length` 4 selects the indices `[2, 5, 8, 11]`.
/// The full range of a dimension with length `n` is `{0, 1, n}`.
///
/// Ranges are displayed and parsed in the `first:last[:stride]` notation, where `last` is inclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Range {
    start: u64,
    stride: u64,
    length: u64,
}

impl Default for Range {
    fn default() -> Self {
        Self::empty()
    }
}

impl Range {
    /// Create a new range.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError::ZeroStride`] if `stride` is zero.
    /// Returns [`InvalidRangeError::Overflow`] if one past the last index of the range is not representable as a [`u64`].
    pub fn new(start: u64, stride: u64, length: u64) -> Result<Self, InvalidRangeError> {
        if stride == 0 {
            return Err(InvalidRangeError::ZeroStride);
        }
        if length > 0 {
            (length - 1)
                .checked_mul(stride)
                .and_then(|span| span.checked_add(start))
                .and_then(|last| last.checked_add(1))
                .ok_or(InvalidRangeError::Overflow)?;
        }
        Ok(Self {
            start,
            stride,
            length,
        })
    }

    /// Create a new range from an inclusive `first` and `last` index.
    ///
    /// `last` need not be a member of the range, the range stops at the last member not exceeding it.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError`] if `stride` is zero, `last < first`, or the last member is [`u64::MAX`].
    pub fn new_with_first_last(first: u64, last: u64, stride: u64) -> Result<Self, InvalidRangeError> {
        if stride == 0 {
            return Err(InvalidRangeError::ZeroStride);
        }
        if last < first {
            return Err(InvalidRangeError::FirstLast { first, last });
        }
        Self::new(first, stride, (last - first) / stride + 1)
    }

    /// Create the full range of a dimension with length `length`.
    #[must_use]
    pub const fn full(length: u64) -> Self {
        Self {
            start: 0,
            stride: 1,
            length,
        }
    }

    /// Create an empty range.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            start: 0,
            stride: 1,
            length: 0,
        }
    }

    /// Create a range selecting the single index `index`.
    #[must_use]
    pub const fn scalar(index: u64) -> Self {
        Self {
            start: index,
            stride: 1,
            length: 1,
        }
    }

    /// The first index of the range.
    #[must_use]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// The stride of the range.
    #[must_use]
    pub const fn stride(&self) -> u64 {
        self.stride
    }

    /// The number of indices in the range.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.length
    }

    /// Returns true if the range selects no indices.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The first index of the range, [`None`] if empty.
    #[must_use]
    pub const fn first(&self) -> Option<u64> {
        if self.is_empty() {
            None
        } else {
            Some(self.start)
        }
    }

    /// The last index of the range, [`None`] if empty.
    #[must_use]
    pub const fn last(&self) -> Option<u64> {
        if self.is_empty() {
            None
        } else {
            Some(
                self.start
                    .saturating_add((self.length - 1).saturating_mul(self.stride)),
            )
        }
    }

    /// One past the last index of the range.
    ///
    /// This is the minimum length of a dimension that can hold the range.
    #[must_use]
    pub const fn end_exc(&self) -> u64 {
        match self.last() {
            Some(last) => last.saturating_add(1),
            None => self.start,
        }
    }

    /// Return the `index`-th element of the range.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError::IndexOutOfBounds`] if `index >= self.len()`.
    pub fn element(&self, index: u64) -> Result<u64, InvalidRangeError> {
        if index < self.length {
            Ok(self.start + index * self.stride)
        } else {
            Err(InvalidRangeError::IndexOutOfBounds { index, range: *self })
        }
    }

    /// Return the position of `element` in the range, the inverse of [`element`](Self::element).
    ///
    /// # Errors
    /// Returns [`InvalidRangeError::NotAMember`] if `element` is not in the range.
    pub fn index_of(&self, element: u64) -> Result<u64, InvalidRangeError> {
        if self.contains(element) {
            Ok((element - self.start) / self.stride)
        } else {
            Err(InvalidRangeError::NotAMember {
                element,
                range: *self,
            })
        }
    }

    /// Returns true if `element` is a member of the range.
    #[must_use]
    pub fn contains(&self, element: u64) -> bool {
        match self.last() {
            Some(last) => {
                element >= self.start
                    && element <= last
                    && (element - self.start) % self.stride == 0
            }
            None => false,
        }
    }

    /// Returns true if the range covers every index of a dimension with length `length`.
    #[must_use]
    pub fn is_full(&self, length: u64) -> bool {
        self.length == length && (self.start == 0 && (self.stride == 1 || length <= 1))
    }

    /// Return the indices present in both `self` and `other`.
    ///
    /// The stride of the intersection is the least common multiple of both strides.
    /// Returns an empty range if the ranges are disjoint.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let (Some(a_last), Some(b_last)) = (self.last(), other.last()) else {
            return Self::empty();
        };
        let last = a_last.min(b_last);
        // an lcm beyond u64 admits at most one common element
        let stride = (self.stride / self.stride.gcd(&other.stride))
            .checked_mul(other.stride)
            .unwrap_or(u64::MAX);

        // Step through the coarser range, the first common element lies within one period of the lcm
        let (coarse, fine) = if self.stride >= other.stride {
            (self, other)
        } else {
            (other, self)
        };
        let lower = self.start.max(other.start);
        let mut candidate = if lower <= coarse.start {
            coarse.start
        } else {
            coarse.start + (lower - coarse.start).div_ceil(coarse.stride) * coarse.stride
        };
        let steps = stride / coarse.stride;
        for _ in 0..steps {
            if candidate > last {
                break;
            }
            if fine.contains(candidate) {
                return Self {
                    start: candidate,
                    stride,
                    length: (last - candidate) / stride + 1,
                };
            }
            let Some(next) = candidate.checked_add(coarse.stride) else {
                break;
            };
            candidate = next;
        }
        Self::empty()
    }

    /// Returns true if `self` and `other` share at least one index.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Select elements of this range with `inner`, where `inner` indexes the elements of `self`.
    ///
    /// The result is `{self.element(inner.start), self.stride * inner.stride, inner.len}`.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError::IndexOutOfBounds`] if `inner` references an element beyond the end of `self`.
    /// Returns [`InvalidRangeError::Overflow`] if the composed stride overflows.
    pub fn compose(&self, inner: &Self) -> Result<Self, InvalidRangeError> {
        let stride = self
            .stride
            .checked_mul(inner.stride)
            .ok_or(InvalidRangeError::Overflow)?;
        match inner.last() {
            Some(inner_last) => {
                self.element(inner_last)?;
                Ok(Self {
                    start: self.element(inner.start)?,
                    stride,
                    length: inner.length,
                })
            }
            None => Ok(Self {
                start: self.start,
                stride,
                length: 0,
            }),
        }
    }

    /// Subtract `origin` from the start of the range.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError::InvalidOrigin`] if `origin` exceeds the start of the range.
    pub fn shift_origin(&self, origin: u64) -> Result<Self, InvalidRangeError> {
        if origin <= self.start {
            Ok(Self {
                start: self.start - origin,
                ..*self
            })
        } else {
            Err(InvalidRangeError::InvalidOrigin {
                range: *self,
                origin,
            })
        }
    }

    /// Return an iterator over the indices of the range.
    #[must_use]
    pub fn iter(&self) -> RangeIterator {
        RangeIterator::new(*self)
    }
}

impl IntoIterator for Range {
    type Item = u64;
    type IntoIter = RangeIterator;

    fn into_iter(self) -> Self::IntoIter {
        RangeIterator::new(self)
    }
}

impl IntoIterator for &Range {
    type Item = u64;
    type IntoIter = RangeIterator;

    fn into_iter(self) -> Self::IntoIter {
        RangeIterator::new(*self)
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.last() {
            None => write!(f, "empty"),
            Some(last) if self.stride == 1 => write!(f, "{}:{last}", self.start),
            Some(last) => write!(f, "{}:{last}:{}", self.start, self.stride),
        }
    }
}

impl FromStr for Range {
    type Err = InvalidRangeError;

    /// Parse `first`, `first:last` or `first:last:stride`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |v: &str| {
            v.trim()
                .parse::<u64>()
                .map_err(|_| InvalidRangeError::Parse(s.to_string()))
        };
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [index] => Ok(Self::scalar(parse(index)?)),
            [first, last] => Self::new_with_first_last(parse(first)?, parse(last)?, 1),
            [first, last, stride] => {
                Self::new_with_first_last(parse(first)?, parse(last)?, parse(stride)?)
            }
            _ => Err(InvalidRangeError::Parse(s.to_string())),
        }
    }
}
