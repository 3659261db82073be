use std::iter::FusedIterator;

use crate::Range;

/// An iterator over the indices of a [`Range`].
///
/// See [`Range::iter`].
#[derive(Clone, Debug)]
pub struct RangeIterator {
    range: Range,
    front: u64,
    back: u64,
}

impl RangeIterator {
    pub(crate) fn new(range: Range) -> Self {
        Self {
            range,
            front: 0,
            back: range.len(),
        }
    }

    fn index(&self, position: u64) -> u64 {
        self.range.start() + position * self.range.stride()
    }
}

impl Iterator for RangeIterator {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            let index = self.index(self.front);
            self.front += 1;
            Some(index)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let length = usize::try_from(self.back - self.front).unwrap_or(usize::MAX);
        (length, Some(length))
    }
}

impl DoubleEndedIterator for RangeIterator {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            self.back -= 1;
            Some(self.index(self.back))
        } else {
            None
        }
    }
}

impl ExactSizeIterator for RangeIterator {}

impl FusedIterator for RangeIterator {}
