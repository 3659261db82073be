//! Byte ranges.
//!
//! A [`ByteRange`] is a run of `length` bytes starting at an absolute `offset` in a byte sequence.

use std::ops::Range;

use thiserror::Error;

/// A byte offset.
pub type ByteOffset = u64;

/// A byte length.
pub type ByteLength = u64;

/// A byte range.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ByteRange {
    offset: ByteOffset,
    length: ByteLength,
}

impl ByteRange {
    /// Create a byte range of `length` bytes at `offset`.
    #[must_use]
    pub const fn new_with_offset_length(offset: ByteOffset, length: ByteLength) -> Self {
        Self { offset, length }
    }

    /// The offset of the first byte.
    #[must_use]
    pub const fn offset(&self) -> ByteOffset {
        self.offset
    }

    /// The number of bytes.
    #[must_use]
    pub const fn length(&self) -> ByteLength {
        self.length
    }

    /// Return the exclusive end of the byte range, or [`None`] if it exceeds [`u64::MAX`].
    #[must_use]
    pub const fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.length)
    }

    /// Returns true if the byte range lies within bytes of length `size`.
    #[must_use]
    pub fn is_valid(&self, size: u64) -> bool {
        self.end().is_some_and(|end| end <= size)
    }

    /// Convert the byte range to a [`Range<usize>`] after checking it lies within `size` bytes.
    ///
    /// # Errors
    /// Returns [`InvalidByteRangeError`] if the byte range extends beyond `size` or [`usize::MAX`].
    pub fn to_range_usize(&self, size: u64) -> Result<Range<usize>, InvalidByteRangeError> {
        let invalid = || InvalidByteRangeError::new(*self, size);
        if !self.is_valid(size) {
            return Err(invalid());
        }
        let start = usize::try_from(self.offset).map_err(|_| invalid())?;
        let length = usize::try_from(self.length).map_err(|_| invalid())?;
        Ok(start..start + length)
    }
}

impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self.end() {
            Some(end) => write!(f, "{}..{end}", self.offset),
            None => write!(f, "{}..(+{})", self.offset, self.length),
        }
    }
}

/// An invalid byte range error.
#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid byte range {0} for bytes of length {1}")]
pub struct InvalidByteRangeError(ByteRange, u64);

impl InvalidByteRangeError {
    /// Create a new [`InvalidByteRangeError`].
    #[must_use]
    pub fn new(byte_range: ByteRange, bytes_len: u64) -> Self {
        Self(byte_range, bytes_len)
    }

    /// The requested byte range.
    #[must_use]
    pub fn byte_range(&self) -> ByteRange {
        self.0
    }

    /// The length of the bytes the range was requested from.
    #[must_use]
    pub fn bytes_len(&self) -> u64 {
        self.1
    }
}
