//! Range and section algebra for the `cdm` array layout engine.
//!
//! A [`Range`] is an arithmetic progression of indices along one dimension.
//! A [`Section`] is an ordered tuple of ranges (one per dimension) selecting a possibly strided sub-array of a shaped variable.
//! [`IndexFn`] converts between linearised (row-major) indices and coordinate tuples for a shape.
//!
//! These are the addressing primitives consumed by the `cdm_layout` crate, which maps a wanted [`Section`] onto the physical storage of a variable.
//!
//! ## Licence
//! `cdm_section` is licensed under either of
//!  - the Apache License, Version 2.0 or <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license or <http://opensource.org/licenses/MIT>, at your option.

mod index_fn;
pub use index_fn::{IndexFn, Odometer};

mod range;
pub use range::Range;

mod section;
pub use section::Section;

pub mod iterators;

use thiserror::Error;

/// The shape of an array or tile.
pub type ArrayShape = Vec<u64>;

/// An ND index to an element in an array or tile.
pub type ArrayIndices = Vec<u64>;

/// An ND index to an element in an array or tile.
/// Uses [`TinyVec`](tinyvec::TinyVec) for stack allocation up to 4 dimensions.
pub type ArrayIndicesTinyVec = tinyvec::TinyVec<[u64; 4]>;

/// An invalid range or section error.
///
/// Raised when a range or section is malformed, references out-of-bounds indices, or has an incompatible rank.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum InvalidRangeError {
    /// The stride of a range is zero.
    #[error("range stride must be positive")]
    ZeroStride,
    /// The last index of a range precedes its first index.
    #[error("range last {last} is less than first {first}")]
    FirstLast { first: u64, last: u64 },
    /// An index into a range is beyond its length.
    #[error("index {index} is out of bounds of range {range}")]
    IndexOutOfBounds { index: u64, range: Range },
    /// An element is not a member of a range.
    #[error("element {element} is not a member of range {range}")]
    NotAMember { element: u64, range: Range },
    /// The rank of a section is incompatible.
    #[error("incompatible rank {got}, expected {expected}")]
    IncompatibleRank { got: usize, expected: usize },
    /// A range extends beyond the length of its dimension.
    #[error("range {range} in dimension {dim} exceeds the dimension length {length}")]
    OutOfBounds { dim: usize, range: Range, length: u64 },
    /// Indices are out-of-bounds of a shape.
    #[error("indices {indices:?} are out-of-bounds of shape {shape:?}")]
    IndicesOutOfBounds {
        indices: ArrayIndices,
        shape: ArrayShape,
    },
    /// A section dimension has no range and the section has not been filled.
    #[error("section dimension {0} has no range, fill the section first")]
    Unfilled(usize),
    /// A range cannot be shifted by an origin beyond its start.
    #[error("range {range} cannot be shifted by origin {origin}")]
    InvalidOrigin { range: Range, origin: u64 },
    /// The inner dimensions of a record do not fit within the record stride.
    #[error("record of {record_bytes} bytes does not fit within the record stride of {record_stride} bytes")]
    RecordSize { record_bytes: u64, record_stride: u64 },
    /// The number of elements or the byte extent overflows [`u64`].
    #[error("section extent overflows a 64-bit address")]
    Overflow,
    /// A section specification could not be parsed.
    #[error("invalid section specification `{0}`")]
    Parse(String),
}
