//! Range and section iterators.
//!
//! The iterators are:
//!  - [`RangeIterator`]: iterate over the indices of a [`Range`](crate::Range).
//!  - [`SectionIndices`]: iterate over the multidimensional indices of the elements in a filled [`Section`](crate::Section).
//!  - [`ContiguousRuns`]: iterate over runs of elements of a section that are contiguous in a row-major array.
//!
//! All iterators visit the last dimension fastest (i.e. C-contiguous order) and are restartable by cloning.

mod contiguous_runs_iterator;
mod range_iterator;
mod section_indices_iterator;

pub use contiguous_runs_iterator::ContiguousRuns;
pub use range_iterator::RangeIterator;
pub use section_indices_iterator::SectionIndices;
