use cdm_section::{iterators::ContiguousRuns, ArrayShape, IndexFn, InvalidRangeError, Section};

use super::{elements_to_bytes, Layout};
use crate::Chunk;

/// A layout of a variable stored as a single contiguous block in row-major order.
///
/// Trailing dimensions of the wanted section that cover their whole dimension collapse into one chunk, together with the next dimension outward if it has unit stride.
/// The remaining leading dimensions are stepped one coordinate per chunk.
#[derive(Clone, Debug)]
pub struct LayoutRegular {
    start_offset: u64,
    element_size: usize,
    wanted: Section,
    shape: ArrayShape,
    strides: Vec<u64>,
    runs: ContiguousRuns,
    total_elements: u64,
    dest_elem: u64,
}

impl LayoutRegular {
    /// Create a new regular layout of the `wanted` section of a variable of `var_shape` stored at byte `start_offset`.
    ///
    /// Unfilled dimensions of `wanted` select the whole dimension.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError`] if `wanted` is incompatible with `var_shape` or the byte extent of the variable overflows [`u64`].
    pub fn new(
        start_offset: u64,
        element_size: usize,
        var_shape: &[u64],
        wanted: &Section,
    ) -> Result<Self, InvalidRangeError> {
        let wanted = wanted.fill(var_shape)?;
        let index_fn = IndexFn::new(var_shape)?;
        elements_to_bytes(index_fn.size(), element_size)
            .and_then(|bytes| bytes.checked_add(start_offset))
            .ok_or(InvalidRangeError::Overflow)?;
        let runs = ContiguousRuns::new(&wanted, var_shape)?;
        let total_elements = wanted.num_elements()?;
        Ok(Self {
            start_offset,
            element_size,
            shape: wanted.shape()?,
            wanted,
            strides: index_fn.strides().to_vec(),
            runs,
            total_elements,
            dest_elem: 0,
        })
    }

    /// The filled wanted section.
    #[must_use]
    pub fn wanted(&self) -> &Section {
        &self.wanted
    }
}

impl Iterator for LayoutRegular {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let (indices, n_elems) = self.runs.next()?;
        let linear: u64 = std::iter::zip(indices.iter(), &self.strides)
            .map(|(index, stride)| index * stride)
            .sum();
        let src_pos = self.start_offset + linear * self.element_size as u64;
        let chunk = Chunk::new(src_pos, self.dest_elem, n_elems);
        self.dest_elem += n_elems;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.runs.size_hint()
    }
}

impl std::iter::FusedIterator for LayoutRegular {}

impl Layout for LayoutRegular {
    fn shape(&self) -> &[u64] {
        &self.shape
    }

    fn total_elements(&self) -> u64 {
        self.total_elements
    }

    fn element_size(&self) -> usize {
        self.element_size
    }
}
