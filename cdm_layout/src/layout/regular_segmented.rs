use cdm_section::{iterators::ContiguousRuns, ArrayShape, IndexFn, InvalidRangeError, Section};

use super::{elements_to_bytes, Layout};
use crate::Chunk;

/// A layout of a record variable.
///
/// The outermost (record) dimension advances by `record_stride` bytes, and each record stores the inner dimensions contiguously in row-major order.
/// Records of different variables are interleaved in the source, so a chunk never spans more than one record.
///
/// The final record is often shorter than `record_stride` in the source.
/// Chunks in the final record are flagged by [`Layout::is_short_read_tolerated`].
#[derive(Clone, Debug)]
pub struct LayoutRegularSegmented {
    start_offset: u64,
    element_size: usize,
    record_stride: u64,
    num_records: u64,
    inner_strides: Vec<u64>,
    shape: ArrayShape,
    runs: ContiguousRuns,
    total_elements: u64,
    dest_elem: u64,
}

impl LayoutRegularSegmented {
    /// Create a new record-segmented layout of the `wanted` section of a variable of `var_shape`.
    ///
    /// The first record starts at byte `start_offset`, and record `i` at `start_offset + i * record_stride`.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError`] if
    ///  - `var_shape` has no record dimension,
    ///  - the inner dimensions do not fit within `record_stride`,
    ///  - `wanted` is incompatible with `var_shape`, or
    ///  - the byte extent of the variable overflows [`u64`].
    pub fn new(
        start_offset: u64,
        element_size: usize,
        record_stride: u64,
        var_shape: &[u64],
        wanted: &Section,
    ) -> Result<Self, InvalidRangeError> {
        let Some((&num_records, inner_shape)) = var_shape.split_first() else {
            return Err(InvalidRangeError::IncompatibleRank {
                got: 0,
                expected: 1,
            });
        };
        let inner_index_fn = IndexFn::new(inner_shape)?;
        let record_bytes = elements_to_bytes(inner_index_fn.size(), element_size)
            .ok_or(InvalidRangeError::Overflow)?;
        if record_bytes > record_stride {
            return Err(InvalidRangeError::RecordSize {
                record_bytes,
                record_stride,
            });
        }
        num_records
            .checked_mul(record_stride)
            .and_then(|bytes| bytes.checked_add(start_offset))
            .ok_or(InvalidRangeError::Overflow)?;

        let wanted = wanted.fill(var_shape)?;
        let runs = ContiguousRuns::new_with_barrier(&wanted, var_shape, 1)?;
        Ok(Self {
            start_offset,
            element_size,
            record_stride,
            num_records,
            inner_strides: inner_index_fn.strides().to_vec(),
            shape: wanted.shape()?,
            runs,
            total_elements: wanted.num_elements()?,
            dest_elem: 0,
        })
    }

    /// The byte stride between records.
    #[must_use]
    pub fn record_stride(&self) -> u64 {
        self.record_stride
    }
}

impl Iterator for LayoutRegularSegmented {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let (indices, n_elems) = self.runs.next()?;
        let inner_linear: u64 = std::iter::zip(&indices[1..], &self.inner_strides)
            .map(|(index, stride)| index * stride)
            .sum();
        let src_pos = self.start_offset
            + indices[0] * self.record_stride
            + inner_linear * self.element_size as u64;
        let chunk = Chunk::new(src_pos, self.dest_elem, n_elems);
        self.dest_elem += n_elems;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.runs.size_hint()
    }
}

impl std::iter::FusedIterator for LayoutRegularSegmented {}

impl Layout for LayoutRegularSegmented {
    fn shape(&self) -> &[u64] {
        &self.shape
    }

    fn total_elements(&self) -> u64 {
        self.total_elements
    }

    fn element_size(&self) -> usize {
        self.element_size
    }

    fn is_short_read_tolerated(&self, chunk: &Chunk) -> bool {
        self.num_records > 0
            && chunk.src_pos() >= self.start_offset + (self.num_records - 1) * self.record_stride
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;
    use crate::layout::tests::assert_destination_order;

    #[test]
    fn layout_regular_segmented_records() {
        // 3 records of 2x2 shorts, interleaved with 4 bytes of another variable
        let layout =
            LayoutRegularSegmented::new(40, 2, 12, &[3, 2, 2], &Section::new_unfilled(3)).unwrap();
        assert_eq!(layout.total_elements(), 12);
        assert_eq!(layout.record_stride(), 12);
        let chunks = layout.clone().collect_vec();
        assert_eq!(
            chunks,
            vec![
                Chunk::new(40, 0, 4),
                Chunk::new(52, 4, 4),
                Chunk::new(64, 8, 4),
            ]
        );
        assert!(!layout.is_short_read_tolerated(&chunks[1]));
        assert!(layout.is_short_read_tolerated(&chunks[2]));
    }

    #[test]
    fn layout_regular_segmented_partial() {
        let wanted: Section = "1:2,1:1,0:2:2".parse().unwrap();
        let layout = LayoutRegularSegmented::new(0, 4, 40, &[4, 2, 3], &wanted).unwrap();
        let chunks = layout.collect_vec();
        assert_eq!(
            chunks.iter().map(Chunk::src_pos).collect_vec(),
            vec![40 + 12, 40 + 20, 80 + 12, 80 + 20]
        );
        assert_destination_order(chunks.iter().map(|c| (c.dest_elem(), c.n_elems())), 4);
    }

    #[test]
    fn layout_regular_segmented_rank1() {
        let layout =
            LayoutRegularSegmented::new(0, 8, 24, &[3], &Section::new_unfilled(1)).unwrap();
        assert_eq!(
            layout.collect_vec(),
            vec![Chunk::new(0, 0, 1), Chunk::new(24, 1, 1), Chunk::new(48, 2, 1)]
        );
    }

    #[test]
    fn layout_regular_segmented_invalid() {
        assert_eq!(
            LayoutRegularSegmented::new(0, 4, 8, &[], &Section::new_unfilled(0)).unwrap_err(),
            InvalidRangeError::IncompatibleRank {
                got: 0,
                expected: 1
            }
        );
        assert_eq!(
            LayoutRegularSegmented::new(0, 4, 8, &[2, 3], &Section::new_unfilled(2)).unwrap_err(),
            InvalidRangeError::RecordSize {
                record_bytes: 12,
                record_stride: 8
            }
        );
        assert!(matches!(
            LayoutRegularSegmented::new(0, 4, 12, &[2, 3], &"2:2,:".parse().unwrap()),
            Err(InvalidRangeError::OutOfBounds { dim: 0, .. })
        ));
    }
}
