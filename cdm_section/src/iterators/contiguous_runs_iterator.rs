use std::iter::FusedIterator;

use itertools::izip;

use crate::{ArrayIndicesTinyVec, InvalidRangeError, Odometer, Range, Section};

/// Iterates over runs of section elements that are contiguous in a row-major array.
///
/// The iterator item is a tuple: (indices of the first element of the run, # contiguous elements).
///
/// Trailing dimensions that cover their whole array dimension with unit stride collapse into a single run, together with the next dimension outward if its stride is 1.
/// Remaining leading dimensions are stepped one coordinate per run.
/// For example, consider a 4x3 array with element indices
/// ```text
/// (0, 0)  (0, 1)  (0, 2)
/// (1, 0)  (1, 1)  (1, 2)
/// (2, 0)  (2, 1)  (2, 2)
/// (3, 0)  (3, 1)  (3, 2)
/// ```
/// A section covering the entire array will produce
/// ```rust,ignore
/// [((0, 0), 12)]
/// ```
/// The section `2:3,1:2` will produce
/// ```rust,ignore
/// [((2, 1), 2), ((3, 1), 2)]
/// ```
/// and the section `0:3:2,0:2:2` (strided innermost) will produce runs of length 1
/// ```rust,ignore
/// [((0, 0), 1), ((0, 2), 1), ((2, 0), 1), ((2, 2), 1)]
/// ```
#[derive(Clone, Debug)]
pub struct ContiguousRuns {
    ranges: Vec<Range>,
    odometer: Odometer,
    contiguous_elements: u64,
}

impl ContiguousRuns {
    /// Create a new contiguous runs iterator of `section` in an array of `array_shape`.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError`] if the section is unfilled, its rank does not match `array_shape`, or it exceeds `array_shape`.
    pub fn new(section: &Section, array_shape: &[u64]) -> Result<Self, InvalidRangeError> {
        Self::new_with_barrier(section, array_shape, 0)
    }

    /// Create a new contiguous runs iterator where dimensions before `barrier` never join a run.
    ///
    /// A barrier of 1 keeps each run within a single index of the outermost dimension, as needed when that dimension is not contiguous in storage.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError`] if the section is unfilled, its rank does not match `array_shape`, or it exceeds `array_shape`.
    pub fn new_with_barrier(
        section: &Section,
        array_shape: &[u64],
        barrier: usize,
    ) -> Result<Self, InvalidRangeError> {
        let ranges = section.filled_ranges()?;
        if ranges.len() != array_shape.len() {
            return Err(InvalidRangeError::IncompatibleRank {
                got: ranges.len(),
                expected: array_shape.len(),
            });
        }
        for (dim, (range, &length)) in std::iter::zip(&ranges, array_shape).enumerate() {
            if !range.is_empty() && range.end_exc() > length {
                return Err(InvalidRangeError::OutOfBounds {
                    dim,
                    range: *range,
                    length,
                });
            }
        }

        let mut contiguous = true;
        let mut contiguous_elements = 1;
        let mut shape_out = vec![0; ranges.len()];
        for (dim, range, &array_size, shape_out_i) in izip!(
            0..ranges.len(),
            &ranges,
            array_shape,
            shape_out.iter_mut()
        )
        .rev()
        {
            if contiguous && dim >= barrier && (range.stride() == 1 || range.len() <= 1) {
                contiguous_elements *= range.len();
                *shape_out_i = 1;
                contiguous = range.is_full(array_size);
            } else {
                contiguous = false;
                *shape_out_i = range.len();
            }
        }

        let odometer = if contiguous_elements == 0 {
            // an empty section has no runs
            Odometer::new(vec![0])
        } else {
            Odometer::new(shape_out)
        };
        Ok(Self {
            ranges,
            odometer,
            contiguous_elements,
        })
    }

    /// Return the number of runs remaining.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.odometer.remaining()
    }

    /// Returns true if there are no runs remaining.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.odometer.is_done()
    }

    /// Return the number of contiguous elements (fixed on each iteration).
    #[must_use]
    pub fn contiguous_elements(&self) -> u64 {
        self.contiguous_elements
    }
}

impl Iterator for ContiguousRuns {
    type Item = (ArrayIndicesTinyVec, u64);

    fn next(&mut self) -> Option<Self::Item> {
        let position = self.odometer.next()?;
        let indices = std::iter::zip(position, &self.ranges)
            .map(|(p, range)| range.start() + p * range.stride())
            .collect();
        Some((indices, self.contiguous_elements))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.odometer.size_hint()
    }
}

impl FusedIterator for ContiguousRuns {}
