//! Layouts.
//!
//! A layout maps a wanted [`Section`](cdm_section::Section) of a variable onto the physical storage of the variable.
//! It is a single pass iterator of transfers, in destination order, that together cover the wanted section:
//! - [`LayoutRegular`]: a variable stored as one contiguous block in row-major order.
//! - [`LayoutRegularSegmented`]: a record variable, where each index of the outermost dimension is a record at a fixed byte stride.
//! - [`LayoutTiled`]: a variable stored as independently placed uncompressed tiles.
//! - [`LayoutBBTiled`]: a variable stored as independently placed filtered (e.g. compressed) tiles, decoded into memory as the walk reaches them.
//!
//! The first three produce [`Chunk`]s addressed by byte position in the source.
//! [`LayoutBBTiled`] produces [`ChunkBB`]s which carry the decoded tile.

mod bb_tiled;
mod regular;
mod regular_segmented;
mod tile_walk;
mod tiled;

pub use bb_tiled::LayoutBBTiled;
pub use regular::LayoutRegular;
pub use regular_segmented::LayoutRegularSegmented;
pub use tile_walk::{TileEntry, TileLocation};
pub use tiled::LayoutTiled;

use crate::{Chunk, ChunkBB, LayoutError};

/// Traits for a layout of source byte positions.
pub trait Layout: Iterator<Item = Chunk> {
    /// The shape of the wanted section.
    fn shape(&self) -> &[u64];

    /// The number of elements in the wanted section.
    fn total_elements(&self) -> u64;

    /// The size in bytes of one element.
    fn element_size(&self) -> usize;

    /// Returns true if the chunks may leave parts of the destination unwritten.
    ///
    /// Unwritten regions (e.g. absent tiles) should be filled with a fill value by the reader.
    fn is_sparse(&self) -> bool {
        false
    }

    /// Returns true if a read of `chunk` may run past the end of the source.
    fn is_short_read_tolerated(&self, _chunk: &Chunk) -> bool {
        false
    }
}

/// Traits for a layout of decoded in-memory tiles.
pub trait LayoutBB: Iterator<Item = Result<ChunkBB, LayoutError>> {
    /// The shape of the wanted section.
    fn shape(&self) -> &[u64];

    /// The number of elements in the wanted section.
    fn total_elements(&self) -> u64;

    /// The size in bytes of one element.
    fn element_size(&self) -> usize;

    /// Returns true if the chunks may leave parts of the destination unwritten.
    fn is_sparse(&self) -> bool {
        false
    }
}

/// Multiply an element count by an element size, as bytes.
pub(crate) fn elements_to_bytes(elements: u64, element_size: usize) -> Option<u64> {
    elements.checked_mul(u64::try_from(element_size).ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Check chunks cover `total` destination elements in order without gaps or overlaps.
    pub(crate) fn assert_destination_order(
        chunks: impl IntoIterator<Item = (u64, u64)>,
        total: u64,
    ) {
        let mut expected = 0;
        for (dest_elem, n_elems) in chunks {
            assert_eq!(dest_elem, expected);
            assert!(n_elems > 0);
            expected += n_elems;
        }
        assert_eq!(expected, total);
    }

    #[test]
    fn layout_elements_to_bytes() {
        assert_eq!(elements_to_bytes(3, 4), Some(12));
        assert_eq!(elements_to_bytes(u64::MAX, 2), None);
    }
}
