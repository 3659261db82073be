use cdm_section::{ArrayIndices, Section};

use super::{
    tile_walk::{TileEntry, TileLocation, TileWalk},
    Layout,
};
use crate::{Chunk, LayoutError};

/// A layout of a variable stored as independently placed uncompressed tiles.
///
/// Tiles are supplied by the caller as [`TileEntry`]s, and tiles that do not intersect the wanted section are dropped at construction.
/// The wanted section is walked in destination order, with each run split at tile boundaries and translated into tile-local coordinates.
///
/// Absent tiles produce no chunks.
/// Their origins are listed by [`missing_tiles`](LayoutTiled::missing_tiles) and the layout is then [sparse](Layout::is_sparse).
#[derive(Debug)]
pub struct LayoutTiled {
    walk: TileWalk,
    element_size: usize,
}

impl LayoutTiled {
    /// Create a new tiled layout of the `wanted` section of a variable of `var_shape` stored in `tiles` of `tile_shape`.
    ///
    /// # Errors
    /// Returns [`LayoutError::InvalidRange`] if `wanted` is incompatible with `var_shape`.
    /// Returns [`LayoutError::IllegalState`] if a tile is [filtered](TileLocation::Filtered), misaligned, or duplicated, or the tile shape is invalid.
    pub fn new(
        tiles: impl IntoIterator<Item = TileEntry>,
        var_shape: &[u64],
        tile_shape: &[u64],
        element_size: usize,
        wanted: &Section,
    ) -> Result<Self, LayoutError> {
        let tiles: Vec<TileEntry> = tiles.into_iter().collect();
        if let Some(tile) = tiles
            .iter()
            .find(|tile| matches!(tile.location(), TileLocation::Filtered { .. }))
        {
            return Err(LayoutError::illegal_state(format!(
                "filtered tile at origin {:?} in an uncompressed tiled layout",
                tile.origin()
            )));
        }
        let walk = TileWalk::new(tiles, var_shape, tile_shape, wanted)?;
        Ok(Self { walk, element_size })
    }

    /// The origins of tiles that intersect the wanted section but are absent.
    #[must_use]
    pub fn missing_tiles(&self) -> &[ArrayIndices] {
        self.walk.missing_tiles()
    }

    /// The tiles intersecting the wanted section.
    #[must_use]
    pub fn tiles(&self) -> &[TileEntry] {
        self.walk.tiles()
    }
}

impl Iterator for LayoutTiled {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        loop {
            let segment = self.walk.next()?;
            let Some(entry) = segment.entry else {
                continue;
            };
            let offset = self.walk.tiles()[entry].location().offset();
            let src_pos = offset + segment.local_linear * self.element_size as u64;
            return Some(Chunk::new(src_pos, segment.dest_elem, segment.n_elems));
        }
    }
}

impl std::iter::FusedIterator for LayoutTiled {}

impl Layout for LayoutTiled {
    fn shape(&self) -> &[u64] {
        self.walk.shape()
    }

    fn total_elements(&self) -> u64 {
        self.walk.num_elements()
    }

    fn element_size(&self) -> usize {
        self.element_size
    }

    fn is_sparse(&self) -> bool {
        !self.walk.missing_tiles().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;
    use crate::layout::tests::assert_destination_order;

    /// 8x8 variable of 4x4 tiles stored in row-major tile order, 64 bytes apart.
    fn tiles() -> Vec<TileEntry> {
        vec![
            TileEntry::new_raw(vec![0, 0], 0),
            TileEntry::new_raw(vec![0, 4], 64),
            TileEntry::new_raw(vec![4, 0], 128),
            TileEntry::new_raw(vec![4, 4], 192),
        ]
    }

    #[test]
    fn layout_tiled_intersection() {
        let wanted: Section = "1:2,3:4".parse().unwrap();
        let layout = LayoutTiled::new(tiles(), &[8, 8], &[4, 4], 4, &wanted).unwrap();
        assert_eq!(layout.tiles().len(), 2);
        assert!(!layout.is_sparse());
        assert_eq!(
            layout.collect_vec(),
            vec![
                Chunk::new((4 + 3) * 4, 0, 1),
                Chunk::new(64 + 4 * 4, 1, 1),
                Chunk::new((8 + 3) * 4, 2, 1),
                Chunk::new(64 + 8 * 4, 3, 1),
            ]
        );
    }

    #[test]
    fn layout_tiled_full() {
        let layout =
            LayoutTiled::new(tiles(), &[8, 8], &[4, 4], 1, &Section::new_unfilled(2)).unwrap();
        assert_eq!(layout.total_elements(), 64);
        let chunks = layout.collect_vec();
        assert_eq!(chunks.len(), 16);
        assert!(chunks.iter().all(|chunk| chunk.n_elems() == 4));
        assert_destination_order(chunks.iter().map(|c| (c.dest_elem(), c.n_elems())), 64);
    }

    #[test]
    fn layout_tiled_edge_tiles() {
        // the variable does not fill the edge tiles
        let layout =
            LayoutTiled::new(tiles(), &[6, 5], &[4, 4], 2, &Section::new_unfilled(2)).unwrap();
        let chunks = layout.collect_vec();
        assert_eq!(
            chunks[..2],
            [Chunk::new(0, 0, 4), Chunk::new(64, 4, 1)]
        );
        assert_eq!(chunks[8], Chunk::new(128, 16, 4));
        assert_destination_order(chunks.iter().map(|c| (c.dest_elem(), c.n_elems())), 30);
    }

    #[test]
    fn layout_tiled_missing() {
        let mut tiles = tiles();
        tiles.remove(1);
        let layout =
            LayoutTiled::new(tiles, &[8, 8], &[4, 4], 1, &Section::new_unfilled(2)).unwrap();
        assert!(layout.is_sparse());
        assert_eq!(layout.missing_tiles().to_vec(), vec![vec![0u64, 4]]);
        let chunks = layout.collect_vec();
        assert_eq!(chunks.iter().map(Chunk::n_elems).sum::<u64>(), 48);
        assert!(chunks
            .iter()
            .tuple_windows()
            .all(|(a, b)| a.dest_elem() + a.n_elems() <= b.dest_elem()));
    }

    #[test]
    fn layout_tiled_rejects_filtered() {
        let mut tiles = tiles();
        tiles.push(TileEntry::new_filtered(vec![8, 0], 256, 10, 0));
        assert!(matches!(
            LayoutTiled::new(tiles, &[12, 8], &[4, 4], 1, &Section::new_unfilled(2)),
            Err(LayoutError::IllegalState(_))
        ));
    }
}
