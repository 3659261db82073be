use std::collections::HashMap;

use cdm_section::{ArrayIndices, ArrayShape, IndexFn, Odometer, Range, Section};
use itertools::Itertools;

use crate::LayoutError;

/// The storage location of a tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TileLocation {
    /// An uncompressed tile starting at byte `offset` of the source.
    Raw {
        /// The byte position of the tile.
        offset: u64,
    },
    /// A filtered tile stored as `size` bytes at byte `offset` of the source.
    ///
    /// Bit `i` of `filter_mask` is set if filter `i` of the pipeline was not applied to this tile.
    Filtered {
        /// The byte position of the tile.
        offset: u64,
        /// The stored size of the tile in bytes.
        size: u64,
        /// The filters skipped for this tile.
        filter_mask: u32,
    },
}

impl TileLocation {
    /// The byte position of the tile in the source.
    #[must_use]
    pub fn offset(&self) -> u64 {
        match self {
            Self::Raw { offset } | Self::Filtered { offset, .. } => *offset,
        }
    }
}

/// A stored tile of a tiled variable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TileEntry {
    origin: ArrayIndices,
    location: TileLocation,
}

impl TileEntry {
    /// Create a new tile entry with its element `origin` in the variable.
    #[must_use]
    pub fn new(origin: ArrayIndices, location: TileLocation) -> Self {
        Self { origin, location }
    }

    /// Create a new uncompressed tile entry.
    #[must_use]
    pub fn new_raw(origin: ArrayIndices, offset: u64) -> Self {
        Self::new(origin, TileLocation::Raw { offset })
    }

    /// Create a new filtered tile entry.
    #[must_use]
    pub fn new_filtered(origin: ArrayIndices, offset: u64, size: u64, filter_mask: u32) -> Self {
        Self::new(
            origin,
            TileLocation::Filtered {
                offset,
                size,
                filter_mask,
            },
        )
    }

    /// The element coordinates of the first element of the tile.
    #[must_use]
    pub fn origin(&self) -> &[u64] {
        &self.origin
    }

    /// The storage location of the tile.
    #[must_use]
    pub fn location(&self) -> &TileLocation {
        &self.location
    }
}

/// A run of wanted elements within a single tile position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct TileSegment {
    /// The index of the tile in [`TileWalk::tiles`], [`None`] if the tile is absent.
    pub(crate) entry: Option<usize>,
    pub(crate) dest_elem: u64,
    pub(crate) n_elems: u64,
    /// The row-major element offset of the run within the tile.
    pub(crate) local_linear: u64,
    /// The coordinate of the run in the outermost dimension.
    pub(crate) band: u64,
}

/// Walks a wanted section over a set of tiles in destination order.
///
/// Each innermost run of the section is split at tile boundaries.
/// Consecutive runs that are contiguous in both the tile and the destination are merged.
#[derive(Debug)]
pub(crate) struct TileWalk {
    ranges: Vec<Range>,
    tile_shape: ArrayShape,
    tile_strides: Vec<u64>,
    tiles: Vec<TileEntry>,
    grid: HashMap<ArrayIndices, usize>,
    missing: Vec<ArrayIndices>,
    shape: ArrayShape,
    num_elements: u64,
    outer: Odometer,
    inner_index: u64,
    dest_elem: u64,
    coords: ArrayIndices,
    grid_indices: ArrayIndices,
    pending: Option<TileSegment>,
}

impl TileWalk {
    /// Create a walk of `wanted` over `tiles` of `tile_shape` in a variable of `var_shape`.
    ///
    /// Tiles that do not intersect the wanted section are dropped.
    ///
    /// # Errors
    /// Returns [`LayoutError::InvalidRange`] if `wanted` is incompatible with `var_shape`.
    /// Returns [`LayoutError::IllegalState`] if the tile shape or a tile origin is invalid, or if tiles are duplicated.
    pub(crate) fn new(
        tiles: impl IntoIterator<Item = TileEntry>,
        var_shape: &[u64],
        tile_shape: &[u64],
        wanted: &Section,
    ) -> Result<Self, LayoutError> {
        let wanted = wanted.fill(var_shape)?;
        let ranges = wanted.filled_ranges()?;
        let num_elements = wanted.num_elements()?;
        let rank = var_shape.len();

        if tile_shape.len() != rank {
            return Err(LayoutError::illegal_state(format!(
                "tile shape {tile_shape:?} does not match the rank of variable shape {var_shape:?}"
            )));
        }
        if tile_shape.contains(&0) {
            return Err(LayoutError::illegal_state(format!(
                "tile shape {tile_shape:?} has a zero dimension"
            )));
        }
        let tile_strides = IndexFn::new(tile_shape)?.strides().to_vec();

        let mut kept = Vec::new();
        let mut grid = HashMap::new();
        for tile in tiles {
            if tile.origin.len() != rank
                || std::iter::zip(&tile.origin, tile_shape).any(|(o, s)| o % s != 0)
            {
                return Err(LayoutError::illegal_state(format!(
                    "tile origin {:?} is not aligned to tile shape {tile_shape:?}",
                    tile.origin
                )));
            }
            let grid_indices = std::iter::zip(&tile.origin, tile_shape)
                .map(|(o, s)| o / s)
                .collect::<ArrayIndices>();
            if grid.contains_key(&grid_indices) {
                return Err(LayoutError::illegal_state(format!(
                    "duplicate tile at origin {:?}",
                    tile.origin
                )));
            }
            if Section::new_with_origin_shape(&tile.origin, tile_shape)?.intersects(&wanted)? {
                grid.insert(grid_indices, kept.len());
                kept.push(tile);
            }
        }

        let missing = if num_elements == 0 {
            vec![]
        } else {
            missing_tiles(&ranges, tile_shape, &grid)
        };

        // rank 0 visits a single empty coordinate
        let outer_shape = if num_elements == 0 {
            vec![0]
        } else if rank == 0 {
            vec![]
        } else {
            ranges[..rank - 1].iter().map(Range::len).collect()
        };

        Ok(Self {
            shape: ranges.iter().map(Range::len).collect(),
            ranges,
            tile_shape: tile_shape.to_vec(),
            tile_strides,
            tiles: kept,
            grid,
            missing,
            num_elements,
            outer: Odometer::new(outer_shape),
            inner_index: 0,
            dest_elem: 0,
            coords: vec![0; rank],
            grid_indices: vec![0; rank],
            pending: None,
        })
    }

    /// The tiles intersecting the wanted section.
    pub(crate) fn tiles(&self) -> &[TileEntry] {
        &self.tiles
    }

    /// The tile shape.
    pub(crate) fn tile_shape(&self) -> &[u64] {
        &self.tile_shape
    }

    /// The number of elements in one tile.
    pub(crate) fn tile_elements(&self) -> u64 {
        self.tile_shape.iter().product()
    }

    /// The origins of tiles that intersect the wanted section but are absent.
    pub(crate) fn missing_tiles(&self) -> &[ArrayIndices] {
        &self.missing
    }

    /// The shape of the wanted section.
    pub(crate) fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// The number of elements in the wanted section.
    pub(crate) fn num_elements(&self) -> u64 {
        self.num_elements
    }

    fn next_segment(&mut self) -> Option<TileSegment> {
        if self.outer.is_done() {
            return None;
        }
        let rank = self.ranges.len();
        if rank == 0 {
            self.outer.increment();
            self.dest_elem += 1;
            return Some(TileSegment {
                entry: self.grid.get(&self.grid_indices).copied(),
                dest_elem: 0,
                n_elems: 1,
                local_linear: 0,
                band: 0,
            });
        }

        let inner = self.ranges[rank - 1];
        for (coord, &position, range) in
            itertools::izip!(&mut self.coords, self.outer.current(), &self.ranges)
        {
            *coord = range.start() + position * range.stride();
        }
        let coord = inner.start() + self.inner_index * inner.stride();
        self.coords[rank - 1] = coord;

        let tile_size = self.tile_shape[rank - 1];
        let n_elems = if inner.stride() == 1 {
            let tile_end = (coord / tile_size + 1) * tile_size;
            (inner.len() - self.inner_index).min(tile_end - coord)
        } else {
            1
        };

        let mut local_linear = 0;
        for (grid_index, &coord, &size, &stride) in itertools::izip!(
            &mut self.grid_indices,
            &self.coords,
            &self.tile_shape,
            &self.tile_strides
        ) {
            *grid_index = coord / size;
            local_linear += (coord % size) * stride;
        }

        let segment = TileSegment {
            entry: self.grid.get(&self.grid_indices).copied(),
            dest_elem: self.dest_elem,
            n_elems,
            local_linear,
            band: self.coords[0],
        };

        self.dest_elem += n_elems;
        self.inner_index += n_elems;
        if self.inner_index >= inner.len() {
            self.inner_index = 0;
            self.outer.increment();
        }
        Some(segment)
    }
}

impl Iterator for TileWalk {
    type Item = TileSegment;

    fn next(&mut self) -> Option<TileSegment> {
        let mut segment = self.pending.take().or_else(|| self.next_segment())?;
        while let Some(next) = self.next_segment() {
            if next.entry == segment.entry
                && next.dest_elem == segment.dest_elem + segment.n_elems
                && next.local_linear == segment.local_linear + segment.n_elems
            {
                segment.n_elems += next.n_elems;
            } else {
                self.pending = Some(next);
                break;
            }
        }
        Some(segment)
    }
}

impl std::iter::FusedIterator for TileWalk {}

/// The indices of the tiles of `size` along one dimension that hold a member of `range`.
fn hit_tiles(range: &Range, size: u64) -> Vec<u64> {
    let (Some(first), Some(last)) = (range.first(), range.last()) else {
        return vec![];
    };
    if range.stride() < size {
        // every tile between the first and last member holds a member
        (first / size..=last / size).collect()
    } else {
        range.iter().map(|index| index / size).collect()
    }
}

/// Find the origins of tiles that intersect the wanted section but have no entry in `grid`.
///
/// Only tiles holding a wanted element are visited, so a sparse strided section costs no more than its elements.
fn missing_tiles(
    ranges: &[Range],
    tile_shape: &[u64],
    grid: &HashMap<ArrayIndices, usize>,
) -> Vec<ArrayIndices> {
    let hits: Vec<Vec<u64>> = std::iter::zip(ranges, tile_shape)
        .map(|(range, &size)| hit_tiles(range, size))
        .collect();
    if hits.is_empty() {
        // rank 0 has a single tile
        return if grid.contains_key(&ArrayIndices::new()) {
            vec![]
        } else {
            vec![ArrayIndices::new()]
        };
    }
    hits.into_iter()
        .multi_cartesian_product()
        .filter(|grid_indices| !grid.contains_key(grid_indices))
        .map(|grid_indices| {
            std::iter::zip(&grid_indices, tile_shape)
                .map(|(index, size)| index * size)
                .collect()
        })
        .collect()
}
