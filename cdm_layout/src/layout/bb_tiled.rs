use std::{num::NonZeroUsize, sync::Arc};

use cdm_section::{ArrayIndices, InvalidRangeError, Section};
use cdm_storage::{byte_range::ByteRange, Bytes, ReadableStorageTraits};
use itertools::Itertools;
use lru::LruCache;

use super::{
    elements_to_bytes,
    tile_walk::{TileEntry, TileLocation, TileWalk},
    LayoutBB,
};
use crate::{
    filter::InvalidBytesLengthError, global_config, ChunkBB, CodecError, FilterPipeline,
    LayoutError,
};

/// A layout of a variable stored as independently placed filtered tiles.
///
/// The wanted section is walked in destination order as in [`LayoutTiled`](crate::LayoutTiled).
/// The first chunk touching a tile reads its stored bytes and decodes them with the [`FilterPipeline`].
/// Decoded tiles are held until the walk passes their last row, so each tile is decoded once.
/// The cache holds at least every intersecting tile of the widest row band, and at least [`Config::decoded_tile_cache_limit`](crate::Config::decoded_tile_cache_limit) tiles.
///
/// [`Raw`](TileLocation::Raw) tiles are read without decoding.
pub struct LayoutBBTiled<TStorage: ?Sized + ReadableStorageTraits> {
    storage: Arc<TStorage>,
    pipeline: FilterPipeline,
    walk: TileWalk,
    element_size: usize,
    tile_bytes: usize,
    cache: LruCache<usize, Bytes>,
    band: Option<u64>,
    failed: bool,
}

impl<TStorage: ?Sized + ReadableStorageTraits> LayoutBBTiled<TStorage> {
    /// Create a new filtered tiled layout of the `wanted` section of a variable of `var_shape` stored in `tiles` of `tile_shape`.
    ///
    /// # Errors
    /// Returns [`LayoutError::InvalidRange`] if `wanted` is incompatible with `var_shape` or the size of a tile overflows.
    /// Returns [`LayoutError::IllegalState`] if a tile is misaligned or duplicated, or the tile shape is invalid.
    pub fn new(
        storage: Arc<TStorage>,
        pipeline: FilterPipeline,
        tiles: impl IntoIterator<Item = TileEntry>,
        var_shape: &[u64],
        tile_shape: &[u64],
        element_size: usize,
        wanted: &Section,
    ) -> Result<Self, LayoutError> {
        let walk = TileWalk::new(tiles, var_shape, tile_shape, wanted)?;
        let tile_bytes = elements_to_bytes(walk.tile_elements(), element_size)
            .and_then(|bytes| usize::try_from(bytes).ok())
            .ok_or(InvalidRangeError::Overflow)?;
        // every tile of a row band is revisited on each of its rows
        let widest_band = walk
            .tiles()
            .iter()
            .counts_by(|tile| tile.origin().first().copied())
            .into_values()
            .max()
            .unwrap_or(1);
        let cache_limit =
            NonZeroUsize::new(global_config().decoded_tile_cache_limit().max(widest_band))
                .unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            storage,
            pipeline,
            walk,
            element_size,
            tile_bytes,
            cache: LruCache::new(cache_limit),
            band: None,
            failed: false,
        })
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

    /// Release decoded tiles that end before row `band` of the outermost dimension.
    fn evict_passed(&mut self, band: u64) {
        let Some(&tile_rows) = self.walk.tile_shape().first() else {
            return;
        };
        let tiles = self.walk.tiles();
        let passed: Vec<usize> = self
            .cache
            .iter()
            .map(|(&entry, _)| entry)
            .filter(|&entry| tiles[entry].origin()[0] + tile_rows <= band)
            .collect();
        for entry in passed {
            self.cache.pop(&entry);
        }
    }

    fn retrieve_tile(&mut self, entry: usize) -> Result<Bytes, LayoutError> {
        if let Some(data) = self.cache.get(&entry) {
            return Ok(data.clone());
        }
        let tile = &self.walk.tiles()[entry];
        let data = match *tile.location() {
            TileLocation::Raw { offset } => self
                .storage
                .get_byte_range(ByteRange::new_with_offset_length(
                    offset,
                    self.tile_bytes as u64,
                ))?,
            TileLocation::Filtered {
                offset,
                size,
                filter_mask,
            } => {
                let encoded = self
                    .storage
                    .get_byte_range(ByteRange::new_with_offset_length(offset, size))?;
                let decoded = self.pipeline.decode(encoded.to_vec(), filter_mask)?;
                log::debug!(
                    "decoded tile at origin {:?} from {size} to {} bytes",
                    tile.origin(),
                    decoded.len()
                );
                Bytes::from(decoded)
            }
        };
        if data.len() != self.tile_bytes {
            return Err(CodecError::UnexpectedDecodedSize(InvalidBytesLengthError::new(
                data.len(),
                self.tile_bytes,
            ))
            .into());
        }
        self.cache.put(entry, data.clone());
        Ok(data)
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> Iterator for LayoutBBTiled<TStorage> {
    type Item = Result<ChunkBB, LayoutError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let segment = self.walk.next()?;
            let Some(entry) = segment.entry else {
                continue;
            };
            if self.band != Some(segment.band) {
                self.evict_passed(segment.band);
                self.band = Some(segment.band);
            }
            return match self.retrieve_tile(entry) {
                Ok(data) => Some(Ok(ChunkBB::new(
                    data,
                    segment.local_linear,
                    segment.dest_elem,
                    segment.n_elems,
                ))),
                Err(err) => {
                    self.failed = true;
                    Some(Err(err))
                }
            };
        }
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> std::iter::FusedIterator
    for LayoutBBTiled<TStorage>
{
}

impl<TStorage: ?Sized + ReadableStorageTraits> LayoutBB for LayoutBBTiled<TStorage> {
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
    use std::sync::atomic::{AtomicUsize, Ordering};

    use cdm_storage::store::MemoryStore;
    use serial_test::serial;

    use super::*;
    use crate::{
        filter::{FILTER_FLETCHER32, FILTER_SHUFFLE},
        TileFilter,
        global_config_mut,
        layout::tests::assert_destination_order,
    };

    /// Store an 8x8 `u16` variable (element `r * 8 + c`) as 4x4 tiles encoded by `pipeline`.
    fn store_tiles(pipeline: &FilterPipeline) -> (Arc<MemoryStore>, Vec<TileEntry>) {
        let mut bytes = Vec::new();
        let mut tiles = Vec::new();
        for (tile_r, tile_c) in [(0u64, 0u64), (0, 4), (4, 0), (4, 4)] {
            let decoded = (0..16u64)
                .flat_map(|i| {
                    let value = (tile_r + i / 4) * 8 + tile_c + i % 4;
                    u16::try_from(value).unwrap().to_ne_bytes()
                })
                .collect_vec();
            let encoded = if pipeline.is_empty() {
                decoded
            } else {
                pipeline.encode(decoded, 0).unwrap()
            };
            let offset = bytes.len() as u64;
            tiles.push(if pipeline.is_empty() {
                TileEntry::new_raw(vec![tile_r, tile_c], offset)
            } else {
                TileEntry::new_filtered(vec![tile_r, tile_c], offset, encoded.len() as u64, 0)
            });
            bytes.extend(encoded);
        }
        (Arc::new(MemoryStore::from(bytes)), tiles)
    }

    fn assemble(
        layout: impl LayoutBB,
        total: usize,
    ) -> Result<Vec<u16>, LayoutError> {
        let mut out = vec![u16::MAX; total];
        let mut chunks = Vec::new();
        for chunk in layout {
            let chunk = chunk?;
            let src = usize::try_from(chunk.src_elem()).unwrap();
            let dest = usize::try_from(chunk.dest_elem()).unwrap();
            let n = usize::try_from(chunk.n_elems()).unwrap();
            for i in 0..n {
                let bytes = &chunk.data()[(src + i) * 2..(src + i + 1) * 2];
                out[dest + i] = u16::from_ne_bytes([bytes[0], bytes[1]]);
            }
            chunks.push((chunk.dest_elem(), chunk.n_elems()));
        }
        assert_destination_order(chunks, total as u64);
        Ok(out)
    }

    #[test]
    #[serial]
    fn layout_bb_tiled_raw() {
        let (store, tiles) = store_tiles(&FilterPipeline::default());
        let wanted: Section = "2:5,3:6".parse().unwrap();
        let layout = LayoutBBTiled::new(
            store,
            FilterPipeline::default(),
            tiles,
            &[8, 8],
            &[4, 4],
            2,
            &wanted,
        )
        .unwrap();
        assert_eq!(layout.total_elements(), 16);
        assert_eq!(layout.shape(), &[4u64, 4]);
        assert_eq!(layout.tiles().len(), 4);
        let expected = (2..=5u16)
            .flat_map(|r| (3..=6u16).map(move |c| r * 8 + c))
            .collect_vec();
        assert_eq!(assemble(layout, 16).unwrap(), expected);
    }

    #[test]
    #[serial]
    fn layout_bb_tiled_filtered() {
        let pipeline =
            FilterPipeline::new_with_filter_ids(&[FILTER_SHUFFLE, FILTER_FLETCHER32], 2).unwrap();
        let (store, tiles) = store_tiles(&pipeline);
        let layout = LayoutBBTiled::new(
            store,
            pipeline,
            tiles,
            &[8, 8],
            &[4, 4],
            2,
            &Section::new_unfilled(2),
        )
        .unwrap();
        assert!(!layout.is_sparse());
        assert_eq!(assemble(layout, 64).unwrap(), (0..64u16).collect_vec());
    }

    #[test]
    #[serial]
    fn layout_bb_tiled_missing() {
        let (store, mut tiles) = store_tiles(&FilterPipeline::default());
        tiles.remove(0);
        let layout = LayoutBBTiled::new(
            store,
            FilterPipeline::default(),
            tiles,
            &[8, 8],
            &[4, 4],
            2,
            &"3:4,3:4".parse().unwrap(),
        )
        .unwrap();
        assert!(layout.is_sparse());
        assert_eq!(layout.missing_tiles().to_vec(), vec![vec![0u64, 0]]);
        let chunks = layout.map(Result::unwrap).collect_vec();
        assert_eq!(
            chunks.iter().map(|c| (c.dest_elem(), c.n_elems())).collect_vec(),
            vec![(1, 1), (2, 1), (3, 1)]
        );
    }

    #[test]
    #[serial]
    fn layout_bb_tiled_eviction() {
        global_config_mut().set_decoded_tile_cache_limit(0);
        let (store, tiles) = store_tiles(&FilterPipeline::default());
        let layout = LayoutBBTiled::new(
            store.clone(),
            FilterPipeline::default(),
            tiles.clone(),
            &[8, 8],
            &[4, 4],
            2,
            &Section::new_unfilled(2),
        );
        global_config_mut().set_decoded_tile_cache_limit(64);
        let layout = layout.unwrap();
        // never below the widest row band
        assert_eq!(layout.cache.cap().get(), 2);
        assert_eq!(assemble(layout, 64).unwrap(), (0..64u16).collect_vec());

        let mut layout = LayoutBBTiled::new(
            store,
            FilterPipeline::default(),
            tiles,
            &[8, 8],
            &[4, 4],
            2,
            &Section::new_unfilled(2),
        )
        .unwrap();
        // first row band holds both top tiles
        for _ in 0..8 {
            layout.next().unwrap().unwrap();
        }
        assert_eq!(layout.cache.len(), 2);
        layout.next().unwrap().unwrap();
        assert_eq!(layout.cache.len(), 1);
        assert!(layout.cache.contains(&2));
    }

    #[test]
    #[serial]
    fn layout_bb_tiled_decoded_size() {
        let pipeline = FilterPipeline::new_with_filter_ids(&[FILTER_FLETCHER32], 2).unwrap();
        let encoded = pipeline.encode(vec![0; 30], 0).unwrap();
        let store = Arc::new(MemoryStore::from(encoded.clone()));
        let tiles = vec![TileEntry::new_filtered(vec![0, 0], 0, encoded.len() as u64, 0)];
        let mut layout = LayoutBBTiled::new(
            store,
            pipeline,
            tiles,
            &[4, 4],
            &[4, 4],
            2,
            &Section::new_unfilled(2),
        )
        .unwrap();
        assert!(matches!(
            layout.next(),
            Some(Err(LayoutError::CodecError(
                CodecError::UnexpectedDecodedSize(_)
            )))
        ));
        assert!(layout.next().is_none());
    }

    #[test]
    #[serial]
    fn layout_bb_tiled_storage_error() {
        let store = Arc::new(MemoryStore::from(vec![0u8; 8]));
        let tiles = vec![TileEntry::new_raw(vec![0], 4)];
        let mut layout = LayoutBBTiled::new(
            store,
            FilterPipeline::default(),
            tiles,
            &[4],
            &[4],
            2,
            &Section::new_unfilled(1),
        )
        .unwrap();
        assert!(matches!(
            layout.next(),
            Some(Err(LayoutError::StorageError(_)))
        ));
    }

    /// A pass through filter counting its decodes.
    #[derive(Debug, Default)]
    struct CountingFilter {
        decodes: AtomicUsize,
    }

    impl TileFilter for CountingFilter {
        fn id(&self) -> u16 {
            u16::MAX
        }

        fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
            Ok(decoded_value)
        }

        fn decode(&self, encoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
            self.decodes.fetch_add(1, Ordering::Relaxed);
            Ok(encoded_value)
        }
    }

    #[test]
    #[serial]
    fn layout_bb_tiled_band_wider_than_limit() {
        // a 4x400 variable of 4x4 tiles, 100 tiles in a single band
        let filter = Arc::new(CountingFilter::default());
        let pipeline = FilterPipeline::new(vec![filter.clone() as Arc<dyn TileFilter>]);
        let tiles = (0..100u64)
            .map(|i| TileEntry::new_filtered(vec![0, i * 4], i * 16, 16, 0))
            .collect_vec();
        let bytes = (0..100u8)
            .flat_map(|tile| std::iter::repeat_n(tile, 16))
            .collect_vec();
        let layout = LayoutBBTiled::new(
            Arc::new(MemoryStore::from(bytes)),
            pipeline,
            tiles,
            &[4, 400],
            &[4, 4],
            1,
            &Section::new_unfilled(2),
        )
        .unwrap();
        assert!(layout.cache.cap().get() >= 100);

        let mut n_elems = 0;
        for chunk in layout {
            let chunk = chunk.unwrap();
            let tile = u8::try_from(chunk.dest_elem() % 400 / 4).unwrap();
            assert!(chunk.data().iter().all(|&value| value == tile));
            n_elems += chunk.n_elems();
        }
        assert_eq!(n_elems, 1600);
        assert_eq!(filter.decodes.load(Ordering::Relaxed), 100);
    }
}
