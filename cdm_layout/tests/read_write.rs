#![allow(missing_docs)]

use cdm_layout::{
    read_layout, write_layout, ArrayBytes, ByteOrder, DataType, FillValue, LayoutError,
    LayoutRegular, LayoutRegularSegmented, LayoutTiled, TileEntry,
};
use cdm_section::Section;
use cdm_storage::store::{FileStore, MemoryStore};
use itertools::Itertools;

#[test]
fn write_read_regular() {
    let store = MemoryStore::from(vec![0xFF; 8]);
    let wanted = Section::new_unfilled(2);
    let array_bytes =
        ArrayBytes::from_elements(DataType::Short, vec![2, 3], &[1i16, 2, 3, 4, 5, -1]).unwrap();
    let layout = LayoutRegular::new(8, 2, &[2, 3], &wanted).unwrap();
    write_layout(&store, layout, &array_bytes, ByteOrder::Big).unwrap();

    let stored = store.to_vec();
    assert_eq!(stored.len(), 20);
    assert_eq!(&stored[..8], &[0xFF; 8]);
    assert_eq!(&stored[8..], &[0, 1, 0, 2, 0, 3, 0, 4, 0, 5, 0xFF, 0xFF]);

    let layout = LayoutRegular::new(8, 2, &[2, 3], &wanted).unwrap();
    let read = read_layout(&store, layout, DataType::Short, ByteOrder::Big, None).unwrap();
    assert_eq!(read, array_bytes);
}

#[test]
fn write_read_partial() {
    let store = MemoryStore::from(vec![0; 4 * 16]);
    let wanted: Section = "1:2,0:3:3".parse().unwrap();
    let array_bytes =
        ArrayBytes::from_elements(DataType::Float, vec![2, 2], &[1.0f32, 2.0, 3.0, 4.0]).unwrap();
    let layout = LayoutRegular::new(0, 4, &[4, 4], &wanted).unwrap();
    write_layout(&store, layout, &array_bytes, ByteOrder::Little).unwrap();

    let layout = LayoutRegular::new(0, 4, &[4, 4], &Section::new_unfilled(2)).unwrap();
    let full = read_layout(&store, layout, DataType::Float, ByteOrder::Little, None).unwrap();
    let mut expected = vec![0.0f32; 16];
    expected[4] = 1.0;
    expected[7] = 2.0;
    expected[8] = 3.0;
    expected[11] = 4.0;
    assert_eq!(full.as_elements::<f32>().unwrap(), expected);

    let layout = LayoutRegular::new(0, 4, &[4, 4], &wanted).unwrap();
    let read = read_layout(&store, layout, DataType::Float, ByteOrder::Little, None).unwrap();
    assert_eq!(read, array_bytes);
}

#[test]
fn write_read_segmented() {
    let store = MemoryStore::new();
    let array_bytes =
        ArrayBytes::from_elements(DataType::Int, vec![3, 2], &[10i32, 11, 20, 21, 30, 31])
            .unwrap();
    let wanted = Section::new_unfilled(2);
    let layout = LayoutRegularSegmented::new(4, 4, 12, &[3, 2], &wanted).unwrap();
    write_layout(&store, layout, &array_bytes, ByteOrder::Big).unwrap();

    // records at 4, 16 and 28 with the gaps left zero
    let stored = store.to_vec();
    assert_eq!(stored.len(), 36);
    assert_eq!(&stored[16..24], &[0, 0, 0, 20, 0, 0, 0, 21]);
    assert_eq!(&stored[24..28], &[0; 4]);

    let layout = LayoutRegularSegmented::new(4, 4, 12, &[3, 2], &wanted).unwrap();
    let read = read_layout(&store, layout, DataType::Int, ByteOrder::Big, None).unwrap();
    assert_eq!(read, array_bytes);
}

#[test]
fn write_read_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.nc");
    let array_bytes = ArrayBytes::from_elements(
        DataType::Double,
        vec![3, 3],
        &(0..9i32).map(f64::from).collect_vec(),
    )
    .unwrap();
    let wanted = Section::new_unfilled(2);
    {
        let store = FileStore::open_read_write(&path).unwrap();
        let layout = LayoutRegular::new(32, 8, &[3, 3], &wanted).unwrap();
        write_layout(&store, layout, &array_bytes, ByteOrder::Big).unwrap();
    }

    let store = FileStore::open(&path).unwrap();
    assert!(store.is_read_only());
    let layout = LayoutRegular::new(32, 8, &[3, 3], &"0:2,1".parse().unwrap()).unwrap();
    let read = read_layout(&store, layout, DataType::Double, ByteOrder::Big, None).unwrap();
    assert_eq!(read.shape(), &[3u64, 1]);
    assert_eq!(read.as_elements::<f64>().unwrap(), vec![1.0, 4.0, 7.0]);
}

#[test]
fn write_rejects_sparse_layout() {
    let store = MemoryStore::new();
    let tiles = [TileEntry::new_raw(vec![0], 0)];
    let layout = LayoutTiled::new(tiles, &[4], &[2], 1, &Section::new_unfilled(1)).unwrap();
    let array_bytes = ArrayBytes::from_elements(DataType::UByte, vec![4], &[1u8, 2, 3, 4]).unwrap();
    assert!(matches!(
        write_layout(&store, layout, &array_bytes, ByteOrder::Big),
        Err(LayoutError::IllegalState(_))
    ));
    assert!(store.to_vec().is_empty());
}

#[test]
fn write_rejects_length_mismatch() {
    let store = MemoryStore::new();
    let layout = LayoutRegular::new(0, 1, &[4], &"0:2".parse().unwrap()).unwrap();
    let array_bytes = ArrayBytes::from_elements(DataType::Byte, vec![4], &[1i8, 2, 3, 4]).unwrap();
    assert!(matches!(
        write_layout(&store, layout, &array_bytes, ByteOrder::Big),
        Err(LayoutError::InvalidBytesLength(_))
    ));
}

#[test]
fn read_incompatible_element_type() {
    let store = MemoryStore::from(vec![0; 16]);
    let layout = LayoutRegular::new(0, 4, &[4], &Section::new_unfilled(1)).unwrap();
    assert!(matches!(
        read_layout(&store, layout, DataType::Double, ByteOrder::Big, None),
        Err(LayoutError::IncompatibleElementType(DataType::Double, 4))
    ));
}

#[test]
fn read_invalid_fill_value() {
    let store = MemoryStore::from(vec![0; 16]);
    let layout = LayoutRegular::new(0, 4, &[4], &Section::new_unfilled(1)).unwrap();
    let fill_value = FillValue::from(0i16);
    assert!(matches!(
        read_layout(&store, layout, DataType::Int, ByteOrder::Big, Some(&fill_value)),
        Err(LayoutError::InvalidFillValue(_))
    ));
}

#[cfg(feature = "deflate")]
mod deflate {
    use std::sync::Arc;

    use cdm_layout::{
        filter::{FILTER_DEFLATE, FILTER_SHUFFLE},
        read_layout_bb, FilterPipeline, LayoutBBTiled,
    };

    use super::*;

    #[test]
    fn read_deflate_shuffle_tiles() {
        // a 4x6 int variable in 2x3 tiles, the tile at [2, 3] stored without filters
        let var_shape = [4u64, 6];
        let tile_shape = [2u64, 3];
        let pipeline =
            FilterPipeline::new_with_filter_ids(&[FILTER_SHUFFLE, FILTER_DEFLATE], 4).unwrap();
        let mut bytes = Vec::new();
        let mut tiles = Vec::new();
        for origin in [[0u64, 0], [0, 3], [2, 0], [2, 3]] {
            let tile = (0..2)
                .flat_map(|r| (0..3).map(move |c| (origin[0] + r) * 6 + origin[1] + c))
                .flat_map(|value| i32::try_from(value).unwrap().to_be_bytes())
                .collect_vec();
            let filter_mask = if origin == [2, 3] { 0b11 } else { 0 };
            let encoded = pipeline.encode(tile, filter_mask).unwrap();
            tiles.push(TileEntry::new_filtered(
                origin.to_vec(),
                bytes.len() as u64,
                encoded.len() as u64,
                filter_mask,
            ));
            bytes.extend(encoded);
        }
        let store = Arc::new(MemoryStore::from(bytes));

        let wanted: Section = "1:3,2:4".parse().unwrap();
        let layout = LayoutBBTiled::new(
            store,
            pipeline,
            tiles,
            &var_shape,
            &tile_shape,
            4,
            &wanted,
        )
        .unwrap();
        let read = read_layout_bb(layout, DataType::Int, ByteOrder::Big, None).unwrap();
        assert_eq!(read.shape(), &[3u64, 3]);
        assert_eq!(
            read.as_elements::<i32>().unwrap(),
            vec![8, 9, 10, 14, 15, 16, 20, 21, 22]
        );
    }
}
