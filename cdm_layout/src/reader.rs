//! Chunk-driven transfers between storage and [`ArrayBytes`].

use cdm_section::InvalidRangeError;
use cdm_storage::{byte_range::ByteRange, ReadableStorageTraits, WritableStorageTraits};

use crate::{
    filter::InvalidBytesLengthError, global_config, layout::elements_to_bytes, ArrayBytes,
    ByteOrder, DataType, FillValue, Layout, LayoutBB, LayoutError,
};

fn check_element_size(data_type: DataType, element_size: usize) -> Result<(), LayoutError> {
    if data_type.size() == element_size {
        Ok(())
    } else {
        Err(LayoutError::IncompatibleElementType(data_type, element_size))
    }
}

/// Allocate the destination of a read, pre-filled with the fill value if there is one.
///
/// A sparse layout without an explicit fill value uses the default fill value of the data type.
fn allocate_destination(
    data_type: DataType,
    total_elements: u64,
    fill_value: Option<&FillValue>,
    is_sparse: bool,
) -> Result<Vec<u8>, LayoutError> {
    let len = elements_to_bytes(total_elements, data_type.size())
        .and_then(|len| usize::try_from(len).ok())
        .ok_or(InvalidRangeError::Overflow)?;
    let mut bytes = vec![0; len];
    match fill_value {
        Some(fill_value) => {
            fill_value.validate(data_type)?;
            fill_value.fill(&mut bytes);
        }
        None if is_sparse => data_type.default_fill_value().fill(&mut bytes),
        None => {}
    }
    Ok(bytes)
}

/// Return the byte range of `n_elems` elements at element `dest_elem` within a buffer of `len` bytes.
fn element_byte_range(
    len: usize,
    dest_elem: u64,
    n_elems: u64,
    element_size: usize,
) -> Result<std::ops::Range<usize>, LayoutError> {
    elements_to_bytes(dest_elem, element_size)
        .zip(elements_to_bytes(n_elems, element_size))
        .and_then(|(start, size)| {
            let start = usize::try_from(start).ok()?;
            let end = start.checked_add(usize::try_from(size).ok()?)?;
            (end <= len).then_some(start..end)
        })
        .ok_or_else(|| {
            LayoutError::illegal_state(format!(
                "chunk of {n_elems} elements at {dest_elem} exceeds the destination of {} elements",
                len / element_size.max(1)
            ))
        })
}

/// Read the section described by `layout` from `source`.
///
/// The destination is pre-filled with `fill_value` if given.
/// If the layout is [sparse](Layout::is_sparse) and no fill value is given, the default fill value of `data_type` is used.
/// Elements are converted from the stored `byte_order` to native order.
///
/// A chunk that runs past the end of `source` is an error, unless the layout tolerates a short read of the chunk and [`Config::tolerate_truncated_records`](crate::Config::tolerate_truncated_records) is enabled.
/// The available prefix of a tolerated chunk is copied and the remainder zero filled.
///
/// # Errors
/// Returns [`LayoutError`] if
///  - the element size of the layout does not match `data_type`,
///  - `fill_value` is incompatible with `data_type`, or
///  - there is an underlying storage error.
pub fn read_layout<TStorage: ?Sized + ReadableStorageTraits>(
    source: &TStorage,
    mut layout: impl Layout,
    data_type: DataType,
    byte_order: ByteOrder,
    fill_value: Option<&FillValue>,
) -> Result<ArrayBytes, LayoutError> {
    let element_size = layout.element_size();
    check_element_size(data_type, element_size)?;
    let shape = layout.shape().to_vec();
    let mut bytes = allocate_destination(
        data_type,
        layout.total_elements(),
        fill_value,
        layout.is_sparse(),
    )?;

    let source_size = source.size()?;
    let tolerate_truncated = global_config().tolerate_truncated_records();
    while let Some(chunk) = layout.next() {
        let range =
            element_byte_range(bytes.len(), chunk.dest_elem(), chunk.n_elems(), element_size)?;
        let dest = &mut bytes[range];
        let len = dest.len() as u64;
        let src_end = chunk.src_pos().saturating_add(len);
        if src_end > source_size && tolerate_truncated && layout.is_short_read_tolerated(&chunk)
        {
            let available = source_size.saturating_sub(chunk.src_pos()).min(len);
            let available_len = usize::try_from(available).unwrap_or(dest.len());
            if available > 0 {
                let data = source.get_byte_range(ByteRange::new_with_offset_length(
                    chunk.src_pos(),
                    available,
                ))?;
                dest[..available_len].copy_from_slice(&data);
            }
            dest[available_len..].fill(0);
            log::debug!(
                "truncated record read at byte {}: {available} of {len} bytes available, zero filled the remainder",
                chunk.src_pos()
            );
        } else {
            let data = source
                .get_byte_range(ByteRange::new_with_offset_length(chunk.src_pos(), len))?;
            dest.copy_from_slice(&data);
        }
        byte_order.swap_in_place(dest, element_size);
    }

    Ok(ArrayBytes::new(data_type, shape, bytes)?)
}

/// Read the section described by a layout of decoded tiles.
///
/// Fill value and byte order handling is as in [`read_layout`].
///
/// # Errors
/// Returns [`LayoutError`] if
///  - the element size of the layout does not match `data_type`,
///  - `fill_value` is incompatible with `data_type`,
///  - a chunk references elements beyond its decoded tile, or
///  - a tile could not be retrieved or decoded.
pub fn read_layout_bb(
    layout: impl LayoutBB,
    data_type: DataType,
    byte_order: ByteOrder,
    fill_value: Option<&FillValue>,
) -> Result<ArrayBytes, LayoutError> {
    let element_size = layout.element_size();
    check_element_size(data_type, element_size)?;
    let shape = layout.shape().to_vec();
    let mut bytes = allocate_destination(
        data_type,
        layout.total_elements(),
        fill_value,
        layout.is_sparse(),
    )?;

    for chunk in layout {
        let chunk = chunk?;
        let range =
            element_byte_range(bytes.len(), chunk.dest_elem(), chunk.n_elems(), element_size)?;
        let dest = &mut bytes[range];
        let src_start = usize::try_from(chunk.src_elem())
            .ok()
            .and_then(|src_elem| src_elem.checked_mul(element_size));
        let src = src_start
            .and_then(|start| chunk.data().get(start..start.checked_add(dest.len())?))
            .ok_or_else(|| {
                InvalidBytesLengthError::new(
                    chunk.data().len(),
                    src_start.map_or(usize::MAX, |start| start.saturating_add(dest.len())),
                )
            })?;
        dest.copy_from_slice(src);
        byte_order.swap_in_place(dest, element_size);
    }

    Ok(ArrayBytes::new(data_type, shape, bytes)?)
}

/// Write `array_bytes` to the section of `sink` described by `layout`.
///
/// Elements are converted from native order to the stored `byte_order`.
/// Only stored regions can be written, so sparse layouts are rejected.
///
/// # Errors
/// Returns [`LayoutError`] if
///  - the data type of `array_bytes` does not match the element size of the layout,
///  - the length of `array_bytes` does not match the layout,
///  - the layout is sparse, or
///  - there is an underlying storage error.
pub fn write_layout<TStorage: ?Sized + WritableStorageTraits>(
    sink: &TStorage,
    layout: impl Layout,
    array_bytes: &ArrayBytes,
    byte_order: ByteOrder,
) -> Result<(), LayoutError> {
    let element_size = layout.element_size();
    check_element_size(array_bytes.data_type(), element_size)?;
    if layout.is_sparse() {
        return Err(LayoutError::illegal_state(
            "cannot write a layout with missing tiles",
        ));
    }
    let expected_len = elements_to_bytes(layout.total_elements(), element_size)
        .and_then(|len| usize::try_from(len).ok())
        .ok_or(InvalidRangeError::Overflow)?;
    if array_bytes.bytes().len() != expected_len {
        return Err(InvalidBytesLengthError::new(array_bytes.bytes().len(), expected_len).into());
    }

    let mut bytes = array_bytes.bytes().to_vec();
    byte_order.swap_in_place(&mut bytes, element_size);
    for chunk in layout {
        let range =
            element_byte_range(bytes.len(), chunk.dest_elem(), chunk.n_elems(), element_size)?;
        sink.set_partial(chunk.src_pos(), &bytes[range])?;
    }
    sink.flush()?;
    Ok(())
}
