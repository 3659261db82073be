//! `cdm_layout` maps array sections of netCDF/HDF variables onto their physical storage.
//!
//! Given the placement of a variable in a file (a contiguous block, a record-segmented block, or a set of independently placed tiles) and a *wanted* [`Section`](cdm_section::Section), a [`Layout`] produces the ordered sequence of contiguous transfers ([`Chunk`]s) that move the section between the file and a buffer.
//! Chunks are produced lazily in destination order, and adjacent elements are collapsed into as few transfers as the storage allows.
//!
//! The layouts are format independent:
//!  - [`LayoutRegular`]: a single contiguous data block (netCDF-3 fixed variables, HDF5 contiguous datasets).
//!  - [`LayoutRegularSegmented`]: a block where each index of the outermost dimension is a record at a fixed stride (netCDF-3 record variables).
//!  - [`LayoutTiled`]: uncompressed tiles at arbitrary file positions (HDF4 chunks, uncompressed HDF5 chunks).
//!  - [`LayoutBBTiled`]: filtered tiles, decoded through a [`FilterPipeline`] as the walk reaches them (compressed HDF5 chunks).
//!
//! [`read_layout`] and [`read_layout_bb`] pull the chunks of a layout into [`ArrayBytes`], applying fill values and byte order conversion.
//! [`write_layout`] is the symmetric positioned write.
//!
//! ## Example
//! ```rust
//! # use std::sync::Arc;
//! use cdm_layout::{read_layout, ByteOrder, DataType, LayoutRegular};
//! use cdm_section::Section;
//! use cdm_storage::store::MemoryStore;
//!
//! // a 3x4 big endian short variable stored after a 16 byte header
//! let mut bytes = vec![0u8; 16];
//! bytes.extend((0..12i16).flat_map(i16::to_be_bytes));
//! let store = Arc::new(MemoryStore::from(bytes));
//!
//! let wanted: Section = "1:2,1:3:2".parse()?;
//! let layout = LayoutRegular::new(16, 2, &[3, 4], &wanted)?;
//! let array_bytes = read_layout(&*store, layout, DataType::Short, ByteOrder::Big, None)?;
//! assert_eq!(array_bytes.shape(), &[2u64, 2]);
//! assert_eq!(array_bytes.as_elements::<i16>()?, vec![5, 7, 9, 11]);
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Logging
//! `cdm_layout` logs information and warnings using the [`log`] crate.
//! A logging implementation must be enabled to capture logs.
//! See the [`log`] crate documentation for more details.
//!
//! ## Crate Features
//! #### Default
//!  - `deflate`: the deflate (zlib) tile filter.
//!
//! #### Non-Default
//!  - `bz2`: the bzip2 tile filter.
//!
//! ## Licence
//! `cdm_layout` is licensed under either of
//!  - the Apache License, Version 2.0 or <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license or <http://opensource.org/licenses/MIT>, at your option.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(clippy::wildcard_enum_match_arm)]

mod array_bytes;
mod chunk;
pub mod config;
mod data_type;
mod fill_value;
pub mod filter;
mod layout;
mod layout_errors;
mod reader;

pub use array_bytes::ArrayBytes;
pub use chunk::{Chunk, ChunkBB};
pub use config::{global_config, global_config_mut, Config};
pub use data_type::{ByteOrder, DataType};
pub use fill_value::{FillValue, InvalidFillValueError};
pub use filter::{CodecError, FilterPipeline, TileFilter};
pub use layout::{
    Layout, LayoutBB, LayoutBBTiled, LayoutRegular, LayoutRegularSegmented, LayoutTiled,
    TileEntry, TileLocation,
};
pub use layout_errors::LayoutError;
pub use reader::{read_layout, read_layout_bb, write_layout};

pub use cdm_section as section;
pub use cdm_storage as storage;
