//! Tile filters.
//!
//! A filtered tile is stored as a byte run produced by applying a pipeline of filters (compression, byte shuffling, checksums) to the raw tile bytes.
//! A [`FilterPipeline`] reverses that process, applying filters in reverse definition order and skipping those excluded by the per-tile filter mask.
//!
//! Filters are identified by their HDF5 filter identifiers:
//! - `1`: [`DeflateFilter`] (requires the `deflate` feature, enabled by default)
//! - `2`: [`ShuffleFilter`]
//! - `3`: [`Fletcher32Filter`]
//! - `307`: [`Bzip2Filter`] (requires the `bz2` feature)

#[cfg(feature = "bz2")]
mod bz2;
#[cfg(feature = "deflate")]
mod deflate;
mod fletcher32;
mod shuffle;

#[cfg(feature = "bz2")]
pub use bz2::Bzip2Filter;
#[cfg(feature = "deflate")]
pub use deflate::DeflateFilter;
pub use fletcher32::Fletcher32Filter;
pub use shuffle::ShuffleFilter;

use std::sync::Arc;

use derive_more::Display;
use thiserror::Error;

/// The HDF5 identifier of the deflate filter.
pub const FILTER_DEFLATE: u16 = 1;
/// The HDF5 identifier of the shuffle filter.
pub const FILTER_SHUFFLE: u16 = 2;
/// The HDF5 identifier of the fletcher32 filter.
pub const FILTER_FLETCHER32: u16 = 3;
/// The registered HDF5 identifier of the bzip2 filter.
pub const FILTER_BZIP2: u16 = 307;

/// An error indicating the length of bytes does not match the expected length.
#[derive(Copy, Clone, Debug, Display, Error, PartialEq, Eq)]
#[display("Invalid bytes len {len}, expected {expected_len}")]
pub struct InvalidBytesLengthError {
    /// The actual length.
    pub len: usize,
    /// The expected length.
    pub expected_len: usize,
}

impl InvalidBytesLengthError {
    /// Create a new [`InvalidBytesLengthError`].
    #[must_use]
    pub fn new(len: usize, expected_len: usize) -> Self {
        Self { len, expected_len }
    }
}

/// A codec error.
#[derive(Clone, Debug, Error)]
pub enum CodecError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] Arc<std::io::Error>),
    /// The decoded size of a tile did not match what was expected.
    #[error("the size of a decoded tile is {}, expected {}", _0.len, _0.expected_len)]
    UnexpectedDecodedSize(#[from] InvalidBytesLengthError),
    /// An embedded checksum does not match the decoded value.
    #[error("the checksum is invalid")]
    InvalidChecksum,
    /// The filter identifier is not supported.
    #[error("unsupported filter {0}")]
    UnsupportedFilter(u16),
    /// Other
    #[error("{_0}")]
    Other(String),
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(Arc::new(err))
    }
}

impl From<&str> for CodecError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for CodecError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// Traits for a tile filter.
pub trait TileFilter: Send + Sync + core::fmt::Debug {
    /// The HDF5 filter identifier.
    fn id(&self) -> u16;

    /// Encode raw bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if the input is not valid for the filter.
    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError>;

    /// Decode encoded bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if the encoded bytes are corrupt.
    fn decode(&self, encoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError>;
}

/// An ordered sequence of tile filters.
///
/// Filters are listed in the order they are applied when encoding.
#[derive(Clone, Debug, Default)]
pub struct FilterPipeline {
    filters: Vec<Arc<dyn TileFilter>>,
}

impl FilterPipeline {
    /// Create a new filter pipeline.
    #[must_use]
    pub fn new(filters: Vec<Arc<dyn TileFilter>>) -> Self {
        Self { filters }
    }

    /// Create a filter pipeline from HDF5 filter identifiers.
    ///
    /// `element_size` parameterises the shuffle filter.
    ///
    /// # Errors
    /// Returns [`CodecError::UnsupportedFilter`] if an identifier is unknown or its feature is disabled.
    pub fn new_with_filter_ids(ids: &[u16], element_size: usize) -> Result<Self, CodecError> {
        let filters = ids
            .iter()
            .map(|&id| -> Result<Arc<dyn TileFilter>, CodecError> {
                match id {
                    #[cfg(feature = "deflate")]
                    FILTER_DEFLATE => Ok(Arc::new(DeflateFilter::default())),
                    FILTER_SHUFFLE => Ok(Arc::new(ShuffleFilter::new(element_size))),
                    FILTER_FLETCHER32 => Ok(Arc::new(Fletcher32Filter)),
                    #[cfg(feature = "bz2")]
                    FILTER_BZIP2 => Ok(Arc::new(Bzip2Filter::default())),
                    _ => Err(CodecError::UnsupportedFilter(id)),
                }
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { filters })
    }

    /// The filters in encoding order.
    #[must_use]
    pub fn filters(&self) -> &[Arc<dyn TileFilter>] {
        &self.filters
    }

    /// Returns true if the pipeline has no filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Decode a stored tile byte run.
    ///
    /// Filters are applied in reverse order.
    /// Filter `i` is skipped if bit `i` of `filter_mask` is set.
    ///
    /// # Errors
    /// Returns [`CodecError`] if any filter fails.
    pub fn decode(&self, encoded_value: Vec<u8>, filter_mask: u32) -> Result<Vec<u8>, CodecError> {
        let mut bytes = encoded_value;
        for (i, filter) in self.filters.iter().enumerate().rev() {
            if !is_masked(filter_mask, i) {
                bytes = filter.decode(bytes)?;
            }
        }
        Ok(bytes)
    }

    /// Encode raw tile bytes.
    ///
    /// Filters are applied in order.
    /// Filter `i` is skipped if bit `i` of `filter_mask` is set.
    ///
    /// # Errors
    /// Returns [`CodecError`] if any filter fails.
    pub fn encode(&self, decoded_value: Vec<u8>, filter_mask: u32) -> Result<Vec<u8>, CodecError> {
        let mut bytes = decoded_value;
        for (i, filter) in self.filters.iter().enumerate() {
            if !is_masked(filter_mask, i) {
                bytes = filter.encode(bytes)?;
            }
        }
        Ok(bytes)
    }
}

fn is_masked(filter_mask: u32, index: usize) -> bool {
    u32::try_from(index)
        .ok()
        .and_then(|index| filter_mask.checked_shr(index))
        .is_some_and(|bits| bits & 1 == 1)
}
