use cdm_section::InvalidRangeError;
use cdm_storage::StorageError;
use thiserror::Error;

use crate::{filter::InvalidBytesLengthError, CodecError, DataType, InvalidFillValueError};

/// A layout error.
///
/// Raised while constructing a layout, walking it, or transferring its chunks.
#[derive(Clone, Debug, Error)]
pub enum LayoutError {
    /// The wanted section is incompatible with the variable.
    ///
    /// Always raised at construction, never during iteration.
    #[error(transparent)]
    InvalidRange(#[from] InvalidRangeError),
    /// The layout was given placement data it does not support.
    #[error("illegal layout state: {0}")]
    IllegalState(String),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// A tile could not be decoded.
    #[error(transparent)]
    CodecError(#[from] CodecError),
    /// A fill value is incompatible with the data type.
    #[error(transparent)]
    InvalidFillValue(#[from] InvalidFillValueError),
    /// Bytes do not have the expected length.
    #[error(transparent)]
    InvalidBytesLength(#[from] InvalidBytesLengthError),
    /// The element size of a layout does not match the data type.
    #[error("data type {0} is incompatible with an element size of {1} bytes")]
    IncompatibleElementType(DataType, usize),
}

impl LayoutError {
    pub(crate) fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState(message.into())
    }
}
