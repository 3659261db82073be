use cdm_section::ArrayShape;

use crate::{filter::InvalidBytesLengthError, DataType, LayoutError};

/// The bytes of a section of a variable, in native byte order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayBytes {
    data_type: DataType,
    shape: ArrayShape,
    bytes: Vec<u8>,
}

impl ArrayBytes {
    /// Create new array bytes of `data_type` elements with `shape`.
    ///
    /// # Errors
    /// Returns [`InvalidBytesLengthError`] if the length of `bytes` does not match `shape` and `data_type`.
    pub fn new(
        data_type: DataType,
        shape: ArrayShape,
        bytes: Vec<u8>,
    ) -> Result<Self, InvalidBytesLengthError> {
        let expected_len = shape
            .iter()
            .try_fold(data_type.size(), |acc, &len| {
                usize::try_from(len).ok().and_then(|len| acc.checked_mul(len))
            })
            .unwrap_or(usize::MAX);
        if bytes.len() == expected_len {
            Ok(Self {
                data_type,
                shape,
                bytes,
            })
        } else {
            Err(InvalidBytesLengthError::new(bytes.len(), expected_len))
        }
    }

    /// Create new array bytes from a slice of elements.
    ///
    /// # Errors
    /// Returns [`LayoutError`] if the size of `T` does not match `data_type` or the number of elements does not match `shape`.
    pub fn from_elements<T: bytemuck::Pod>(
        data_type: DataType,
        shape: ArrayShape,
        elements: &[T],
    ) -> Result<Self, LayoutError> {
        if size_of::<T>() != data_type.size() {
            return Err(LayoutError::IncompatibleElementType(data_type, size_of::<T>()));
        }
        Ok(Self::new(
            data_type,
            shape,
            bytemuck::cast_slice(elements).to_vec(),
        )?)
    }

    /// The data type.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// The shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// The number of elements.
    #[must_use]
    pub fn num_elements(&self) -> usize {
        self.bytes.len() / self.data_type.size()
    }

    /// The underlying bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume and return the underlying bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Copy the bytes into a vector of elements of type `T`.
    ///
    /// # Errors
    /// Returns [`LayoutError::IncompatibleElementType`] if the size of `T` does not match the data type.
    pub fn as_elements<T: bytemuck::Pod>(&self) -> Result<Vec<T>, LayoutError> {
        if size_of::<T>() == self.data_type.size() {
            Ok(bytemuck::pod_collect_to_vec(&self.bytes))
        } else {
            Err(LayoutError::IncompatibleElementType(
                self.data_type,
                size_of::<T>(),
            ))
        }
    }
}
