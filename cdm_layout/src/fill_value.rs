//! Fill values.
//!
//! A fill value is the element written to the parts of a destination buffer that have no stored data, such as absent tiles.

use thiserror::Error;

use crate::DataType;

/// A data type and fill value incompatibility error.
#[derive(Clone, Debug, Error)]
#[error("incompatible fill value {1} for data type {0}")]
pub struct InvalidFillValueError(DataType, FillValue);

impl InvalidFillValueError {
    /// Create a new incompatible fill value error.
    #[must_use]
    pub const fn new(data_type: DataType, fill_value: FillValue) -> Self {
        Self(data_type, fill_value)
    }
}

/// A fill value.
///
/// The bytes of a single element in native byte order.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FillValue(Vec<u8>);

impl core::fmt::Display for FillValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<&[u8]> for FillValue {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for FillValue {
    fn from(value: [u8; N]) -> Self {
        Self(value.to_vec())
    }
}

impl From<Vec<u8>> for FillValue {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

macro_rules! impl_fill_value_from_primitive {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FillValue {
                fn from(value: $t) -> Self {
                    Self(value.to_ne_bytes().to_vec())
                }
            }
        )*
    };
}

impl_fill_value_from_primitive!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl FillValue {
    /// Create a new fill value composed of `bytes`.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the size in bytes of the fill value.
    #[must_use]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Return the byte representation of the fill value.
    #[must_use]
    pub fn as_ne_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Check that the fill value is the size of an element of `data_type`.
    ///
    /// # Errors
    /// Returns [`InvalidFillValueError`] if the sizes differ.
    pub fn validate(&self, data_type: DataType) -> Result<(), InvalidFillValueError> {
        if self.size() == data_type.size() {
            Ok(())
        } else {
            Err(InvalidFillValueError::new(data_type, self.clone()))
        }
    }

    /// Overwrite `bytes` with repetitions of the fill value.
    ///
    /// A trailing partial element is left unchanged.
    pub fn fill(&self, bytes: &mut [u8]) {
        match self.0.as_slice() {
            [] => {}
            [value] => bytes.fill(*value),
            value => {
                for element in bytes.chunks_exact_mut(value.len()) {
                    element.copy_from_slice(value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_value_fill() {
        let fill_value = FillValue::from(-1i16);
        let mut bytes = vec![0u8; 7];
        fill_value.fill(&mut bytes);
        assert_eq!(bytes, vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0]);

        let mut bytes = vec![0u8; 3];
        FillValue::from(7u8).fill(&mut bytes);
        assert_eq!(bytes, vec![7, 7, 7]);
    }

    #[test]
    fn fill_value_validate() {
        assert!(FillValue::from(1.0f32).validate(DataType::Float).is_ok());
        assert!(FillValue::from(1.0f32).validate(DataType::Int).is_ok());
        let err = FillValue::from(1u8).validate(DataType::Double).unwrap_err();
        assert_eq!(
            err.to_string(),
            "incompatible fill value [1] for data type double"
        );
    }
}
