//! Primitive element data types and byte order.

use derive_more::Display;

use crate::FillValue;

/// A primitive element data type of a netCDF/HDF variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
pub enum DataType {
    /// `byte` (signed 8-bit integer).
    #[display("byte")]
    Byte,
    /// `char` (8-bit character).
    #[display("char")]
    Char,
    /// `short` (signed 16-bit integer).
    #[display("short")]
    Short,
    /// `int` (signed 32-bit integer).
    #[display("int")]
    Int,
    /// `int64` (signed 64-bit integer).
    #[display("int64")]
    Int64,
    /// `ubyte` (unsigned 8-bit integer).
    #[display("ubyte")]
    UByte,
    /// `ushort` (unsigned 16-bit integer).
    #[display("ushort")]
    UShort,
    /// `uint` (unsigned 32-bit integer).
    #[display("uint")]
    UInt,
    /// `uint64` (unsigned 64-bit integer).
    #[display("uint64")]
    UInt64,
    /// `float` (IEEE 754 32-bit floating point).
    #[display("float")]
    Float,
    /// `double` (IEEE 754 64-bit floating point).
    #[display("double")]
    Double,
}

impl DataType {
    /// The size in bytes of one element.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Byte | Self::Char | Self::UByte => 1,
            Self::Short | Self::UShort => 2,
            Self::Int | Self::UInt | Self::Float => 4,
            Self::Int64 | Self::UInt64 | Self::Double => 8,
        }
    }

    /// The netCDF default fill value (`NC_FILL_*`) of the data type, in native byte order.
    #[must_use]
    pub fn default_fill_value(&self) -> FillValue {
        match self {
            Self::Byte => FillValue::from(-127i8),
            Self::Char => FillValue::from(0u8),
            Self::Short => FillValue::from(-32_767i16),
            Self::Int => FillValue::from(-2_147_483_647i32),
            Self::Int64 => FillValue::from(-9_223_372_036_854_775_806i64),
            Self::UByte => FillValue::from(u8::MAX),
            Self::UShort => FillValue::from(u16::MAX),
            Self::UInt => FillValue::from(u32::MAX),
            Self::UInt64 => FillValue::from(u64::MAX - 1),
            Self::Float => FillValue::from(9.969_21e36_f32),
            Self::Double => FillValue::from(9.969_209_968_386_869e36_f64),
        }
    }
}

/// The byte order of stored multi-byte elements.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
pub enum ByteOrder {
    /// Big endian (most significant byte first), as in netCDF-3.
    #[display("big")]
    Big,
    /// Little endian (least significant byte first).
    #[display("little")]
    Little,
}

impl ByteOrder {
    /// The byte order of the target platform.
    pub const NATIVE: Self = if cfg!(target_endian = "big") {
        Self::Big
    } else {
        Self::Little
    };

    /// Returns true if the byte order matches the target platform.
    #[must_use]
    pub fn is_native(self) -> bool {
        self == Self::NATIVE
    }

    /// Convert elements of `element_size` bytes between this byte order and native order in place.
    ///
    /// Does nothing if this byte order is native.
    pub fn swap_in_place(self, bytes: &mut [u8], element_size: usize) {
        if !self.is_native() {
            reverse_endianness(bytes, element_size);
        }
    }
}

/// Reverse the byte order of each `element_size` element of `v`.
pub(crate) fn reverse_endianness(v: &mut [u8], element_size: usize) {
    match element_size {
        0 | 1 => {}
        2 => {
            for chunk in v.chunks_exact_mut(2) {
                let bytes = u16::from_ne_bytes([chunk[0], chunk[1]]);
                chunk.copy_from_slice(&bytes.swap_bytes().to_ne_bytes());
            }
        }
        4 => {
            for chunk in v.chunks_exact_mut(4) {
                chunk.reverse();
            }
        }
        8 => {
            for chunk in v.chunks_exact_mut(8) {
                chunk.reverse();
            }
        }
        _ => {
            for chunk in v.chunks_exact_mut(element_size) {
                chunk.reverse();
            }
        }
    }
}
