use auto_impl::auto_impl;

use super::{
    byte_range::{ByteOffset, ByteRange},
    Bytes, StorageError,
};

/// Readable storage traits.
///
/// A readable store serves positioned reads of a single byte sequence.
#[auto_impl(&, Arc, Box)]
pub trait ReadableStorageTraits: Send + Sync {
    /// Retrieve partial bytes from a single byte range.
    ///
    /// # Errors
    /// Returns [`StorageError::InvalidByteRangeError`] if the byte range extends beyond the end of the byte sequence.
    /// Returns a [`StorageError`] if there is an underlying storage error.
    fn get_byte_range(&self, byte_range: ByteRange) -> Result<Bytes, StorageError>;

    /// Return the size in bytes of the byte sequence.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    fn size(&self) -> Result<u64, StorageError>;
}

/// Writable storage traits.
#[auto_impl(&, Arc, Box)]
pub trait WritableStorageTraits: Send + Sync {
    /// Write `value` at byte `offset`, growing the byte sequence if needed.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store is read only or there is an underlying storage error.
    fn set_partial(&self, offset: ByteOffset, value: &[u8]) -> Result<(), StorageError>;

    /// Flush any buffered writes.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
