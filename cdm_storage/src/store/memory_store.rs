//! A synchronous in-memory store.

use parking_lot::RwLock;

use crate::byte_range::{ByteOffset, ByteRange, InvalidByteRangeError};
use crate::{Bytes, ReadableStorageTraits, StorageError, WritableStorageTraits};

/// A synchronous in-memory store.
///
/// The store holds a single byte sequence which grows (zero filled) when written beyond its end.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Vec<u8>>,
}

impl From<Vec<u8>> for MemoryStore {
    fn from(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }
}

impl MemoryStore {
    /// Create a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new memory store holding a copy of `data`.
    #[must_use]
    pub fn new_with_bytes(data: &[u8]) -> Self {
        Self::from(data.to_vec())
    }

    /// Return a copy of the stored bytes.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.read().clone()
    }

    /// Consume the store and return the stored bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data.into_inner()
    }
}

impl ReadableStorageTraits for MemoryStore {
    fn get_byte_range(&self, byte_range: ByteRange) -> Result<Bytes, StorageError> {
        let data = self.data.read();
        let range = byte_range.to_range_usize(data.len() as u64)?;
        Ok(Bytes::copy_from_slice(&data[range]))
    }

    fn size(&self) -> Result<u64, StorageError> {
        Ok(self.data.read().len() as u64)
    }
}

impl WritableStorageTraits for MemoryStore {
    fn set_partial(&self, offset: ByteOffset, value: &[u8]) -> Result<(), StorageError> {
        let byte_range = ByteRange::new_with_offset_length(offset, value.len() as u64);
        let invalid = || InvalidByteRangeError::new(byte_range, u64::MAX);
        let start = usize::try_from(offset).map_err(|_| invalid())?;
        let end = start.checked_add(value.len()).ok_or_else(invalid)?;

        let mut data = self.data.write();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(value);
        Ok(())
    }
}
