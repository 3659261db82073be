//! A synchronous single-file store.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::byte_range::{ByteOffset, ByteRange};
use crate::{Bytes, ReadableStorageTraits, StorageError, WritableStorageTraits};

/// A synchronous single-file store.
///
/// Positioned reads and writes seek the shared file handle, so each operation holds a lock on the handle for its duration.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    file: Mutex<File>,
    read_only: bool,
}

impl FileStore {
    /// Open an existing file read only.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
            read_only: true,
        })
    }

    /// Open a file for reading and writing, creating it if it does not exist.
    ///
    /// Existing content is preserved.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the file cannot be opened or created.
    pub fn open_read_write<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
            read_only: false,
        })
    }

    /// The path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the store was opened read only.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }
}

impl ReadableStorageTraits for FileStore {
    fn get_byte_range(&self, byte_range: ByteRange) -> Result<Bytes, StorageError> {
        let mut file = self.file.lock();
        let size = file.metadata()?.len();
        let range = byte_range.to_range_usize(size)?;
        file.seek(SeekFrom::Start(byte_range.offset()))?;
        let mut buffer = vec![0; range.len()];
        file.read_exact(&mut buffer)?;
        Ok(Bytes::from(buffer))
    }

    fn size(&self) -> Result<u64, StorageError> {
        Ok(self.file.lock().metadata()?.len())
    }
}

impl WritableStorageTraits for FileStore {
    fn set_partial(&self, offset: ByteOffset, value: &[u8]) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::ReadOnly);
        }
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(value)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), StorageError> {
        if !self.read_only {
            self.file.lock().sync_data()?;
        }
        Ok(())
    }
}
