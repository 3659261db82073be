//! The byte-range storage API for the `cdm` array layout engine.
//!
//! A variable's data lives in a single byte sequence (a file, or a buffer in memory) and is addressed by absolute byte position.
//! Layouts produce positioned transfers which are served by [`ReadableStorageTraits::get_byte_range`] and [`WritableStorageTraits::set_partial`].
//!
//! This crate includes an in-memory store ([`store::MemoryStore`]) and a single-file store ([`store::FileStore`]).
//!
//! ## Licence
//! `cdm_storage` is licensed under either of
//! - the Apache License, Version 2.0 or <http://www.apache.org/licenses/LICENSE-2.0> or
//! - the MIT license or <http://opensource.org/licenses/MIT>, at your option.

mod storage_sync;
pub mod store;

pub mod byte_range;
use byte_range::InvalidByteRangeError;

use std::sync::Arc;

use thiserror::Error;

pub use self::storage_sync::{ReadableStorageTraits, WritableStorageTraits};

/// The type for bytes returned by storage reads.
///
/// An alias for [`bytes::Bytes`].
pub type Bytes = bytes::Bytes;

/// A storage error.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// A write operation was attempted on a read only store.
    #[error("a write operation was attempted on a read only store")]
    ReadOnly,
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] Arc<std::io::Error>),
    /// An invalid byte range.
    #[error(transparent)]
    InvalidByteRangeError(#[from] InvalidByteRangeError),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(Arc::new(err))
    }
}
