//! Stores.
//!
//! - [`MemoryStore`]: a growable in-memory byte sequence.
//! - [`FileStore`]: a single file, opened read only or read and write.

mod file_store;
mod memory_store;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;
