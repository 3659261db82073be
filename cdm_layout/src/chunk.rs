use cdm_storage::Bytes;

/// A contiguous transfer between stored bytes and a destination buffer.
///
/// `n_elems` elements are copied from byte position `src_pos` of the source to element `dest_elem` of the destination.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Chunk {
    src_pos: u64,
    dest_elem: u64,
    n_elems: u64,
}

impl Chunk {
    /// Create a new chunk.
    #[must_use]
    pub const fn new(src_pos: u64, dest_elem: u64, n_elems: u64) -> Self {
        Self {
            src_pos,
            dest_elem,
            n_elems,
        }
    }

    /// The byte position in the source.
    #[must_use]
    pub const fn src_pos(&self) -> u64 {
        self.src_pos
    }

    /// The element offset in the destination.
    #[must_use]
    pub const fn dest_elem(&self) -> u64 {
        self.dest_elem
    }

    /// The number of elements.
    #[must_use]
    pub const fn n_elems(&self) -> u64 {
        self.n_elems
    }
}

/// A contiguous transfer from a decoded tile held in memory.
///
/// `n_elems` elements are copied from element `src_elem` of [`data`](ChunkBB::data) to element `dest_elem` of the destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkBB {
    data: Bytes,
    src_elem: u64,
    dest_elem: u64,
    n_elems: u64,
}

impl ChunkBB {
    /// Create a new chunk of decoded tile `data`.
    #[must_use]
    pub fn new(data: Bytes, src_elem: u64, dest_elem: u64, n_elems: u64) -> Self {
        Self {
            data,
            src_elem,
            dest_elem,
            n_elems,
        }
    }

    /// The decoded bytes of the whole tile.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// The element offset in [`data`](ChunkBB::data).
    #[must_use]
    pub const fn src_elem(&self) -> u64 {
        self.src_elem
    }

    /// The element offset in the destination.
    #[must_use]
    pub const fn dest_elem(&self) -> u64 {
        self.dest_elem
    }

    /// The number of elements.
    #[must_use]
    pub const fn n_elems(&self) -> u64 {
        self.n_elems
    }
}
