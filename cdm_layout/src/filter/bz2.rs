use std::io::{Cursor, Read};

use super::{CodecError, TileFilter, FILTER_BZIP2};

/// The bzip2 filter (registered HDF5 filter 307).
#[derive(Clone, Debug)]
pub struct Bzip2Filter {
    compression: bzip2::Compression,
}

impl Default for Bzip2Filter {
    fn default() -> Self {
        Self::new(9)
    }
}

impl Bzip2Filter {
    /// Create a new bzip2 filter with a block size `level` from 1 to 9.
    #[must_use]
    pub fn new(level: u32) -> Self {
        Self {
            compression: bzip2::Compression::new(level.clamp(1, 9)),
        }
    }
}

impl TileFilter for Bzip2Filter {
    fn id(&self) -> u16 {
        FILTER_BZIP2
    }

    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut encoder = bzip2::read::BzEncoder::new(Cursor::new(decoded_value), self.compression);
        let mut out: Vec<u8> = Vec::new();
        encoder.read_to_end(&mut out)?;
        Ok(out)
    }

    fn decode(&self, encoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut decoder = bzip2::read::BzDecoder::new(Cursor::new(encoded_value));
        let mut out: Vec<u8> = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bz2_encode_decode() {
        let bytes: Vec<u8> = (0..64u16).flat_map(u16::to_be_bytes).collect();
        let filter = Bzip2Filter::new(5);
        assert_eq!(filter.id(), 307);
        let encoded = filter.encode(bytes.clone()).unwrap();
        assert_eq!(&encoded[..3], b"BZh");
        assert_eq!(filter.decode(encoded).unwrap(), bytes);
    }
}
