use std::io::{Cursor, Read};

use super::{CodecError, TileFilter, FILTER_DEFLATE};

/// The deflate filter (HDF5 filter 1).
///
/// Tiles are zlib streams.
#[derive(Clone, Debug)]
pub struct DeflateFilter {
    compression: flate2::Compression,
}

impl Default for DeflateFilter {
    fn default() -> Self {
        Self::new(6)
    }
}

impl DeflateFilter {
    /// Create a new deflate filter with a compression `level` from 0 to 9.
    ///
    /// Levels above 9 are clamped.
    #[must_use]
    pub fn new(level: u32) -> Self {
        Self {
            compression: flate2::Compression::new(level.min(9)),
        }
    }
}

impl TileFilter for DeflateFilter {
    fn id(&self) -> u16 {
        FILTER_DEFLATE
    }

    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut encoder =
            flate2::read::ZlibEncoder::new(Cursor::new(decoded_value), self.compression);
        let mut out: Vec<u8> = Vec::new();
        encoder.read_to_end(&mut out)?;
        Ok(out)
    }

    fn decode(&self, encoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut decoder = flate2::read::ZlibDecoder::new(Cursor::new(encoded_value));
        let mut out: Vec<u8> = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    }
}
