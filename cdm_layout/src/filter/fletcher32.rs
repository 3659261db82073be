use crate::global_config;

use super::{CodecError, TileFilter, FILTER_FLETCHER32};

const CHECKSUM_SIZE: usize = 4;

/// The fletcher32 checksum filter (HDF5 filter 3).
///
/// Encoding appends a 4 byte little endian checksum.
/// Decoding verifies it (if [`Config::validate_checksums`](crate::Config::validate_checksums) is enabled) and strips it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fletcher32Filter;

/// Compute the HDF5 variant of the fletcher32 checksum.
///
/// Sums big endian 16-bit words, and a trailing odd byte as the high byte of a final word.
fn fletcher32(data: &[u8]) -> u32 {
    // 360 words keeps both sums within u32 before reduction
    const BLOCK_BYTES: usize = 720;

    let mut sum1: u32 = 0;
    let mut sum2: u32 = 0;
    for block in data.chunks(BLOCK_BYTES) {
        let mut words = block.chunks_exact(2);
        for word in words.by_ref() {
            sum1 += u32::from(u16::from_be_bytes([word[0], word[1]]));
            sum2 += sum1;
        }
        if let [last] = words.remainder() {
            sum1 += u32::from(*last) << 8;
            sum2 += sum1;
        }
        sum1 %= 65535;
        sum2 %= 65535;
    }
    (sum2 << 16) | sum1
}

impl TileFilter for Fletcher32Filter {
    fn id(&self) -> u16 {
        FILTER_FLETCHER32
    }

    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let checksum = fletcher32(&decoded_value);
        let mut encoded_value = decoded_value;
        encoded_value.extend_from_slice(&checksum.to_le_bytes());
        Ok(encoded_value)
    }

    fn decode(&self, encoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let Some(payload_len) = encoded_value.len().checked_sub(CHECKSUM_SIZE) else {
            return Err(CodecError::Other(format!(
                "fletcher32 encoded value of {} bytes is too short for a checksum",
                encoded_value.len()
            )));
        };
        let (payload, stored) = encoded_value.split_at(payload_len);
        if global_config().validate_checksums() {
            let stored = u32::from_le_bytes([stored[0], stored[1], stored[2], stored[3]]);
            if fletcher32(payload) != stored {
                return Err(CodecError::InvalidChecksum);
            }
        } else {
            log::warn!("skipping fletcher32 checksum validation, disabled in the global config");
        }
        let mut decoded_value = encoded_value;
        decoded_value.truncate(payload_len);
        Ok(decoded_value)
    }
}
