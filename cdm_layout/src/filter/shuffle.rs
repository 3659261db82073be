use super::{CodecError, TileFilter, FILTER_SHUFFLE};

/// The byte shuffle filter (HDF5 filter 2).
///
/// Groups byte `k` of every element together, which improves the compression of slowly varying values.
#[derive(Clone, Debug)]
pub struct ShuffleFilter {
    element_size: usize,
}

impl ShuffleFilter {
    /// Create a new shuffle filter for elements of `element_size` bytes.
    #[must_use]
    pub fn new(element_size: usize) -> Self {
        Self { element_size }
    }

    fn check_length(&self, len: usize) -> Result<(), CodecError> {
        if self.element_size == 0 || len % self.element_size != 0 {
            Err(CodecError::Other(format!(
                "the shuffle filter expects the input byte length {len} to be an integer multiple of the element size {}",
                self.element_size
            )))
        } else {
            Ok(())
        }
    }
}

impl TileFilter for ShuffleFilter {
    fn id(&self) -> u16 {
        FILTER_SHUFFLE
    }

    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        self.check_length(decoded_value.len())?;
        if self.element_size == 1 {
            return Ok(decoded_value);
        }
        let mut encoded_value = vec![0; decoded_value.len()];
        let count = decoded_value.len() / self.element_size;
        for i in 0..count {
            let offset = i * self.element_size;
            for byte_index in 0..self.element_size {
                encoded_value[byte_index * count + i] = decoded_value[offset + byte_index];
            }
        }
        Ok(encoded_value)
    }

    fn decode(&self, encoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        self.check_length(encoded_value.len())?;
        if self.element_size == 1 {
            return Ok(encoded_value);
        }
        let mut decoded_value = vec![0; encoded_value.len()];
        let count = encoded_value.len() / self.element_size;
        for i in 0..self.element_size {
            let offset = i * count;
            for byte_index in 0..count {
                decoded_value[byte_index * self.element_size + i] = encoded_value[offset + byte_index];
            }
        }
        Ok(decoded_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shuffle_layout() {
        let filter = ShuffleFilter::new(4);
        let decoded: Vec<u8> = [1u32, 2, 3].iter().flat_map(|v| v.to_be_bytes()).collect();
        let encoded = filter.encode(decoded.clone()).unwrap();
        assert_eq!(encoded, vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3]);
        assert_eq!(filter.decode(encoded).unwrap(), decoded);
    }

    #[test]
    fn shuffle_invalid_length() {
        let filter = ShuffleFilter::new(4);
        assert!(filter.decode(vec![0; 6]).is_err());
        assert!(ShuffleFilter::new(0).encode(vec![]).is_err());
        assert_eq!(ShuffleFilter::new(1).decode(vec![3, 2, 1]).unwrap(), vec![3, 2, 1]);
    }
}
