use crate::{Error, Result};

/// Decode `/RunLengthDecode`: each run is a length byte followed by
/// either a literal run (0..=127: that many + 1 literal bytes) or a
/// repeated run (129..=255: one byte repeated 257 - length times);
/// 128 marks end-of-data.
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let length = data[i];
        i += 1;
        match length {
            0..=127 => {
                let count = length as usize + 1;
                let end = i + count;
                if end > data.len() {
                    return Err(Error::FilterFailure {
                        filter: "RunLengthDecode",
                        message: "literal run truncated".into(),
                    });
                }
                out.extend_from_slice(&data[i..end]);
                i = end;
            }
            128 => break,
            _ => {
                if i >= data.len() {
                    return Err(Error::FilterFailure {
                        filter: "RunLengthDecode",
                        message: "repeated run truncated".into(),
                    });
                }
                let count = 257 - length as usize;
                out.extend(std::iter::repeat(data[i]).take(count));
                i += 1;
            }
        }
    }
    Ok(out)
}

/// Encode using only literal runs (no attempt to find repeated runs);
/// correct but not space-optimal, same tradeoff as the predictor encoder.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 127 + 1);
    for chunk in data.chunks(128) {
        out.push((chunk.len() - 1) as u8);
        out.extend_from_slice(chunk);
    }
    out.push(128);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_round_trip() {
        let data = b"the quick brown fox".to_vec();
        let encoded = encode(&data);
        assert_eq!(decode(&encoded).unwrap(), data);
    }

    #[test]
    fn repeated_run_decodes() {
        // length 255 -> 257-255 = 2 repeats of the following byte.
        let encoded = vec![255u8, b'A', 128];
        assert_eq!(decode(&encoded).unwrap(), b"AA".to_vec());
    }

    #[test]
    fn empty_input_encodes_to_eod_only() {
        assert_eq!(encode(&[]), vec![128]);
        assert_eq!(decode(&[128]).unwrap(), Vec::<u8>::new());
    }
}
