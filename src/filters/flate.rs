use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::predictor::{self, PredictorParams};
use crate::{Dictionary, Error, Result};

pub fn decode(data: &[u8], params: &Dictionary) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::FilterFailure {
            filter: "FlateDecode",
            message: e.to_string(),
        })?;
    let predictor_params = PredictorParams::from_dict(params);
    predictor::decode(&out, &predictor_params)
}

pub fn encode(data: &[u8], params: &Dictionary) -> Result<Vec<u8>> {
    let predictor_params = PredictorParams::from_dict(params);
    let predicted = predictor::encode(data, &predictor_params)?;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&predicted).map_err(|e| Error::FilterFailure {
        filter: "FlateDecode",
        message: e.to_string(),
    })?;
    encoder.finish().map_err(|e| Error::FilterFailure {
        filter: "FlateDecode",
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flate_round_trip() {
        let dict = Dictionary::new();
        let data = b"the quick brown fox jumps over the lazy dog".repeat(4);
        let encoded = encode(&data, &dict).unwrap();
        let decoded = decode(&encoded, &dict).unwrap();
        assert_eq!(decoded, data);
    }
}
