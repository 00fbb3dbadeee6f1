//! PDF's LZW variant: MSB-first bit packing, 9..12 bit codes, a clear
//! table code (256) and end-of-data code (257), table entries starting
//! at 258. `/EarlyChange` selects whether the code width grows one code
//! before the table is technically full (1, the default, matching GIF's
//! convention) or exactly when it fills (0, matching TIFF's) — `weezl`
//! exposes both switch-point conventions directly, so no bit-packing
//! needs hand-rolling here.
use weezl::{decode::Decoder, encode::Encoder, BitOrder};

use super::predictor::{self, PredictorParams};
use crate::{Dictionary, Error, Result};

const MIN_CODE_SIZE: u8 = 8;

fn early_change(dict: &Dictionary) -> bool {
    dict.get(b"EarlyChange").and_then(|o| o.as_i64()).unwrap_or(1) != 0
}

pub fn decode(data: &[u8], params: &Dictionary) -> Result<Vec<u8>> {
    let mut decoder = if early_change(params) {
        Decoder::new(BitOrder::Msb, MIN_CODE_SIZE)
    } else {
        Decoder::with_tiff_size_switch(BitOrder::Msb, MIN_CODE_SIZE)
    };
    let decoded = decoder.decode(data).map_err(|e| Error::FilterFailure {
        filter: "LZWDecode",
        message: e.to_string(),
    })?;
    let predictor_params = PredictorParams::from_dict(params);
    predictor::decode(&decoded, &predictor_params)
}

pub fn encode(data: &[u8], params: &Dictionary) -> Result<Vec<u8>> {
    let predictor_params = PredictorParams::from_dict(params);
    let predicted = predictor::encode(data, &predictor_params)?;

    let mut encoder = if early_change(params) {
        Encoder::new(BitOrder::Msb, MIN_CODE_SIZE)
    } else {
        Encoder::with_tiff_size_switch(BitOrder::Msb, MIN_CODE_SIZE)
    };
    encoder.encode(&predicted).map_err(|e| Error::FilterFailure {
        filter: "LZWDecode",
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lzw_round_trip_early_change_1() {
        let dict = Dictionary::new();
        let data = b"TOBEORNOTTOBEORTOBEORNOT".to_vec();
        let encoded = encode(&data, &dict).unwrap();
        let decoded = decode(&encoded, &dict).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn lzw_round_trip_early_change_0() {
        let mut dict = Dictionary::new();
        dict.set("EarlyChange", 0i64);
        let data = b"the quick brown fox jumps over the lazy dog, repeatedly, over and over"
            .repeat(3);
        let encoded = encode(&data, &dict).unwrap();
        let decoded = decode(&encoded, &dict).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn lzw_early_change_0_and_1_disagree_on_raw_bytes() {
        let data = b"AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA".to_vec();
        let mut early = Dictionary::new();
        early.set("EarlyChange", 1i64);
        let mut late = Dictionary::new();
        late.set("EarlyChange", 0i64);

        let encoded_early = encode(&data, &early).unwrap();
        let encoded_late = encode(&data, &late).unwrap();

        assert_eq!(decode(&encoded_early, &early).unwrap(), data);
        assert_eq!(decode(&encoded_late, &late).unwrap(), data);
    }
}
