//! Stream filter pipeline: `/Filter` (a Name or an Array of Names) and
//! `/DecodeParms` (a Dictionary, an Array of Dictionaries/Null, or
//! absent) are walked together and each stage's codec applied in turn.
//! Decoding runs the chain in listed order; encoding runs it in reverse,
//! since encoding undoes decoding one stage at a time from the inside out.
mod ascii;
mod ccitt;
mod dct;
mod flate;
mod lzw;
mod opaque;
mod predictor;
mod run_length;

use crate::{Dictionary, Document, Error, Object, ObjectId, Result};

/// Extra context only the `/Crypt` stage needs: the document (for its
/// security handler) and the indirect object id the crypt filter is
/// being applied for (object keys are derived per-object).
pub type CryptContext<'a> = (&'a Document, ObjectId);

fn filter_names(dict: &Dictionary) -> Result<Vec<Vec<u8>>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => Ok(vec![name.clone()]),
        Ok(Object::Array(items)) => items.iter().map(|o| o.as_name().map(|n| n.to_vec())).collect(),
        Err(_) => Ok(Vec::new()),
        Ok(other) => Err(Error::ObjectType {
            expected: "Name or Array",
            found: other.enum_variant(),
        }),
    }
}

fn decode_parms(dict: &Dictionary, count: usize) -> Result<Vec<Option<Dictionary>>> {
    match dict.get(b"DecodeParms") {
        Ok(Object::Dictionary(d)) => Ok(vec![Some(d.clone())]),
        Ok(Object::Array(items)) => items
            .iter()
            .map(|o| match o {
                Object::Dictionary(d) => Ok(Some(d.clone())),
                Object::Null => Ok(None),
                other => Err(Error::ObjectType {
                    expected: "Dictionary or Null",
                    found: other.enum_variant(),
                }),
            })
            .collect(),
        Err(_) => Ok(Vec::new()),
        Ok(other) => Err(Error::ObjectType {
            expected: "Dictionary or Array",
            found: other.enum_variant(),
        }),
    }
    .map(|mut parms| {
        parms.resize_with(count, || None);
        parms
    })
}

fn decode_one(name: &[u8], data: &[u8], params: &Dictionary, crypt: Option<CryptContext<'_>>) -> Result<Vec<u8>> {
    match name {
        b"FlateDecode" | b"Fl" => flate::decode(data, params),
        b"LZWDecode" | b"LZW" => lzw::decode(data, params),
        b"ASCIIHexDecode" | b"AHx" => ascii::hex_decode(data),
        b"ASCII85Decode" | b"A85" => ascii::a85_decode(data),
        b"RunLengthDecode" | b"RL" => run_length::decode(data),
        b"DCTDecode" | b"DCT" => dct::decode(data),
        b"CCITTFaxDecode" | b"CCF" => ccitt::decode(data, params),
        b"JBIG2Decode" => opaque::jbig2_decode(data),
        b"JPXDecode" => opaque::jpx_decode(data),
        b"Crypt" => match crypt {
            Some((document, id)) => crate::encryption::decrypt_stream_data(document, id, data, params),
            None => Ok(opaque::identity(data)),
        },
        other => Err(Error::FilterFailure {
            filter: "unknown",
            message: format!("unsupported filter /{}", String::from_utf8_lossy(other)),
        }),
    }
}

fn encode_one(name: &[u8], data: &[u8], params: &Dictionary) -> Result<Vec<u8>> {
    match name {
        b"FlateDecode" | b"Fl" => flate::encode(data, params),
        b"LZWDecode" | b"LZW" => lzw::encode(data, params),
        b"ASCIIHexDecode" | b"AHx" => Ok(ascii::hex_encode(data)),
        b"ASCII85Decode" | b"A85" => Ok(ascii::a85_encode(data)),
        b"RunLengthDecode" | b"RL" => Ok(run_length::encode(data)),
        b"DCTDecode" | b"DCT" => dct::encode(data, params),
        b"CCITTFaxDecode" | b"CCF" => ccitt::encode(data, params),
        b"JBIG2Decode" => Ok(opaque::identity(data)),
        b"JPXDecode" => Ok(opaque::identity(data)),
        b"Crypt" => Ok(opaque::identity(data)),
        other => Err(Error::FilterFailure {
            filter: "unknown",
            message: format!("unsupported filter /{}", String::from_utf8_lossy(other)),
        }),
    }
}

/// Run a stream's full `/Filter` chain forward, producing plain content.
pub fn decode_stream(dict: &Dictionary, data: &[u8], crypt: Option<CryptContext<'_>>) -> Result<Vec<u8>> {
    let names = filter_names(dict)?;
    let parms = decode_parms(dict, names.len())?;
    let mut current = data.to_vec();
    for (name, parm) in names.iter().zip(parms.iter()) {
        let empty = Dictionary::new();
        let params = parm.as_ref().unwrap_or(&empty);
        current = decode_one(name, &current, params, crypt)?;
    }
    Ok(current)
}

/// Run a stream's `/Filter` chain in reverse, producing the encoded
/// form that belongs in a stream's on-disk `content`.
pub fn encode_stream(dict: &Dictionary, data: &[u8]) -> Result<Vec<u8>> {
    let names = filter_names(dict)?;
    let parms = decode_parms(dict, names.len())?;
    let mut current = data.to_vec();
    for (name, parm) in names.iter().zip(parms.iter()).rev() {
        let empty = Dictionary::new();
        let params = parm.as_ref().unwrap_or(&empty);
        current = encode_one(name, &current, params)?;
    }
    Ok(current)
}
