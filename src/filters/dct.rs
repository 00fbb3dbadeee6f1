//! `/DCTDecode` (baseline/progressive JPEG). Without the `embed_image`
//! feature the encoded bytes are valid JPEG and are passed through
//! unchanged — most consumers only need the compressed stream itself
//! (e.g. to re-embed it in another PDF) and decoding full pixel data is
//! comparatively expensive.
use crate::{Dictionary, Result};

#[cfg(feature = "embed_image")]
use crate::{Error, Object};

/// Adobe's APP14 marker carries a `transform` byte; its presence on a
/// 4-component scan means the samples are CMYK/YCCK encoded *inverted*,
/// the convention every PDF producer that embeds Adobe-encoded JPEGs
/// relies on. We scan for the marker ourselves rather than trust the
/// decoder, since `image`'s color model doesn't surface it.
#[cfg(feature = "embed_image")]
fn has_adobe_app14(data: &[u8]) -> bool {
    let mut i = 2; // skip SOI (FF D8)
    while i + 4 <= data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }
        let marker = data[i + 1];
        if marker == 0xD8 || marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            i += 2;
            continue;
        }
        if marker == 0xD9 || marker == 0xDA {
            break; // end of image / start of scan: no more markers precede pixel data
        }
        if i + 4 > data.len() {
            break;
        }
        let len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        if marker == 0xEE && len >= 12 && i + 2 + len <= data.len() && &data[i + 4..i + 9] == b"Adobe" {
            return true;
        }
        if len < 2 {
            break;
        }
        i += 2 + len;
    }
    false
}

/// Decode to raw row-major samples, inspecting the JPEG's color model
/// to report `(color_components, bits_per_component)` alongside the
/// bytes. CMYK/YCCK scans carrying an Adobe APP14 marker are inverted
/// to undo the PDF-embedding convention.
#[cfg(feature = "embed_image")]
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    use std::io::Cursor;

    use image::codecs::jpeg::JpegDecoder;
    use image::{ColorType, ImageDecoder};

    let decoder = JpegDecoder::new(Cursor::new(data)).map_err(|e| Error::FilterFailure {
        filter: "DCTDecode",
        message: e.to_string(),
    })?;
    let color_type = decoder.color_type();
    let components = color_components(color_type);

    let mut samples = vec![0u8; decoder.total_bytes() as usize];
    decoder.read_image(&mut samples).map_err(|e| Error::FilterFailure {
        filter: "DCTDecode",
        message: e.to_string(),
    })?;

    if components == 4 && has_adobe_app14(data) {
        for byte in samples.iter_mut() {
            *byte = 255 - *byte;
        }
    }

    Ok(samples)
}

#[cfg(feature = "embed_image")]
fn color_components(color_type: image::ColorType) -> u8 {
    use image::ColorType;
    match color_type {
        ColorType::L8 | ColorType::L16 => 1,
        ColorType::La8 | ColorType::La16 => 2,
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => 3,
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => 4,
        _ => 3,
    }
}

#[cfg(not(feature = "embed_image"))]
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    Ok(data.to_vec())
}

/// Encode raw row-major samples into a JPEG byte stream. `params` carries
/// the side-channel dimensions a `/DCTDecode` stream's `/DecodeParms`
/// doesn't normally need but an encoder does: `/Width`, `/Height`,
/// `/ColorComponents` (1, 3 or 4), `/BitsPerComponent` (8 only), and an
/// optional `/Quality` (0-100, default 75).
///
/// Without `embed_image`, `data` is assumed to already be a JPEG byte
/// stream and is passed through unchanged.
#[cfg(feature = "embed_image")]
pub fn encode(data: &[u8], params: &Dictionary) -> Result<Vec<u8>> {
    use image::codecs::jpeg::JpegEncoder;
    use image::{ExtendedColorType, ImageEncoder};

    let width = params.get(b"Width").and_then(Object::as_i64).unwrap_or(0) as u32;
    let height = params.get(b"Height").and_then(Object::as_i64).unwrap_or(0) as u32;
    let components = params.get(b"ColorComponents").and_then(Object::as_i64).unwrap_or(3);
    let bits_per_component = params.get(b"BitsPerComponent").and_then(Object::as_i64).unwrap_or(8);
    let quality = params.get(b"Quality").and_then(Object::as_i64).unwrap_or(75).clamp(1, 100) as u8;

    if width == 0 || height == 0 || bits_per_component != 8 {
        return Err(Error::InvalidDecodeParams("DCTDecode"));
    }
    let color_type = match components {
        1 => ExtendedColorType::L8,
        3 => ExtendedColorType::Rgb8,
        4 => ExtendedColorType::Cmyk8,
        _ => return Err(Error::InvalidDecodeParams("DCTDecode")),
    };

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .write_image(data, width, height, color_type)
        .map_err(|e| Error::FilterFailure {
            filter: "DCTDecode",
            message: e.to_string(),
        })?;
    Ok(out)
}

#[cfg(not(feature = "embed_image"))]
pub fn encode(data: &[u8], _params: &Dictionary) -> Result<Vec<u8>> {
    Ok(data.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_round_trip() {
        let data = vec![0xFFu8, 0xD8, 0xFF, 0xD9];
        assert_eq!(encode(&data, &Dictionary::new()).unwrap(), data);
    }

    #[cfg(feature = "embed_image")]
    #[test]
    fn detects_adobe_app14_marker() {
        // SOI, APP14 "Adobe" (len=14, version=100, flags0=0, flags1=0, transform=2), EOI
        let mut jpeg = vec![0xFF, 0xD8];
        jpeg.extend_from_slice(&[0xFF, 0xEE, 0x00, 0x0E]);
        jpeg.extend_from_slice(b"Adobe");
        jpeg.extend_from_slice(&[0x00, 0x64, 0x00, 0x00, 0x00, 0x02]);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        assert!(has_adobe_app14(&jpeg));

        let plain = vec![0xFFu8, 0xD8, 0xFF, 0xD9];
        assert!(!has_adobe_app14(&plain));
    }
}
