//! `/CCITTFaxDecode`: Group 3 (1-D and mixed 1-D/2-D) and Group 4 (pure
//! 2-D MMR) fax encoding, as used for scanned monochrome pages. Both
//! directions are implemented directly against the ITU-T T.4/T.6
//! Modified Huffman / Modified READ code tables via a shared bit
//! reader/writer pair, so `decode` can honor `/EncodedByteAlign`
//! row-by-row exactly the way `encode` produces it.
use crate::{Dictionary, Error, Result};

#[derive(Debug, Clone, Copy)]
struct CcittParams {
    k: i64,
    columns: i64,
    rows: i64,
    black_is_1: bool,
    byte_align: bool,
}

impl CcittParams {
    fn from_dict(dict: &Dictionary) -> Self {
        let get_i = |key: &[u8], default: i64| dict.get(key).and_then(|o| o.as_i64()).unwrap_or(default);
        let get_b = |key: &[u8], default: bool| dict.get(key).and_then(|o| o.as_bool()).unwrap_or(default);
        CcittParams {
            k: get_i(b"K", 0),
            columns: get_i(b"Columns", 1728),
            rows: get_i(b"Rows", 0),
            black_is_1: get_b(b"BlackIs1", false),
            byte_align: get_b(b"EncodedByteAlign", false),
        }
    }
}

pub fn decode(data: &[u8], params: &Dictionary) -> Result<Vec<u8>> {
    let p = CcittParams::from_dict(params);
    let columns = p.columns.max(1) as usize;
    let row_bytes = columns.div_ceil(8);
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let expected_rows = if p.rows > 0 { Some(p.rows as usize) } else { None };
    let mut reader = BitReader::new(data);
    let mut out = Vec::new();
    let mut reference = vec![false; columns];
    let mut rows_decoded = 0usize;

    while expected_rows.map(|n| rows_decoded < n).unwrap_or(true) && !reader.at_end() {
        let row = if p.k < 0 {
            decode_2d_row(&reference, columns, &mut reader)
        } else {
            decode_1d_row(columns, &mut reader)
        };
        let row = match row {
            Ok(row) => row,
            // Without a declared row count we can't tell a genuine decode
            // failure from having already consumed the real data and run
            // into EOFB/trailing padding; anything decoded so far stands.
            Err(_) if expected_rows.is_none() && rows_decoded > 0 => break,
            Err(err) => return Err(err),
        };

        pack_row(&row, p.black_is_1, row_bytes, &mut out);

        // The encoder pads every row out to a byte boundary when
        // `/EncodedByteAlign` is set; skip that padding here the same
        // way `encode` writes it via `BitWriter::align_byte`.
        if p.byte_align {
            reader.align_byte();
        }
        reference = row;
        rows_decoded += 1;
    }

    if rows_decoded == 0 {
        return Err(Error::FilterFailure {
            filter: "CCITTFaxDecode",
            message: "decoder produced no rows".into(),
        });
    }
    Ok(out)
}

fn pack_row(row: &[bool], black_is_1: bool, row_bytes: usize, out: &mut Vec<u8>) {
    let mut packed = vec![0u8; row_bytes];
    for (i, &is_black) in row.iter().enumerate() {
        if is_black == black_is_1 {
            packed[i / 8] |= 0x80 >> (i % 8);
        }
    }
    out.extend_from_slice(&packed);
}

pub fn encode(data: &[u8], params: &Dictionary) -> Result<Vec<u8>> {
    let p = CcittParams::from_dict(params);
    let columns = p.columns.max(1) as usize;
    let row_bytes = columns.div_ceil(8);
    if row_bytes == 0 || data.is_empty() {
        return Ok(Vec::new());
    }
    let rows = if p.rows > 0 { p.rows as usize } else { data.len() / row_bytes };
    if rows == 0 {
        return Ok(Vec::new());
    }

    let mut bitmap: Vec<Vec<bool>> = Vec::with_capacity(rows);
    for r in 0..rows {
        let start = r * row_bytes;
        let row_slice = data.get(start..start + row_bytes).ok_or_else(|| Error::FilterFailure {
            filter: "CCITTFaxDecode",
            message: "insufficient data for declared Columns/Rows".into(),
        })?;
        let mut row = Vec::with_capacity(columns);
        for i in 0..columns {
            let byte = row_slice[i / 8];
            let bit_set = (byte >> (7 - (i % 8))) & 1 == 1;
            row.push(bit_set == p.black_is_1);
        }
        bitmap.push(row);
    }

    let mut writer = BitWriter::new();
    if p.k < 0 {
        let mut reference = vec![false; columns];
        for row in &bitmap {
            encode_2d_row(&reference, row, columns, &mut writer);
            if p.byte_align {
                writer.align_byte();
            }
            reference = row.clone();
        }
        writer.write_bits(0x001, 12);
        writer.write_bits(0x001, 12);
    } else {
        for row in &bitmap {
            encode_1d_row(row, columns, &mut writer);
            if p.byte_align {
                writer.align_byte();
            }
        }
    }
    Ok(writer.finish())
}

/// Every position where `line[i]` differs in color from `line[i-1]`
/// (`line[-1]` is imaginary white), plus two sentinels at `columns` so
/// lookahead past the last real transition degrades gracefully.
fn changing_elements(line: &[bool], columns: usize) -> Vec<usize> {
    let mut ce = Vec::new();
    let mut prev = false;
    for (i, &pixel) in line.iter().enumerate() {
        if pixel != prev {
            ce.push(i);
        }
        prev = pixel;
    }
    ce.push(columns);
    ce.push(columns);
    ce
}

/// The color a changing-element index marks the *start* of: the line
/// begins white, so the element at index 0 starts a black run, index 1
/// starts a white run, and so on.
fn color_at(index: usize) -> bool {
    index % 2 == 0
}

fn encode_2d_row(reference: &[bool], coding: &[bool], columns: usize, writer: &mut BitWriter) {
    let ref_ce = changing_elements(reference, columns);
    let cod_ce = changing_elements(coding, columns);

    let mut a0: isize = -1;
    let mut color = false; // false = white
    let mut rpos = 0usize;
    let mut cpos = 0usize;

    while (a0 as i64) < columns as i64 {
        while rpos < ref_ce.len() && (ref_ce[rpos] as isize) <= a0 {
            rpos += 1;
        }
        let mut b1_idx = rpos;
        if b1_idx < ref_ce.len() && color_at(b1_idx) == color {
            b1_idx += 1;
        }
        let b1 = ref_ce.get(b1_idx).copied().unwrap_or(columns);
        let b2 = ref_ce.get(b1_idx + 1).copied().unwrap_or(columns);

        while cpos < cod_ce.len() && (cod_ce[cpos] as isize) <= a0 {
            cpos += 1;
        }
        let a1 = cod_ce.get(cpos).copied().unwrap_or(columns);

        if b2 < a1 {
            writer.write_bits(0b0001, 4);
            a0 = b2 as isize;
        } else {
            let delta = a1 as isize - b1 as isize;
            if delta.abs() <= 3 {
                match delta {
                    0 => writer.write_bits(0b1, 1),
                    1 => writer.write_bits(0b011, 3),
                    -1 => writer.write_bits(0b010, 3),
                    2 => writer.write_bits(0b000011, 6),
                    -2 => writer.write_bits(0b000010, 6),
                    3 => writer.write_bits(0b0000011, 7),
                    -3 => writer.write_bits(0b0000010, 7),
                    _ => unreachable!("|delta| <= 3 guaranteed by the guard above"),
                }
                a0 = a1 as isize;
                color = !color;
            } else {
                let mut a2pos = cpos;
                while a2pos < cod_ce.len() && (cod_ce[a2pos] as isize) <= a1 as isize {
                    a2pos += 1;
                }
                let a2 = cod_ce.get(a2pos).copied().unwrap_or(columns);

                writer.write_bits(0b001, 3);
                let a0_eff = a0.max(0) as usize;
                let run1 = a1 - a0_eff;
                let run2 = a2 - a1;
                encode_run(writer, run1, !color);
                encode_run(writer, run2, color);
                a0 = a2 as isize;
            }
        }
    }
}

fn encode_1d_row(row: &[bool], columns: usize, writer: &mut BitWriter) {
    let mut color = false;
    let mut pos = 0usize;
    while pos < columns {
        let start = pos;
        while pos < columns && row[pos] == color {
            pos += 1;
        }
        encode_run(writer, pos - start, !color);
        color = !color;
    }
}

/// Encode one run as zero or more makeup codes (color-specific 64-1728
/// plus the color-shared extended 1792-2560 table) followed by a single
/// terminating code (0-63).
fn encode_run(writer: &mut BitWriter, mut run: usize, is_white: bool) {
    let makeup: &[(usize, u32, u8)] = if is_white { &WHITE_MAKEUP } else { &BLACK_MAKEUP };
    while run >= 64 {
        let (value, code, len) = makeup
            .iter()
            .chain(EXTENDED_MAKEUP.iter())
            .filter(|&&(value, _, _)| value <= run)
            .max_by_key(|&&(value, _, _)| value)
            .copied()
            .expect("a makeup code covering every run >= 64 exists");
        writer.write_bits(code, len);
        run -= value;
    }
    let (code, len) = if is_white { WHITE_TERM[run] } else { BLACK_TERM[run] };
    writer.write_bits(code, len);
}

fn decode_1d_row(columns: usize, reader: &mut BitReader) -> Result<Vec<bool>> {
    let mut row = vec![false; columns];
    let mut pos = 0usize;
    let mut is_white = true;
    while pos < columns {
        let run = read_run(reader, is_white)?;
        let end = (pos + run).min(columns);
        if !is_white {
            for b in row.iter_mut().take(end).skip(pos) {
                *b = true;
            }
        }
        pos = end;
        is_white = !is_white;
    }
    Ok(row)
}

/// Inverse of `encode_2d_row`: every mode code read advances `a0` and
/// `color` using the exact expressions `encode_2d_row` used to produce
/// them, so this is a direct read-back rather than an independent
/// re-derivation of the T.6 state machine.
fn decode_2d_row(reference: &[bool], columns: usize, reader: &mut BitReader) -> Result<Vec<bool>> {
    let ref_ce = changing_elements(reference, columns);
    let mut row = vec![false; columns];

    let mut a0: isize = -1;
    let mut color = false; // false = white
    let mut rpos = 0usize;

    while (a0 as i64) < columns as i64 {
        while rpos < ref_ce.len() && (ref_ce[rpos] as isize) <= a0 {
            rpos += 1;
        }
        let mut b1_idx = rpos;
        if b1_idx < ref_ce.len() && color_at(b1_idx) == color {
            b1_idx += 1;
        }
        let b1 = ref_ce.get(b1_idx).copied().unwrap_or(columns);
        let b2 = ref_ce.get(b1_idx + 1).copied().unwrap_or(columns);

        match read_mode_code(reader)? {
            ModeCode::Pass => {
                fill_run(&mut row, a0.max(0) as usize, b2, color);
                a0 = b2 as isize;
            }
            ModeCode::Horizontal => {
                let a0_eff = a0.max(0) as usize;
                let run1 = read_run(reader, !color)?;
                let a1 = (a0_eff + run1).min(columns);
                let run2 = read_run(reader, color)?;
                let a2 = (a1 + run2).min(columns);
                fill_run(&mut row, a0_eff, a1, color);
                fill_run(&mut row, a1, a2, !color);
                a0 = a2 as isize;
            }
            ModeCode::Vertical(delta) => {
                let a1 = (b1 as isize + delta as isize).clamp(0, columns as isize) as usize;
                fill_run(&mut row, a0.max(0) as usize, a1, color);
                a0 = a1 as isize;
                color = !color;
            }
        }
    }
    Ok(row)
}

fn fill_run(row: &mut [bool], start: usize, end: usize, is_black: bool) {
    if is_black {
        for b in row.iter_mut().take(end.min(row.len())).skip(start) {
            *b = true;
        }
    }
}

#[derive(Clone, Copy)]
enum ModeCode {
    Pass,
    Horizontal,
    Vertical(i8),
}

/// Reads one 2D mode code bit-by-bit against the fixed set `encode_2d_row`
/// writes (pass, horizontal, vertical -3..=3).
fn read_mode_code(reader: &mut BitReader) -> Result<ModeCode> {
    let mut code: u32 = 0;
    for len in 1..=7u8 {
        let bit = reader.read_bit().ok_or_else(|| Error::FilterFailure {
            filter: "CCITTFaxDecode",
            message: "unexpected end of data while reading a mode code".into(),
        })?;
        code = (code << 1) | u32::from(bit);
        let mode = match (code, len) {
            (0b1, 1) => Some(ModeCode::Vertical(0)),
            (0b011, 3) => Some(ModeCode::Vertical(1)),
            (0b010, 3) => Some(ModeCode::Vertical(-1)),
            (0b001, 3) => Some(ModeCode::Horizontal),
            (0b0001, 4) => Some(ModeCode::Pass),
            (0b000011, 6) => Some(ModeCode::Vertical(2)),
            (0b000010, 6) => Some(ModeCode::Vertical(-2)),
            (0b0000011, 7) => Some(ModeCode::Vertical(3)),
            (0b0000010, 7) => Some(ModeCode::Vertical(-3)),
            _ => None,
        };
        if let Some(mode) = mode {
            return Ok(mode);
        }
    }
    Err(Error::FilterFailure {
        filter: "CCITTFaxDecode",
        message: "no matching 2D mode code".into(),
    })
}

/// Reads a full run length (a color-specific terminating code, optionally
/// preceded by one or more makeup codes), the inverse of `encode_run`.
fn read_run(reader: &mut BitReader, is_white: bool) -> Result<usize> {
    let mut total = 0usize;
    loop {
        let (value, terminating) = read_one_run_code(reader, is_white)?;
        total += value;
        if terminating {
            return Ok(total);
        }
    }
}

fn read_one_run_code(reader: &mut BitReader, is_white: bool) -> Result<(usize, bool)> {
    let term_table: &[(u32, u8)] = if is_white { &WHITE_TERM } else { &BLACK_TERM };
    let makeup_table: &[(usize, u32, u8)] = if is_white { &WHITE_MAKEUP } else { &BLACK_MAKEUP };

    let mut code: u32 = 0;
    for len in 1..=13u8 {
        let bit = reader.read_bit().ok_or_else(|| Error::FilterFailure {
            filter: "CCITTFaxDecode",
            message: "unexpected end of data while reading a run code".into(),
        })?;
        code = (code << 1) | u32::from(bit);

        if let Some(run) = term_table.iter().position(|&(c, l)| l == len && c == code) {
            return Ok((run, true));
        }
        if let Some(&(value, ..)) = makeup_table
            .iter()
            .chain(EXTENDED_MAKEUP.iter())
            .find(|&&(_, c, l)| l == len && c == code)
        {
            return Ok((value, false));
        }
    }
    Err(Error::FilterFailure {
        filter: "CCITTFaxDecode",
        message: "no matching run-length code".into(),
    })
}

/// MSB-first bit reader over a byte slice, the read-side counterpart of
/// `BitWriter`.
struct BitReader<'a> {
    data: &'a [u8],
    byte_pos: usize,
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        BitReader { data, byte_pos: 0, bit_pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.byte_pos >= self.data.len()
    }

    fn read_bit(&mut self) -> Option<bool> {
        let byte = *self.data.get(self.byte_pos)?;
        let bit = (byte >> (7 - self.bit_pos)) & 1 == 1;
        self.bit_pos += 1;
        if self.bit_pos == 8 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }
        Some(bit)
    }

    fn align_byte(&mut self) {
        if self.bit_pos != 0 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }
    }
}

struct BitWriter {
    bytes: Vec<u8>,
    cur: u8,
    nbits: u8,
}

impl BitWriter {
    fn new() -> Self {
        BitWriter { bytes: Vec::new(), cur: 0, nbits: 0 }
    }

    fn write_bits(&mut self, code: u32, len: u8) {
        for i in (0..len).rev() {
            let bit = ((code >> i) & 1) as u8;
            self.cur = (self.cur << 1) | bit;
            self.nbits += 1;
            if self.nbits == 8 {
                self.bytes.push(self.cur);
                self.cur = 0;
                self.nbits = 0;
            }
        }
    }

    fn align_byte(&mut self) {
        if self.nbits > 0 {
            self.cur <<= 8 - self.nbits;
            self.bytes.push(self.cur);
            self.cur = 0;
            self.nbits = 0;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        self.align_byte();
        self.bytes
    }
}

/// ITU-T T.4 Table 2: white terminating codes, run lengths 0-63.
#[rustfmt::skip]
const WHITE_TERM: [(u32, u8); 64] = [
    (0x35, 8), (0x07, 6), (0x07, 4), (0x08, 4), (0x0B, 4), (0x0C, 4), (0x0E, 4), (0x0F, 4),
    (0x13, 5), (0x14, 5), (0x07, 5), (0x08, 5), (0x08, 6), (0x03, 6), (0x34, 6), (0x35, 6),
    (0x2A, 6), (0x2B, 6), (0x27, 7), (0x0C, 7), (0x08, 7), (0x17, 7), (0x03, 7), (0x04, 7),
    (0x28, 7), (0x2B, 7), (0x13, 7), (0x24, 7), (0x18, 7), (0x02, 8), (0x03, 8), (0x1A, 8),
    (0x1B, 8), (0x12, 8), (0x13, 8), (0x14, 8), (0x15, 8), (0x16, 8), (0x17, 8), (0x28, 8),
    (0x29, 8), (0x2A, 8), (0x2B, 8), (0x2C, 8), (0x2D, 8), (0x04, 8), (0x05, 8), (0x0A, 8),
    (0x0B, 8), (0x52, 8), (0x53, 8), (0x54, 8), (0x55, 8), (0x24, 8), (0x25, 8), (0x58, 8),
    (0x59, 8), (0x5A, 8), (0x5B, 8), (0x4A, 8), (0x4B, 8), (0x32, 8), (0x33, 8), (0x34, 8),
];

/// ITU-T T.4 Table 2: white makeup codes, run lengths 64-1728 (step 64).
#[rustfmt::skip]
const WHITE_MAKEUP: [(usize, u32, u8); 27] = [
    (64, 0x1B, 5), (128, 0x12, 5), (192, 0x17, 6), (256, 0x37, 7), (320, 0x36, 8), (384, 0x37, 8),
    (448, 0x64, 8), (512, 0x65, 8), (576, 0x68, 8), (640, 0x67, 8), (704, 0xCC, 9), (768, 0xCD, 9),
    (832, 0xD2, 9), (896, 0xD3, 9), (960, 0xD4, 9), (1024, 0xD5, 9), (1088, 0xD6, 9), (1152, 0xD7, 9),
    (1216, 0xD8, 9), (1280, 0xD9, 9), (1344, 0xDA, 9), (1408, 0xDB, 9), (1472, 0x98, 9), (1536, 0x99, 9),
    (1600, 0x9A, 9), (1664, 0x18, 6), (1728, 0x9B, 9),
];

/// ITU-T T.4 Table 3: black terminating codes, run lengths 0-63.
#[rustfmt::skip]
const BLACK_TERM: [(u32, u8); 64] = [
    (0x37, 10), (0x02, 3), (0x03, 2), (0x02, 2), (0x03, 3), (0x03, 4), (0x02, 4), (0x03, 5),
    (0x05, 6), (0x04, 6), (0x04, 7), (0x05, 7), (0x07, 7), (0x04, 8), (0x07, 8), (0x18, 9),
    (0x17, 10), (0x18, 10), (0x08, 10), (0x67, 11), (0x68, 11), (0x6C, 11), (0x37, 11), (0x28, 11),
    (0x17, 11), (0x18, 11), (0xCA, 12), (0xCB, 12), (0xCC, 12), (0xCD, 12), (0x68, 12), (0x69, 12),
    (0x6A, 12), (0x6B, 12), (0xD2, 12), (0xD3, 12), (0xD4, 12), (0xD5, 12), (0xD6, 12), (0xD7, 12),
    (0x6C, 12), (0x6D, 12), (0xDA, 12), (0xDB, 12), (0x54, 12), (0x55, 12), (0x56, 12), (0x57, 12),
    (0x64, 12), (0x65, 12), (0x52, 12), (0x53, 12), (0x24, 12), (0x37, 12), (0x38, 12), (0x27, 12),
    (0x28, 12), (0x58, 12), (0x59, 12), (0x2B, 12), (0x2C, 12), (0x5A, 12), (0x66, 12), (0x67, 12),
];

/// ITU-T T.4 Table 3: black makeup codes, run lengths 64-1728 (step 64).
#[rustfmt::skip]
const BLACK_MAKEUP: [(usize, u32, u8); 27] = [
    (64, 0x0F, 10), (128, 0xC8, 12), (192, 0xC9, 12), (256, 0x5B, 12), (320, 0x33, 12), (384, 0x34, 12),
    (448, 0x35, 12), (512, 0x6C, 13), (576, 0x6D, 13), (640, 0x4A, 13), (704, 0x4B, 13), (768, 0x4C, 13),
    (832, 0x4D, 13), (896, 0x72, 13), (960, 0x73, 13), (1024, 0x74, 13), (1088, 0x75, 13), (1152, 0x76, 13),
    (1216, 0x77, 13), (1280, 0x52, 13), (1344, 0x53, 13), (1408, 0x54, 13), (1472, 0x55, 13), (1536, 0x5A, 13),
    (1600, 0x5B, 13), (1664, 0x64, 13), (1728, 0x65, 13),
];

/// ITU-T T.4 Table 4: extended makeup codes, run lengths 1792-2560
/// (step 64), shared by both colors.
#[rustfmt::skip]
const EXTENDED_MAKEUP: [(usize, u32, u8); 13] = [
    (1792, 0x08, 11), (1856, 0x0C, 11), (1920, 0x0D, 11), (1984, 0x12, 12), (2048, 0x13, 12),
    (2112, 0x14, 12), (2176, 0x15, 12), (2240, 0x16, 12), (2304, 0x17, 12), (2368, 0x1C, 12),
    (2432, 0x1D, 12), (2496, 0x1E, 12), (2560, 0x1F, 12),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary;

    fn checkerboard(columns: usize, rows: usize) -> Vec<u8> {
        let row_bytes = columns.div_ceil(8);
        let mut out = vec![0u8; row_bytes * rows];
        for r in 0..rows {
            for c in 0..columns {
                if (r + c) % 3 == 0 {
                    out[r * row_bytes + c / 8] |= 0x80 >> (c % 8);
                }
            }
        }
        out
    }

    #[test]
    fn g4_round_trip_16x16() {
        let params = dictionary! {
            "K" => -1i64,
            "Columns" => 16i64,
            "Rows" => 16i64,
            "BlackIs1" => false,
        };
        let original = checkerboard(16, 16);
        let encoded = encode(&original, &params).unwrap();
        let decoded = decode(&encoded, &params).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn g3_1d_round_trip_16x16() {
        let params = dictionary! {
            "K" => 0i64,
            "Columns" => 16i64,
            "Rows" => 16i64,
            "BlackIs1" => false,
        };
        let original = checkerboard(16, 16);
        let encoded = encode(&original, &params).unwrap();
        let decoded = decode(&encoded, &params).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn solid_white_row_round_trips() {
        let params = dictionary! {
            "K" => -1i64,
            "Columns" => 32i64,
            "Rows" => 4i64,
        };
        let original = vec![0u8; 4 * 4];
        let encoded = encode(&original, &params).unwrap();
        let decoded = decode(&encoded, &params).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn g4_byte_aligned_round_trip() {
        let params = dictionary! {
            "K" => -1i64,
            "Columns" => 17i64,
            "Rows" => 9i64,
            "BlackIs1" => false,
            "EncodedByteAlign" => true,
        };
        let original = checkerboard(17, 9);
        let encoded = encode(&original, &params).unwrap();
        let decoded = decode(&encoded, &params).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn g3_1d_byte_aligned_round_trip() {
        let params = dictionary! {
            "K" => 0i64,
            "Columns" => 17i64,
            "Rows" => 9i64,
            "BlackIs1" => false,
            "EncodedByteAlign" => true,
        };
        let original = checkerboard(17, 9);
        let encoded = encode(&original, &params).unwrap();
        let decoded = decode(&encoded, &params).unwrap();
        assert_eq!(decoded, original);
    }
}
