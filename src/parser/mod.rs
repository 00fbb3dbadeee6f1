//! nom-combinator grammar for PDF's object syntax: the lexical primitives
//! (names, strings, numbers), direct objects, indirect object headers,
//! classical cross-reference sections, and the trailer. Content-stream
//! operator syntax is out of scope for a document core and isn't parsed
//! here.
mod xref_stream;

use std::collections::HashSet;
use std::str::{self, FromStr};

use nom::branch::alt;
use nom::bytes::complete::{tag, take, take_while, take_while1, take_while_m_n};
use nom::character::complete::{digit0, digit1, one_of};
use nom::character::{is_hex_digit, is_oct_digit};
use nom::combinator::{map, map_opt, map_res, opt, verify};
use nom::error::{ErrorKind, ParseError as NomParseError};
use nom::multi::{fold_many0, fold_many1, many0};
use nom::sequence::{delimited, pair, preceded, separated_pair, terminated, tuple};
use nom::IResult;
use nom::Slice;
use nom_locate::LocatedSpan;

use crate::error::{Error, ParseError, XrefError};
use crate::reader::Reader;
use crate::xref::{Xref, XrefEntry, XrefType};
use crate::{Dictionary, Object, ObjectId, Result, Stream, StringFormat};

pub(crate) type ParserInput<'a> = LocatedSpan<&'a [u8], &'a str>;
pub(crate) type NomError<'a> = nom::error::Error<ParserInput<'a>>;
pub(crate) type NomResult<'a, O, E = NomError<'a>> = IResult<ParserInput<'a>, O, E>;

pub(crate) use xref_stream::decode_xref_stream;

const MAX_BRACKET: usize = 100;

#[inline]
fn strip_nom<O>(r: NomResult<O>) -> Option<O> {
    r.ok().map(|(_, o)| o)
}

#[inline]
fn offset_stream(object: &mut Object, offset: usize) {
    if let Object::Stream(ref mut stream) = object {
        stream.start_position = stream.start_position.and_then(|sp| sp.checked_add(offset));
    }
}

pub(crate) fn eol(input: ParserInput) -> NomResult<ParserInput> {
    alt((tag(b"\r\n"), tag(b"\n"), tag(b"\r")))(input)
}

fn comment(input: ParserInput) -> NomResult<()> {
    map(tuple((tag(b"%"), take_while(|c: u8| !b"\r\n".contains(&c)), eol)), |_| ())(input)
}

#[inline]
fn is_whitespace(c: u8) -> bool {
    b" \t\n\r\0\x0C".contains(&c)
}

#[inline]
fn is_delimiter(c: u8) -> bool {
    b"()<>[]{}/%".contains(&c)
}

#[inline]
fn is_regular(c: u8) -> bool {
    !is_whitespace(c) && !is_delimiter(c)
}

#[inline]
fn is_direct_literal_string(c: u8) -> bool {
    !b"()\\\r\n".contains(&c)
}

fn white_space(input: ParserInput) -> NomResult<()> {
    map(take_while(is_whitespace), |_| ())(input)
}

fn space(input: ParserInput) -> NomResult<()> {
    fold_many0(alt((map(take_while1(is_whitespace), |_| ()), comment)), || {}, |_, _| ())(input)
}

fn integer(input: ParserInput) -> NomResult<i64> {
    let (i, _) = pair(opt(one_of("+-")), digit1)(input)?;
    let int_input = &input[..input.len() - i.len()];
    i64::from_str(str::from_utf8(int_input).unwrap())
        .map(|v| (i, v))
        .map_err(|_| nom::Err::Error(NomError::from_error_kind(i, ErrorKind::Digit)))
}

/// Real number, with tolerance for the PostScript-style exponent form
/// (`1.5e-3`) some producers emit though it's not strictly legal PDF.
fn real(input: ParserInput) -> NomResult<f64> {
    let (i, _) = tuple((
        opt(one_of("+-")),
        alt((
            map(tuple((digit1, tag(b"."), digit0)), |_| ()),
            map(pair(tag(b"."), digit1), |_| ()),
            map(digit1, |_| ()),
        )),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    ))(input)?;

    let float_input = &input[..input.len() - i.len()];
    f64::from_str(str::from_utf8(float_input).unwrap())
        .map(|v| (i, v))
        .map_err(|_| nom::Err::Error(NomError::from_error_kind(i, ErrorKind::Digit)))
}

fn hex_char(input: ParserInput) -> NomResult<u8> {
    map_res(
        verify(take(2usize), |h: &ParserInput| h.as_bytes().iter().copied().all(is_hex_digit)),
        |x: ParserInput| u8::from_str_radix(str::from_utf8(&x).unwrap(), 16),
    )(input)
}

fn oct_char(input: ParserInput) -> NomResult<u8> {
    map_res(take_while_m_n(1, 3, is_oct_digit), |x: ParserInput| {
        u16::from_str_radix(str::from_utf8(&x).unwrap(), 8).map(|o| o as u8)
    })(input)
}

fn name(input: ParserInput) -> NomResult<Vec<u8>> {
    preceded(
        tag(b"/"),
        many0(alt((
            preceded(tag(b"#"), hex_char),
            map_opt(take(1usize), |c: ParserInput| {
                if c[0] != b'#' && is_regular(c[0]) {
                    Some(c[0])
                } else {
                    None
                }
            }),
        ))),
    )(input)
}

fn escape_sequence(input: ParserInput) -> NomResult<Option<u8>> {
    preceded(
        tag(b"\\"),
        alt((
            map(oct_char, Some),
            map(eol, |_| None),
            map(tag(b"n"), |_| Some(b'\n')),
            map(tag(b"r"), |_| Some(b'\r')),
            map(tag(b"t"), |_| Some(b'\t')),
            map(tag(b"b"), |_| Some(b'\x08')),
            map(tag(b"f"), |_| Some(b'\x0C')),
            map(take(1usize), |c: ParserInput| Some(c[0])),
        )),
    )(input)
}

enum InnerLiteralString<'a> {
    Direct(ParserInput<'a>),
    Escape(Option<u8>),
    Eol(ParserInput<'a>),
    Nested(Vec<u8>),
}

impl<'a> InnerLiteralString<'a> {
    fn push(&self, output: &mut Vec<u8>) {
        match self {
            InnerLiteralString::Direct(s) | InnerLiteralString::Eol(s) => output.extend_from_slice(s),
            InnerLiteralString::Escape(e) => output.extend(e),
            InnerLiteralString::Nested(n) => output.extend_from_slice(n),
        }
    }
}

fn inner_literal_string(depth: usize) -> impl Fn(ParserInput) -> NomResult<Vec<u8>> {
    move |input| {
        fold_many0(
            alt((
                map(take_while1(is_direct_literal_string), InnerLiteralString::Direct),
                map(escape_sequence, InnerLiteralString::Escape),
                map(eol, InnerLiteralString::Eol),
                map(nested_literal_string(depth), InnerLiteralString::Nested),
            )),
            Vec::new,
            |mut out: Vec<u8>, value| {
                value.push(&mut out);
                out
            },
        )(input)
    }
}

fn nested_literal_string(depth: usize) -> impl Fn(ParserInput) -> NomResult<Vec<u8>> {
    move |input| {
        if depth == 0 {
            map(verify(tag(b"too deep"), |_| false), |_| vec![])(input)
        } else {
            map(delimited(tag(b"("), inner_literal_string(depth - 1), tag(b")")), |mut content| {
                content.insert(0, b'(');
                content.push(b')');
                content
            })(input)
        }
    }
}

fn literal_string(input: ParserInput) -> NomResult<Vec<u8>> {
    delimited(tag(b"("), inner_literal_string(MAX_BRACKET), tag(b")"))(input)
}

fn hex_digit(input: ParserInput) -> NomResult<u8> {
    map_opt(take(1usize), |c: ParserInput| str::from_utf8(&c).ok().and_then(|c| u8::from_str_radix(c, 16).ok()))(input)
}

fn hexadecimal_string(input: ParserInput) -> NomResult<Object> {
    map(
        delimited(
            tag(b"<"),
            terminated(
                fold_many0(
                    preceded(white_space, hex_digit),
                    || -> (Vec<u8>, bool) { (Vec::new(), false) },
                    |state, c| match state {
                        (mut out, false) => {
                            out.push(c << 4);
                            (out, true)
                        }
                        (mut out, true) => {
                            *out.last_mut().unwrap() |= c;
                            (out, false)
                        }
                    },
                ),
                white_space,
            ),
            tag(b">"),
        ),
        |(bytes, _)| Object::String(bytes, StringFormat::Hexadecimal),
    )(input)
}

fn boolean(input: ParserInput) -> NomResult<Object> {
    alt((map(tag(b"true"), |_| Object::Boolean(true)), map(tag(b"false"), |_| Object::Boolean(false))))(input)
}

fn null(input: ParserInput) -> NomResult<Object> {
    map(tag(b"null"), |_| Object::Null)(input)
}

fn array(input: ParserInput) -> NomResult<Vec<Object>> {
    delimited(pair(tag(b"["), space), many0(_direct_object), tag(b"]"))(input)
}

/// A dictionary entry whose value is absent or malformed: some producers
/// emit `/Key` immediately followed by another `/Key2` with nothing in
/// between. Treated as `/Key null` rather than failing the whole dictionary.
fn dictionary_entry(input: ParserInput) -> NomResult<(Vec<u8>, Object)> {
    let (i, key) = terminated(name, space)(input)?;
    match _direct_object(i) {
        Ok((rest, value)) => Ok((rest, (key, value))),
        Err(_) => {
            // Known malformation: a key directly abutted against the
            // `null` literal with no separating delimiter, e.g. "/Keynull ".
            // `name` has no boundary to stop on and swallows "null" as part
            // of the key; split it back out instead of keying the
            // dictionary under "Keynull".
            if key.len() > 4 && key.ends_with(b"null") {
                Ok((i, (key[..key.len() - 4].to_vec(), Object::Null)))
            } else {
                Ok((i, (key, Object::Null)))
            }
        }
    }
}

pub(crate) fn dictionary(input: ParserInput) -> NomResult<Dictionary> {
    delimited(
        pair(tag(b"<<"), space),
        fold_many0(dictionary_entry, Dictionary::new, |mut dict, (key, value)| {
            dict.set(key, value);
            dict
        }),
        tag(b">>"),
    )(input)
}

fn stream<'a>(input: ParserInput<'a>, reader: &Reader, already_seen: &mut HashSet<ObjectId>) -> NomResult<'a, Object> {
    let (i, dict) = terminated(dictionary, tuple((space, tag(b"stream"), nom::character::complete::space0, eol)))(input)?;

    let length = dict.get(b"Length").and_then(|value| {
        if let Ok(id) = value.as_reference() {
            reader.get_object(id, already_seen).and_then(|value| value.as_i64())
        } else {
            value.as_i64()
        }
    });

    if let Ok(length) = length {
        if length < 0 {
            return Err(nom::Err::Failure(NomError::from_error_kind(i, ErrorKind::LengthValue)));
        }
        let (i, data) = terminated(take(length as usize), pair(opt(eol), tag(b"endstream")))(i)?;
        Ok((i, Object::Stream(Stream::new(dict, data.to_vec()))))
    } else {
        Ok((i, Object::Stream(Stream::with_position(dict, input.len() - i.len()))))
    }
}

fn unsigned_int<I: FromStr>(input: ParserInput) -> NomResult<I> {
    map_res(digit1, |digits: ParserInput| I::from_str(str::from_utf8(&digits).unwrap()))(input)
}

fn object_id(input: ParserInput) -> NomResult<ObjectId> {
    pair(terminated(unsigned_int, space), terminated(unsigned_int, space))(input)
}

fn reference(input: ParserInput) -> NomResult<Object> {
    map(terminated(object_id, tag(b"R")), Object::Reference)(input)
}

fn _direct_objects(input: ParserInput) -> NomResult<Object> {
    alt((
        null,
        boolean,
        reference,
        map(real, Object::Real),
        map(integer, Object::Integer),
        map(name, Object::Name),
        map(literal_string, Object::string_literal),
        hexadecimal_string,
        map(array, Object::Array),
        map(dictionary, Object::Dictionary),
    ))(input)
}

fn _direct_object(input: ParserInput) -> NomResult<Object> {
    terminated(_direct_objects, space)(input)
}

fn object<'a>(input: ParserInput<'a>, reader: &Reader, already_seen: &mut HashSet<ObjectId>) -> NomResult<'a, Object> {
    terminated(alt((|input| stream(input, reader, already_seen), _direct_objects)), space)(input)
}

/// Parse a bare object with no `N G obj`/`endobj` wrapper, as found
/// inside an object stream's body.
pub fn parse_object(input: &[u8]) -> Result<Object> {
    let span = ParserInput::new_extra(input, "objstm");
    preceded(space, _direct_objects)(span)
        .map(|(_, obj)| obj)
        .map_err(|_| Error::Parse(ParseError::Syntax("malformed compressed object".into())))
}

pub fn indirect_object(
    input: &[u8],
    offset: usize,
    expected_id: Option<ObjectId>,
    reader: &Reader,
    already_seen: &mut HashSet<ObjectId>,
) -> Result<(ObjectId, Object)> {
    let span = ParserInput::new_extra(input, "pdf");
    let (id, mut obj) = _indirect_object(span.slice(offset..), offset, expected_id, reader, already_seen)?;
    offset_stream(&mut obj, offset);
    Ok((id, obj))
}

fn _indirect_object<'a>(
    input: ParserInput<'a>,
    offset: usize,
    expected_id: Option<ObjectId>,
    reader: &Reader,
    already_seen: &mut HashSet<ObjectId>,
) -> Result<(ObjectId, Object)> {
    let (i, (_, object_id)) = terminated(tuple((space, object_id)), pair(tag(b"obj"), space))(input)
        .map_err(|_| Error::IndirectObject { offset })?;
    if let Some(expected_id) = expected_id {
        if object_id != expected_id {
            return Err(Error::ObjectIdMismatch);
        }
    }

    let object_offset = input.len() - i.len();
    let (_, mut obj) = terminated(
        |i: ParserInput<'a>| object(i, reader, already_seen),
        tuple((space, opt(tag(b"endobj")), space)),
    )(i)
    .map_err(|_| Error::IndirectObject { offset })?;

    offset_stream(&mut obj, object_offset);
    Ok((object_id, obj))
}

pub fn header(input: &[u8]) -> Option<String> {
    let span = ParserInput::new_extra(input, "pdf");
    strip_nom(map_res(
        delimited(tag(b"%PDF-"), take_while(|c: u8| !b"\r\n".contains(&c)), pair(eol, nom::multi::many0_count(comment))),
        |v: ParserInput| str::from_utf8(&v).map(String::from),
    )(span))
}

pub fn binary_mark(input: &[u8]) -> Option<Vec<u8>> {
    let span = ParserInput::new_extra(input, "pdf");
    strip_nom(map(opt(tuple((tag(b"%"), take_while(|c: u8| !b"\r\n".contains(&c)), eol))), |m| {
        m.map(|(_, bytes, _)| bytes.to_vec()).unwrap_or_default()
    })(span))
}

fn xref(input: ParserInput) -> NomResult<Xref> {
    let xref_eol = map(alt((tag(b" \r"), tag(b" \n"), tag(b"\r\n"))), |_| ());
    let xref_entry = pair(
        separated_pair(unsigned_int, tag(b" "), unsigned_int::<u32>),
        delimited(tag(b" "), map(one_of("nf"), |k| k == 'n'), xref_eol),
    );

    let xref_section = pair(
        separated_pair(unsigned_int::<usize>, tag(b" "), unsigned_int::<u32>),
        preceded(pair(opt(tag(b" ")), eol), many0(xref_entry)),
    );

    delimited(
        pair(tag(b"xref"), eol),
        fold_many1(
            xref_section,
            || -> Xref { Xref::new(0, XrefType::CrossReferenceTable) },
            |mut xref, ((start, _count), entries)| {
                for (index, ((offset, generation), is_normal)) in entries.into_iter().enumerate() {
                    if is_normal {
                        if let Ok(generation) = generation.try_into() {
                            xref.insert((start + index) as u32, XrefEntry::Normal { offset, generation });
                        }
                    }
                }
                xref
            },
        ),
        space,
    )(input)
}

fn trailer(input: ParserInput) -> NomResult<Dictionary> {
    delimited(pair(tag(b"trailer"), space), dictionary, space)(input)
}

/// Parse either a classical `xref`/`trailer` pair, or (PDF 1.5+) a single
/// indirect object that is itself a cross-reference stream.
pub fn xref_and_trailer(input: &[u8], offset: usize, reader: &Reader) -> Result<(Xref, Dictionary)> {
    let span = ParserInput::new_extra(input, "pdf").slice(offset..);

    if let Ok((_, (mut xref_table, trailer_dict))) = pair(xref, trailer)(span) {
        xref_table.size = trailer_dict.get(b"Size").and_then(Object::as_i64).unwrap_or(0) as u32;
        return Ok((xref_table, trailer_dict));
    }

    let (_, obj) = _indirect_object(span, offset, None, reader, &mut HashSet::new())?;
    match obj {
        Object::Stream(stream) => decode_xref_stream(stream),
        _ => Err(Error::Xref(XrefError::Start)),
    }
}

pub fn xref_start(input: &[u8]) -> Option<i64> {
    let span = ParserInput::new_extra(input, "pdf");
    strip_nom(delimited(pair(tag(b"startxref"), eol), integer, tuple((eol, tag(b"%%EOF"), space)))(span))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_span(s: &[u8]) -> ParserInput {
        LocatedSpan::new_extra(s, "test")
    }

    fn tstrip<O>(r: NomResult<O>) -> Option<O> {
        r.ok().and_then(|(i, o)| if !i.is_empty() { None } else { Some(o) })
    }

    #[test]
    fn parse_real_number() {
        let real = |i| tstrip(real(i));
        assert_eq!(real(test_span(b"0.12")), Some(0.12));
        assert_eq!(real(test_span(b"-.12")), Some(-0.12));
        assert_eq!(real(test_span(b"10.")), Some(10.0));
    }

    #[test]
    fn parse_real_with_exponent() {
        let real = |i| tstrip(real(i));
        assert_eq!(real(test_span(b"1.5e-3")), Some(1.5e-3));
        assert_eq!(real(test_span(b"2E2")), Some(200.0));
    }

    #[test]
    fn parse_string() {
        let literal_string = |i| tstrip(literal_string(i));
        let data = vec![
            ("()", ""),
            ("(text())", "text()"),
            ("(text\r\n\\\\(nested\\t\\b\\f))", "text\r\n\\(nested\t\x08\x0C)"),
            ("(text\\0\\53\\053\\0053)", "text\0++\x053"),
            ("(text line\\\n())", "text line()"),
        ];
        for (input, expected) in data {
            assert_eq!(literal_string(test_span(input.as_bytes())), Some(expected.as_bytes().to_vec()));
        }
    }

    #[test]
    fn parse_name() {
        let (text, expected) = (b"/ABC#5f", b"ABC\x5F");
        assert_eq!(tstrip(name(test_span(text))), Some(expected.to_vec()));
        let (text, expected) = (b"/#cb#ce#cc#e5", b"\xcb\xce\xcc\xe5");
        assert_eq!(tstrip(name(test_span(text))), Some(expected.to_vec()));
    }

    #[test]
    fn hex_partial() {
        let out = tstrip(hexadecimal_string(test_span(b"<901FA>")));
        match out {
            Some(Object::String(s, _)) => assert_eq!(s, b"\x90\x1F\xA0".to_vec()),
            _ => panic!("unexpected {out:?}"),
        }
    }

    #[test]
    fn dictionary_tolerates_missing_value() {
        let dict = tstrip(dictionary(test_span(b"<< /A /B /C >>"))).unwrap();
        assert!(dict.get(b"A").unwrap().as_name().is_ok());
        assert!(dict.get(b"C").unwrap().is_null());
    }

    #[test]
    fn dictionary_splits_key_abutted_against_null() {
        let dict = tstrip(dictionary(test_span(b"<< /Keynull /C 1 >>"))).unwrap();
        assert!(!dict.has(b"Keynull"));
        assert!(dict.get(b"Key").unwrap().is_null());
        assert_eq!(dict.get(b"C").unwrap().as_i64().unwrap(), 1);
    }

    #[test]
    fn big_generation_value() {
        let input: &[u8] = concat!(
            "xref\n",
            "0 1\n",
            "0000000000 65536 f \n",
            "0 16\n",
            "0000000000 65535 f \n",
            "0000153238 00000 n \n",
            "0000000019 00000 n \n",
            "0000000313 00000 n \n",
            "0000000333 00000 n \n",
            "0000145531 00000 n \n",
            "0000153407 00000 n \n",
            "0000145554 00000 n \n",
            "0000152303 00000 n \n",
            "0000152324 00000 n \n",
            "0000152514 00000 n \n",
            "0000152880 00000 n \n",
            "0000153106 00000 n \n",
            "0000153139 00000 n \n",
            "0000153532 00000 n \n",
            "0000153629 00000 n \n",
            "trailer\n",
            "<</Size 16/Root 14 0 R>>\n",
        )
        .as_bytes();
        match xref(test_span(input)) {
            Ok((_, re)) => assert_eq!(re.entries.len(), 15),
            Err(err) => panic!("unexpected {err:?}"),
        }
    }
}
