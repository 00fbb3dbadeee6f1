use std::fmt;

use crate::{Dictionary, Error, ObjectId, Result, Stream};

/// Which syntax a [`Object::String`] was written in, preserved across a
/// read so re-serializing an untouched string reproduces the same bytes
/// (this matters for documents whose byte-range signatures cover the
/// literal source text).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StringFormat {
    Literal,
    Hexadecimal,
}

/// The tagged union every PDF primitive value collapses into.
///
/// `Reference` is unresolved; tracing through it requires a `Document`
/// (see [`crate::Document::dereference`]). A `Stream` always carries its
/// own dictionary, never appears nested inside another value except as
/// the direct object of an indirect definition.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Name(Vec<u8>),
    String(Vec<u8>, StringFormat),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    Stream(Stream),
    Reference(ObjectId),
}

impl Object {
    pub fn string_literal<S: Into<Vec<u8>>>(bytes: S) -> Self {
        Object::String(bytes.into(), StringFormat::Literal)
    }

    pub fn enum_variant(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::Name(_) => "Name",
            Object::String(..) => "String",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream(_) => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Object::Boolean(b) => Ok(*b),
            other => Err(Error::ObjectType {
                expected: "Boolean",
                found: other.enum_variant(),
            }),
        }
    }

    pub fn as_i64(&self) -> Result<i64> {
        match self {
            Object::Integer(i) => Ok(*i),
            Object::Real(f) => Ok(*f as i64),
            other => Err(Error::ObjectType {
                expected: "Integer",
                found: other.enum_variant(),
            }),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Object::Integer(i) => Ok(*i as f64),
            Object::Real(f) => Ok(*f),
            other => Err(Error::ObjectType {
                expected: "Real",
                found: other.enum_variant(),
            }),
        }
    }

    pub fn as_name(&self) -> Result<&[u8]> {
        match self {
            Object::Name(name) => Ok(name),
            other => Err(Error::ObjectType {
                expected: "Name",
                found: other.enum_variant(),
            }),
        }
    }

    pub fn as_str(&self) -> Result<&[u8]> {
        match self {
            Object::String(bytes, _) => Ok(bytes),
            other => Err(Error::ObjectType {
                expected: "String",
                found: other.enum_variant(),
            }),
        }
    }

    pub fn as_str_mut(&mut self) -> Result<&mut Vec<u8>> {
        match self {
            Object::String(bytes, _) => Ok(bytes),
            other => Err(Error::ObjectType {
                expected: "String",
                found: other.enum_variant(),
            }),
        }
    }

    pub fn as_array(&self) -> Result<&[Object]> {
        match self {
            Object::Array(arr) => Ok(arr),
            other => Err(Error::ObjectType {
                expected: "Array",
                found: other.enum_variant(),
            }),
        }
    }

    pub fn as_array_mut(&mut self) -> Result<&mut Vec<Object>> {
        match self {
            Object::Array(arr) => Ok(arr),
            other => Err(Error::ObjectType {
                expected: "Array",
                found: other.enum_variant(),
            }),
        }
    }

    pub fn as_dict(&self) -> Result<&Dictionary> {
        match self {
            Object::Dictionary(dict) => Ok(dict),
            Object::Stream(stream) => Ok(&stream.dict),
            other => Err(Error::ObjectType {
                expected: "Dictionary",
                found: other.enum_variant(),
            }),
        }
    }

    pub fn as_dict_mut(&mut self) -> Result<&mut Dictionary> {
        match self {
            Object::Dictionary(dict) => Ok(dict),
            Object::Stream(stream) => Ok(&mut stream.dict),
            other => Err(Error::ObjectType {
                expected: "Dictionary",
                found: other.enum_variant(),
            }),
        }
    }

    pub fn as_stream(&self) -> Result<&Stream> {
        match self {
            Object::Stream(stream) => Ok(stream),
            other => Err(Error::ObjectType {
                expected: "Stream",
                found: other.enum_variant(),
            }),
        }
    }

    pub fn as_stream_mut(&mut self) -> Result<&mut Stream> {
        match self {
            Object::Stream(stream) => Ok(stream),
            other => Err(Error::ObjectType {
                expected: "Stream",
                found: other.enum_variant(),
            }),
        }
    }

    pub fn as_reference(&self) -> Result<ObjectId> {
        match self {
            Object::Reference(id) => Ok(*id),
            other => Err(Error::ObjectType {
                expected: "Reference",
                found: other.enum_variant(),
            }),
        }
    }

    /// Follows `Reference`s is not possible without a document; this only
    /// strips the one level of indirection that doesn't require one: a
    /// plain owned value is already direct.
    pub fn trace_to_direct(&self) -> &Object {
        self
    }

    pub(crate) fn write_into(&self, out: &mut Vec<u8>) {
        match self {
            Object::Null => out.extend_from_slice(b"null"),
            Object::Boolean(true) => out.extend_from_slice(b"true"),
            Object::Boolean(false) => out.extend_from_slice(b"false"),
            Object::Integer(i) => {
                let mut buf = itoa::Buffer::new();
                out.extend_from_slice(buf.format(*i).as_bytes());
            }
            Object::Real(f) => write_real(*f, out),
            Object::Name(name) => write_name(name, out),
            Object::String(bytes, format) => write_string(bytes, *format, out),
            Object::Array(items) => {
                out.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b' ');
                    }
                    item.write_into(out);
                }
                out.push(b']');
            }
            Object::Dictionary(dict) => dict.write_into(out),
            Object::Stream(stream) => stream.write_into(out),
            Object::Reference((num, gen)) => {
                let mut buf = itoa::Buffer::new();
                out.extend_from_slice(buf.format(*num).as_bytes());
                out.push(b' ');
                out.extend_from_slice(buf.format(*gen).as_bytes());
                out.extend_from_slice(b" R");
            }
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_into(&mut out);
        out
    }
}

fn write_real(value: f64, out: &mut Vec<u8>) {
    // No exponential form on write; fixed precision sufficient to
    // round-trip the values content streams and dictionaries actually use.
    if value.fract() == 0.0 && value.abs() < 1e15 {
        let mut buf = itoa::Buffer::new();
        out.extend_from_slice(buf.format(value as i64).as_bytes());
    } else {
        let s = format!("{value:.6}");
        let trimmed = s.trim_end_matches('0');
        let trimmed = trimmed.trim_end_matches('.');
        out.extend_from_slice(trimmed.as_bytes());
    }
}

fn is_delimiter(c: u8) -> bool {
    b"()<>[]{}/%".contains(&c)
}

fn write_name(name: &[u8], out: &mut Vec<u8>) {
    out.push(b'/');
    for &b in name {
        if b.is_ascii_graphic() && !is_delimiter(b) && b != b'#' {
            out.push(b);
        } else {
            out.push(b'#');
            out.extend_from_slice(format!("{b:02X}").as_bytes());
        }
    }
}

fn write_string(bytes: &[u8], format: StringFormat, out: &mut Vec<u8>) {
    let needs_hex = format == StringFormat::Hexadecimal || bytes.iter().any(|&b| b > 0x7E && b != 0x0A && b != 0x0D);
    if needs_hex {
        out.push(b'<');
        for &b in bytes {
            out.extend_from_slice(format!("{b:02X}").as_bytes());
        }
        out.push(b'>');
    } else {
        out.push(b'(');
        for &b in bytes {
            match b {
                b'\n' => out.extend_from_slice(b"\\n"),
                b'\r' => out.extend_from_slice(b"\\r"),
                b'\t' => out.extend_from_slice(b"\\t"),
                0x08 => out.extend_from_slice(b"\\b"),
                0x0C => out.extend_from_slice(b"\\f"),
                b'(' => out.extend_from_slice(b"\\("),
                b')' => out.extend_from_slice(b"\\)"),
                b'\\' => out.extend_from_slice(b"\\\\"),
                _ => out.push(b),
            }
        }
        out.push(b')');
    }
}

impl fmt::Display for StringFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringFormat::Literal => write!(f, "literal"),
            StringFormat::Hexadecimal => write!(f, "hexadecimal"),
        }
    }
}

impl From<bool> for Object {
    fn from(v: bool) -> Self {
        Object::Boolean(v)
    }
}
impl From<i64> for Object {
    fn from(v: i64) -> Self {
        Object::Integer(v)
    }
}
impl From<f64> for Object {
    fn from(v: f64) -> Self {
        Object::Real(v)
    }
}
impl From<Vec<Object>> for Object {
    fn from(v: Vec<Object>) -> Self {
        Object::Array(v)
    }
}
impl From<Dictionary> for Object {
    fn from(v: Dictionary) -> Self {
        Object::Dictionary(v)
    }
}
impl From<Stream> for Object {
    fn from(v: Stream) -> Self {
        Object::Stream(v)
    }
}
impl From<ObjectId> for Object {
    fn from(v: ObjectId) -> Self {
        Object::Reference(v)
    }
}
impl From<&str> for Object {
    // A bare `&str` written at a dictionary value position (as in the
    // `dictionary!` macro) is always a PDF name in this codebase's usage
    // (`"Type" => "Catalog"`, `"Filter" => "FlateDecode"`); a literal PDF
    // string value is built explicitly via `Object::string_literal`.
    fn from(v: &str) -> Self {
        Object::Name(v.as_bytes().to_vec())
    }
}
