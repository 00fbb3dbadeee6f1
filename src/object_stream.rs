//! `/Type /ObjStm` compressed object containers: a run of indirect
//! objects whose bodies are stored back to back inside one (usually
//! Flate-compressed) stream instead of each getting its own `N G obj`
//! slot in the file. The stream's decompressed content starts with a
//! header of `/N` pairs of `(object number, byte offset)`, followed by
//! the object bodies themselves at `/First` + offset.
use std::collections::BTreeMap;

use crate::{Dictionary, Error, Object, Result, Stream};

pub struct ObjectStream {
    pub objects: BTreeMap<u32, Object>,
}

impl ObjectStream {
    pub fn new(stream: &Stream) -> Result<Self> {
        let content = stream.decompressed_content()?;
        let n = stream.dict.get(b"N").and_then(|o| o.as_i64())? as usize;
        let first = stream.dict.get(b"First").and_then(|o| o.as_i64())? as usize;

        if first > content.len() {
            return Err(Error::Parse(crate::error::ParseError::InvalidObjectStream));
        }

        let header = &content[..first];
        let mut pairs = Vec::with_capacity(n);
        let mut numbers = header.split(|b| b.is_ascii_whitespace()).filter(|s| !s.is_empty());
        for _ in 0..n {
            let num_str = numbers.next().ok_or(Error::Parse(crate::error::ParseError::InvalidObjectStream))?;
            let off_str = numbers.next().ok_or(Error::Parse(crate::error::ParseError::InvalidObjectStream))?;
            let num: u32 = std::str::from_utf8(num_str)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or(Error::Parse(crate::error::ParseError::InvalidObjectStream))?;
            let off: usize = std::str::from_utf8(off_str)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or(Error::Parse(crate::error::ParseError::InvalidObjectStream))?;
            pairs.push((num, off));
        }

        let mut objects = BTreeMap::new();
        for (i, &(num, off)) in pairs.iter().enumerate() {
            let start = first + off;
            let end = pairs.get(i + 1).map(|&(_, next_off)| first + next_off).unwrap_or(content.len());
            if start > content.len() || end > content.len() || start > end {
                return Err(Error::Parse(crate::error::ParseError::InvalidObjectStream));
            }
            let object = crate::parser::parse_object(&content[start..end])?;
            objects.insert(num, object);
        }

        Ok(ObjectStream { objects })
    }
}

/// Configuration for packing objects into `/Type /ObjStm` containers
/// on write: how many objects share one container before a new one is
/// started, and whether the container itself is Flate-compressed.
#[derive(Debug, Clone, Copy)]
pub struct ObjectStreamConfig {
    pub max_objects_per_stream: usize,
    pub compress: bool,
}

impl Default for ObjectStreamConfig {
    fn default() -> Self {
        ObjectStreamConfig {
            max_objects_per_stream: 200,
            compress: true,
        }
    }
}

/// Packs a run of non-stream indirect objects into one or more
/// `/Type /ObjStm` containers, the write-side inverse of
/// [`ObjectStream::new`]. A stream can never itself be a compressed
/// object (PDF forbids nesting a stream inside an object stream), so
/// the writer filters those out before handing objects to the builder.
pub struct ObjectStreamBuilder {
    config: ObjectStreamConfig,
    pending: Vec<(u32, Object)>,
}

impl ObjectStreamBuilder {
    pub fn new(config: ObjectStreamConfig) -> Self {
        ObjectStreamBuilder {
            config,
            pending: Vec::new(),
        }
    }

    pub fn push(&mut self, number: u32, object: Object) {
        self.pending.push((number, object));
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Consume the builder, producing each container's stream object
    /// alongside the `(object number, index within this container)`
    /// pairs the writer needs to emit type-2 xref rows for them.
    pub fn build(self) -> Result<Vec<(Stream, Vec<(u32, u16)>)>> {
        let chunk_size = self.config.max_objects_per_stream.max(1);
        let mut out = Vec::new();
        for chunk in self.pending.chunks(chunk_size) {
            let mut header = Vec::new();
            let mut bodies = Vec::new();
            let mut index = Vec::with_capacity(chunk.len());
            for (i, (number, object)) in chunk.iter().enumerate() {
                let offset = bodies.len();
                object.write_into(&mut bodies);
                bodies.push(b'\n');

                let mut buf = itoa::Buffer::new();
                header.extend_from_slice(buf.format(*number).as_bytes());
                header.push(b' ');
                header.extend_from_slice(buf.format(offset).as_bytes());
                header.push(b' ');
                index.push((*number, i as u16));
            }
            let first = header.len();
            let mut content = header;
            content.extend_from_slice(&bodies);

            let mut dict = Dictionary::new();
            dict.set("Type", Object::Name(b"ObjStm".to_vec()));
            dict.set("N", chunk.len() as i64);
            dict.set("First", first as i64);

            let mut stream = Stream::new(dict, content);
            if self.config.compress {
                stream.dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
                let encoded = crate::filters::encode_stream(&stream.dict, &stream.content)?;
                stream.set_content(encoded);
            }

            out.push((stream, index));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_and_bodies() {
        let header = b"10 0 20 5\n";
        let body = b"true\nfalse";
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"ObjStm".to_vec()));
        dict.set("N", 2i64);
        dict.set("First", header.len() as i64);
        let content = [header.as_slice(), body.as_slice()].concat();
        let stream = Stream::new(dict, content);
        let obj_stream = ObjectStream::new(&stream).unwrap();
        assert_eq!(obj_stream.objects.len(), 2);
        assert!(obj_stream.objects.contains_key(&10));
        assert!(obj_stream.objects.contains_key(&20));
    }
}
