use crate::{Dictionary, Document, Object, Result};

/// An indirect object's dictionary plus its raw (still filter-encoded)
/// byte payload.
///
/// `content` always holds the *encoded* form; `/Length` in `dict` must
/// equal `content.len()` once a document is written out. `start_position`
/// is only populated transiently while the stream's length depends on an
/// indirect `/Length` that hadn't yet been resolved at parse time.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stream {
    pub dict: Dictionary,
    pub content: Vec<u8>,
    pub start_position: Option<usize>,
}

impl Stream {
    pub fn new(mut dict: Dictionary, content: Vec<u8>) -> Self {
        dict.set("Length", content.len() as i64);
        Stream {
            dict,
            content,
            start_position: None,
        }
    }

    /// Build a stream whose content hasn't been read yet because its
    /// `/Length` was itself an indirect reference; the reader seeks back
    /// to `start_position` once that reference resolves.
    pub fn with_position(dict: Dictionary, start_position: usize) -> Self {
        Stream {
            dict,
            content: Vec::new(),
            start_position: Some(start_position),
        }
    }

    pub fn set_content(&mut self, content: Vec<u8>) {
        self.dict.set("Length", content.len() as i64);
        self.content = content;
        self.start_position = None;
    }

    /// Replace the stream's content with freshly filtered bytes and
    /// update its `/Filter` + `/DecodeParms` metadata to match.
    pub fn set_plain_content(&mut self, plain: Vec<u8>) {
        self.dict.remove(b"Filter");
        self.dict.remove(b"DecodeParms");
        self.set_content(plain);
    }

    /// Decode the stream's content by applying its `/Filter` chain in
    /// order, resolving `DecodeParms` (dictionary or array-of-dictionaries,
    /// with `Null` entries meaning "no params for this stage").
    pub fn decompressed_content(&self) -> Result<Vec<u8>> {
        crate::filters::decode_stream(&self.dict, &self.content, None)
    }

    /// Same as [`Stream::decompressed_content`] but resolves a `/Crypt`
    /// filter stage against the document's security handler, and
    /// indirect `/Length`/`DecodeParms` references through `document`.
    pub fn decompressed_content_with(&self, document: &Document, id: crate::ObjectId) -> Result<Vec<u8>> {
        crate::filters::decode_stream(&self.dict, &self.content, Some((document, id)))
    }

    pub(crate) fn write_into(&self, out: &mut Vec<u8>) {
        self.dict.write_into(out);
        out.extend_from_slice(b"\nstream\n");
        out.extend_from_slice(&self.content);
        out.extend_from_slice(b"\nendstream");
    }
}

impl From<&Stream> for Object {
    fn from(s: &Stream) -> Self {
        Object::Stream(s.clone())
    }
}
