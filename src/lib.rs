//! A library for reading, decrypting, interpreting, re-encoding and
//! writing PDF documents: the object model and its parser/serializer,
//! the cross-reference machinery, the stream filter pipeline, and the
//! standard-security encryption handler.
//!
//! Higher-level concerns — page/annotation/form semantics, content
//! stream drawing, font parsing, image codec front-ends, text
//! extraction — are out of scope for this crate; they are built on top
//! of the contracts exposed here (`Document::get_object`,
//! `Stream::decompressed_content_with`, `Dictionary`, ...).

#[cfg(feature = "chrono")]
mod datetime;
pub mod dictionary;
mod document;
pub mod encryption;
pub mod error;
pub mod filters;
mod incremental_document;
mod object;
mod object_stream;
pub mod parser;
mod reader;
mod repair;
mod stream;
mod writer;
mod xref;

pub use dictionary::Dictionary;
pub use document::Document;
pub use encryption::{EncryptMethod, EncryptionState, EncryptionVersion, Permissions, SecurityHandlerRevision};
pub use error::{DecryptionError, Error, ParseError, Result, XrefError};
pub use incremental_document::IncrementalDocument;
pub use object::{Object, StringFormat};
pub use object_stream::{ObjectStream, ObjectStreamBuilder, ObjectStreamConfig};
pub use reader::{PdfMetadata, Reader};
pub use stream::Stream;
pub use writer::{SaveOptions, SaveOptionsBuilder, Writer};
pub use xref::{Xref, XrefEntry, XrefType};

/// `(object number, generation)`. PDF's own addressing scheme for an
/// indirect object; never wrapped in a newtype since every call site
/// destructures or compares it as a plain tuple.
pub type ObjectId = (u32, u16);

/// Build a [`Dictionary`] from `key => value` pairs, matching the way
/// dictionaries read in the PDF grammar itself.
///
/// ```
/// # use pdfcore::{dictionary, Object};
/// let dict = dictionary! {
///     "Type" => "Catalog",
///     "Count" => 3,
/// };
/// assert!(dict.has(b"Type"));
/// ```
#[macro_export]
macro_rules! dictionary {
    () => { $crate::Dictionary::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut dict = $crate::Dictionary::new();
        $(
            dict.set($key, $value);
        )+
        dict
    }};
}
