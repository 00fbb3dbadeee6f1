use crate::ObjectId;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error type returned by every fallible public API.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("xref error: {0}")]
    Xref(#[from] XrefError),

    #[error("decryption error: {0}")]
    Decryption(#[from] DecryptionError),

    #[error("the supplied password does not authenticate this document")]
    InvalidPassword,

    #[error("document is encrypted and has not been authenticated")]
    AuthenticationFailed,

    #[error("reference cycle detected while resolving object {}, {}", (.0).0, (.0).1)]
    ReferenceCycle(ObjectId),

    #[error("no xref entry for requested object")]
    MissingXrefEntry,

    #[error("offset {0} lies outside the document buffer")]
    InvalidOffset(usize),

    #[error("malformed stream: {0}")]
    InvalidStream(String),

    #[error("indirect object header at offset {offset} could not be parsed")]
    IndirectObject { offset: usize },

    #[error("object id in file does not match the id expected from the xref table")]
    ObjectIdMismatch,

    #[error("object not found")]
    ObjectNotFound,

    #[error("expected object of type {expected}, found {found}")]
    ObjectType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("dictionary is missing required entry /{0}")]
    MissingEntry(String),

    #[error("unsupported feature: {0}")]
    Unimplemented(&'static str),

    #[error("numeric conversion failed: {0}")]
    NumericCast(String),

    #[error("invalid decode parameters for filter {0}")]
    InvalidDecodeParams(&'static str),

    #[error("filter {filter} failed to decode: {message}")]
    FilterFailure { filter: &'static str, message: String },

    #[error("invalid inline content: {0}")]
    InvalidInlineImage(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("file does not start with a recognizable %PDF- header")]
    InvalidFileHeader,

    #[error("unexpected end of input while parsing")]
    EndOfInput,

    #[error("cross-reference table is malformed")]
    InvalidXref,

    #[error("trailer dictionary is malformed or missing required keys")]
    InvalidTrailer,

    #[error("dictionary is malformed")]
    InvalidDictionary,

    #[error("object stream header is malformed")]
    InvalidObjectStream,

    #[error("syntax error: {0}")]
    Syntax(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum XrefError {
    #[error("could not locate startxref / the initial cross-reference section")]
    Start,

    #[error("/Prev offset in trailer points outside the document")]
    PrevStart,

    #[error("/XRefStm offset in trailer points outside the document")]
    StreamStart,

    #[error("cross-reference stream /W entry is malformed")]
    InvalidFieldWidths,

    #[error("cross-reference stream /Index entry does not match its row count")]
    IndexMismatch,

    #[error("cross-reference section forms a /Prev cycle")]
    PrevCycle,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecryptionError {
    #[error("encryption dictionary is missing or malformed")]
    InvalidEncryptDictionary,

    #[error("unsupported security handler revision {0}")]
    UnsupportedRevision(i64),

    #[error("unsupported encryption key length")]
    InvalidKeyLength,

    #[error("ciphertext length is not a multiple of the block size")]
    InvalidCiphertextLength,

    #[error("padding on decrypted block is invalid")]
    InvalidPadding,

    #[error("/Perms integrity check failed")]
    PermsCheckFailed,

    #[error("named crypt filter {0:?} is not declared in /CF")]
    UnknownCryptFilter(Vec<u8>),
}
