use std::collections::BTreeMap;

use crate::encryption::{self, EncryptionState, Permissions};
use crate::xref::{Xref, XrefType};
use crate::{Dictionary, Error, Object, ObjectId, Result, Stream};

/// A parsed (or in-construction) PDF document: the object arena plus the
/// cross-reference table and trailer it was loaded from.
///
/// Indirect objects are never shared Rust-level pointers; every
/// cross-object edge (`/Parent`, `/Prev`, `/Kids`, ...) is a plain
/// [`ObjectId`] resolved back through [`Document::get_object`]. This is
/// how cycles in the page/outline tree are represented without
/// reference-counted back-edges.
#[derive(Debug, Clone)]
pub struct Document {
    /// The PDF version declared in the file header, e.g. `"1.7"`.
    pub version: String,
    /// The four high-bit marker bytes following the header, if the
    /// producer wrote one (`%âãÏÓ`).
    pub binary_mark: Vec<u8>,
    /// Every indirect object currently known to the document, keyed by
    /// its `(number, generation)`.
    pub objects: BTreeMap<ObjectId, Object>,
    /// Byte offset of the cross-reference section this document was
    /// loaded from (0 for a freshly constructed document).
    pub xref_start: usize,
    /// The resolved cross-reference table (after following every
    /// `/Prev` chain).
    pub reference_table: Xref,
    /// The trailer dictionary; not itself a numbered object.
    pub trailer: Dictionary,
    /// Highest object number currently assigned.
    pub max_id: u32,
    /// Security handler state, present only once a password has
    /// authenticated against an encrypted document's `/Encrypt` entry.
    pub encryption_state: Option<EncryptionState>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document: no objects, no trailer entries, PDF 1.5.
    pub fn new() -> Self {
        Document {
            version: "1.5".to_string(),
            binary_mark: Vec::new(),
            objects: BTreeMap::new(),
            xref_start: 0,
            reference_table: Xref::new(0, XrefType::CrossReferenceTable),
            trailer: Dictionary::new(),
            max_id: 0,
            encryption_state: None,
        }
    }

    /// Insert a new indirect object, assigning it the next free object
    /// number at generation 0.
    pub fn add_object<T: Into<Object>>(&mut self, object: T) -> ObjectId {
        self.max_id += 1;
        let id = (self.max_id, 0);
        self.objects.insert(id, object.into());
        id
    }

    /// Insert (or overwrite) an object at a caller-chosen id.
    pub fn set_object<T: Into<Object>>(&mut self, id: ObjectId, object: T) {
        if id.0 > self.max_id {
            self.max_id = id.0;
        }
        self.objects.insert(id, object.into());
    }

    pub fn get_object(&self, id: ObjectId) -> Result<&Object> {
        if self.requires_authentication(id) {
            return Err(Error::AuthenticationFailed);
        }
        self.objects.get(&id).ok_or(Error::ObjectNotFound)
    }

    /// Whether dereferencing `id` must fail with `AuthenticationFailed`:
    /// the document is encrypted, no password has authenticated it yet,
    /// and `id` isn't the one object spec.md §4.5.5/§7 exempts from that
    /// gate — the `/Encrypt` dictionary itself.
    fn requires_authentication(&self, id: ObjectId) -> bool {
        if self.encryption_state.is_some() {
            return false;
        }
        let Ok(encrypt_entry) = self.trailer.get(b"Encrypt") else {
            return false;
        };
        !matches!(encrypt_entry.as_reference(), Ok(encrypt_ref) if encrypt_ref == id)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Result<&mut Object> {
        self.objects.get_mut(&id).ok_or(Error::ObjectNotFound)
    }

    pub fn iter_objects(&self) -> impl Iterator<Item = (&ObjectId, &Object)> {
        self.objects.iter()
    }

    pub fn iterate_object_numbers(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    pub fn get_trailer(&self) -> &Dictionary {
        &self.trailer
    }

    /// Follow one `Reference` hop, if `object` is one; otherwise return
    /// it unchanged. An undefined object number is not an error — it
    /// resolves to [`Object::Null`] per PDF's conformance allowance for
    /// dangling references.
    pub fn dereference<'a>(&'a self, object: &'a Object) -> Result<(Option<ObjectId>, &'a Object)> {
        match object {
            Object::Reference(id) => match self.objects.get(id) {
                Some(obj) => Ok((Some(*id), obj)),
                None => Ok((Some(*id), &NULL_OBJECT)),
            },
            other => Ok((None, other)),
        }
    }

    /// Like [`Document::dereference`], but follows chained references
    /// (a reference whose target is itself a reference), bounded to
    /// guard against a cycle.
    pub fn resolve_reference<'a>(&'a self, mut object: &'a Object) -> Result<&'a Object> {
        let mut seen = std::collections::HashSet::new();
        loop {
            match object {
                Object::Reference(id) => {
                    if !seen.insert(*id) {
                        return Err(Error::ReferenceCycle(*id));
                    }
                    object = self.objects.get(id).unwrap_or(&NULL_OBJECT);
                }
                other => return Ok(other),
            }
        }
    }

    pub fn get_dict(&self, id: ObjectId) -> Result<&Dictionary> {
        self.get_object(id).and_then(Object::as_dict)
    }

    pub fn get_stream(&self, id: ObjectId) -> Result<&Stream> {
        self.get_object(id).and_then(Object::as_stream)
    }

    /// Decode a stream's content, resolving a `/Crypt` stage (if any)
    /// against this document's security handler.
    pub fn get_stream_decoded(&self, id: ObjectId) -> Result<Vec<u8>> {
        let stream = self.get_stream(id)?;
        stream.decompressed_content_with(self, id)
    }

    pub fn is_encrypted(&self) -> bool {
        self.trailer.get(b"Encrypt").is_ok() || self.encryption_state.is_some()
    }

    /// Attempt user authentication, then owner authentication, trying an
    /// empty password automatically if the supplied one is rejected.
    /// Returns the permission bits granted.
    pub fn authenticate(&mut self, password: &str) -> Result<Permissions> {
        let (state, permissions) = encryption::authenticate(self, password)
            .or_else(|_| encryption::authenticate(self, ""))?;
        self.encryption_state = Some(state);
        Ok(permissions)
    }

    /// Internal entry point used while loading: authenticate without
    /// storing the resulting state back onto a half-constructed
    /// document (the reader installs `encryption_state` itself once
    /// every raw object has been decrypted).
    pub(crate) fn authenticate_password(&self, password: &str) -> Result<(EncryptionState, Permissions)> {
        encryption::authenticate(self, password)
    }

    pub fn get_encryption_method(&self) -> Option<String> {
        self.encryption_state.as_ref().map(EncryptionState::describe)
    }

    /// A short human-readable summary of how this file is protected,
    /// independent of whether it has been authenticated yet.
    pub fn encryption_descriptor(&self) -> Result<String> {
        let dict = self
            .trailer
            .get(b"Encrypt")
            .ok()
            .and_then(|o| o.as_reference().ok())
            .and_then(|id| self.objects.get(&id))
            .or_else(|| self.trailer.get(b"Encrypt").ok())
            .ok_or(Error::MissingEntry("Encrypt".into()))?;
        let dict = dict.as_dict()?;
        let v = dict.get(b"V").and_then(Object::as_i64).unwrap_or(0);
        let r = dict.get(b"R").and_then(Object::as_i64).unwrap_or(0);
        Ok(format!("Standard security handler, V={v} R={r}"))
    }

    /// Renumber every object so ids are a dense `1..=N` run in traversal
    /// order, returning the `old -> new` mapping. Used by the writer
    /// before serializing so a document built up with arbitrary/sparse
    /// ids still produces a compact file.
    pub(crate) fn renumber(&mut self) -> BTreeMap<ObjectId, ObjectId> {
        let mut mapping = BTreeMap::new();
        let mut next = 1u32;
        for &old_id in self.objects.keys().collect::<Vec<_>>() {
            mapping.insert(old_id, (next, 0));
            next += 1;
        }

        let mut renumbered = BTreeMap::new();
        for (old_id, mut object) in std::mem::take(&mut self.objects) {
            remap_object(&mut object, &mapping);
            renumbered.insert(mapping[&old_id], object);
        }
        self.objects = renumbered;
        self.max_id = next.saturating_sub(1);
        remap_dictionary(&mut self.trailer, &mapping);
        mapping
    }

    pub(crate) fn max_id(&self) -> u32 {
        self.objects.keys().next_back().map(|id| id.0).unwrap_or(0)
    }
}

/// Reference error path: an undefined object number yields `Null`
/// rather than an error (spec conformance allowance).
static NULL_OBJECT: Object = Object::Null;

fn remap_object(object: &mut Object, mapping: &BTreeMap<ObjectId, ObjectId>) {
    match object {
        Object::Reference(id) => {
            if let Some(&new_id) = mapping.get(id) {
                *id = new_id;
            }
        }
        Object::Array(items) => {
            for item in items {
                remap_object(item, mapping);
            }
        }
        Object::Dictionary(dict) => remap_dictionary(dict, mapping),
        Object::Stream(stream) => remap_dictionary(&mut stream.dict, mapping),
        _ => {}
    }
}

fn remap_dictionary(dict: &mut Dictionary, mapping: &BTreeMap<ObjectId, ObjectId>) {
    let keys: Vec<Vec<u8>> = dict.iter().map(|(k, _)| k.clone()).collect();
    for key in keys {
        if let Ok(value) = dict.get_mut(&key) {
            remap_object(value, mapping);
        }
    }
}
