//! The write half of the document core: build a fresh [`Document`] (or
//! wrap one already loaded), optionally install a standard-security
//! encryption dictionary, then serialize the whole object graph back
//! to bytes with a cross-reference section and trailer (spec §6.1).
//!
//! Two output shapes are supported: a classical xref table (the
//! default, and the only shape compatible with an `encrypt()` call),
//! and an xref stream with objects packed into `/Type /ObjStm`
//! containers (opt in via [`SaveOptions::use_object_streams`], and
//! only taken when no encryption is pending — see `DESIGN.md`).
use std::collections::HashMap;
use std::io::Write as IoWrite;

use log::warn;
use rand::RngCore;

use crate::encryption::{self, EncryptMethod, EncryptionState, Permissions};
use crate::object_stream::{ObjectStreamBuilder, ObjectStreamConfig};
use crate::xref::{Xref, XrefEntry, XrefType};
use crate::{Dictionary, Document, Error, Object, ObjectId, Result, Stream};

/// Options controlling how [`Writer::write_with_options`] lays a
/// document out on disk. [`Writer::write`] uses [`SaveOptions::default`].
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Pack eligible objects into `/Type /ObjStm` containers and emit
    /// an xref stream instead of a classical table. Ignored (falls
    /// back to the classical table) when an `encrypt()` call is
    /// pending, since per-object encryption of compressed objects is
    /// not implemented.
    pub use_object_streams: bool,
    pub object_stream_config: ObjectStreamConfig,
}

impl Default for SaveOptions {
    fn default() -> Self {
        SaveOptions {
            use_object_streams: false,
            object_stream_config: ObjectStreamConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SaveOptionsBuilder {
    options: SaveOptions,
}

impl SaveOptionsBuilder {
    pub fn new() -> Self {
        SaveOptionsBuilder::default()
    }

    pub fn use_object_streams(mut self, value: bool) -> Self {
        self.options.use_object_streams = value;
        self
    }

    pub fn object_stream_config(mut self, config: ObjectStreamConfig) -> Self {
        self.options.object_stream_config = config;
        self
    }

    pub fn build(self) -> SaveOptions {
        self.options
    }
}

struct PendingEncryption {
    user_password: String,
    owner_password: String,
    revision: i64,
    permissions: Permissions,
    encrypt_metadata: bool,
}

/// Builds and serializes a PDF document. `new()` starts from an empty
/// Catalog/Pages/Info; `from_document` wraps a document already loaded
/// (re-saving after edits). Mutate the graph through `document_mut`,
/// attach well-known roles with `add_root_child`/`add_form_field`/
/// `set_outline_root`/`add_page`, schedule encryption with `encrypt`,
/// then consume the writer with `write`.
pub struct Writer {
    document: Document,
    root_id: ObjectId,
    pages_id: ObjectId,
    info_id: ObjectId,
    pending_encryption: Option<PendingEncryption>,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// A fresh document: an empty Catalog, an empty Pages tree
    /// (`Kids=[]`, `Count=0`), and an Info dictionary the caller can
    /// populate via [`Writer::info_mut`].
    pub fn new() -> Self {
        let mut document = Document::new();

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(Vec::new()));
        pages.set("Count", 0i64);
        let pages_id = document.add_object(pages);

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let root_id = document.add_object(catalog);

        let info_id = document.add_object(Dictionary::new());

        document.trailer.set("Root", Object::Reference(root_id));
        document.trailer.set("Info", Object::Reference(info_id));

        Writer {
            document,
            root_id,
            pages_id,
            info_id,
            pending_encryption: None,
        }
    }

    /// Wrap an already-built or already-loaded document for (re-)saving.
    /// `Pages` is discovered from the Catalog; callers whose document
    /// lacks one should set `/Pages` before calling `add_page`.
    pub fn from_document(document: Document) -> Self {
        let root_id = document.trailer.get(b"Root").and_then(Object::as_reference).unwrap_or((0, 0));
        let pages_id = document
            .get_dict(root_id)
            .ok()
            .and_then(|dict| dict.get(b"Pages").ok())
            .and_then(|o| o.as_reference().ok())
            .unwrap_or((0, 0));
        let info_id = document.trailer.get(b"Info").and_then(Object::as_reference).unwrap_or((0, 0));
        Writer {
            document,
            root_id,
            pages_id,
            info_id,
            pending_encryption: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn root_id(&self) -> ObjectId {
        self.root_id
    }

    pub fn pages_id(&self) -> ObjectId {
        self.pages_id
    }

    pub fn info_mut(&mut self) -> Result<&mut Dictionary> {
        self.document.get_object_mut(self.info_id).and_then(Object::as_dict_mut)
    }

    /// Set an already-built indirect object as a Catalog entry — an
    /// `/OpenAction`, an `/AcroForm`, anything the page/outline/form
    /// layer above this crate wants rooted at the document.
    pub fn add_root_child<K, V>(&mut self, key: K, value: V) -> Result<()>
    where
        K: Into<Vec<u8>>,
        V: Into<Object>,
    {
        let catalog = self.document.get_object_mut(self.root_id).and_then(Object::as_dict_mut)?;
        catalog.set(key, value);
        Ok(())
    }

    /// Register `field` under the Catalog's `/AcroForm /Fields` array,
    /// creating the `/AcroForm` dictionary on first use.
    pub fn add_form_field(&mut self, field: ObjectId) -> Result<()> {
        let acroform_id = match self
            .document
            .get_dict(self.root_id)
            .ok()
            .and_then(|c| c.get(b"AcroForm").ok())
            .and_then(|o| o.as_reference().ok())
        {
            Some(id) => id,
            None => {
                let mut acroform = Dictionary::new();
                acroform.set("Fields", Object::Array(Vec::new()));
                let id = self.document.add_object(acroform);
                self.add_root_child("AcroForm", Object::Reference(id))?;
                id
            }
        };
        let acroform = self.document.get_object_mut(acroform_id).and_then(Object::as_dict_mut)?;
        let fields = acroform.get_mut(b"Fields").and_then(Object::as_array_mut)?;
        fields.push(Object::Reference(field));
        Ok(())
    }

    /// Install `node` as the Catalog's `/Outlines` entry.
    pub fn set_outline_root(&mut self, node: ObjectId) -> Result<()> {
        self.add_root_child("Outlines", Object::Reference(node))
    }

    /// Append `page` to the Pages tree's `/Kids`, bumping `/Count`.
    pub fn add_page(&mut self, page: ObjectId) -> Result<()> {
        let pages = self.document.get_object_mut(self.pages_id).and_then(Object::as_dict_mut)?;
        let kids = pages.get_mut(b"Kids").and_then(Object::as_array_mut)?;
        kids.push(Object::Reference(page));
        let count = pages.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
        pages.set("Count", count + 1);
        Ok(())
    }

    /// Schedule a standard-security encryption dictionary at `revision`
    /// (2-6); actually generated and installed during `write`, once the
    /// trailer's `/ID` is known (it feeds R2-4 key derivation).
    pub fn encrypt(&mut self, user_password: &str, owner_password: &str, revision: i64, permissions: Permissions) {
        self.pending_encryption = Some(PendingEncryption {
            user_password: user_password.to_string(),
            owner_password: owner_password.to_string(),
            revision,
            permissions,
            encrypt_metadata: true,
        });
    }

    /// Renumber, encrypt (if scheduled), serialize, and emit a
    /// classical xref table + trailer.
    pub fn write<W: IoWrite>(self, sink: &mut W) -> Result<()> {
        self.write_with_options(sink, SaveOptions::default())
    }

    pub fn write_with_options<W: IoWrite>(mut self, sink: &mut W, options: SaveOptions) -> Result<()> {
        let mapping = self.document.renumber();
        self.root_id = *mapping.get(&self.root_id).unwrap_or(&self.root_id);
        self.pages_id = *mapping.get(&self.pages_id).unwrap_or(&self.pages_id);
        self.info_id = *mapping.get(&self.info_id).unwrap_or(&self.info_id);

        if !self.document.trailer.has(b"ID") {
            let id = Object::string_literal(random_id());
            self.document.trailer.set("ID", Object::Array(vec![id.clone(), id]));
        }

        let pending = self.pending_encryption.take();
        if options.use_object_streams && pending.is_none() {
            return self.write_with_object_streams(sink, options.object_stream_config);
        }
        if options.use_object_streams {
            warn!("encrypt() is pending; writing a classical xref table instead of packing object streams");
        }

        let encrypted = match pending {
            Some(pending) => Some(self.install_encryption(pending)?),
            None => None,
        };

        let mut out = Vec::new();
        write_header(&mut out, &self.document.version);

        let mut xref = Xref::new(0, XrefType::CrossReferenceTable);
        xref.insert(0, XrefEntry::Free { next: 0, generation: 65535 });

        for (&id, object) in self.document.objects.iter() {
            let mut object = object.clone();
            if let Some((ref state, encrypt_id)) = encrypted {
                if id != encrypt_id {
                    encryption::encrypt_object(state, id, &mut object).map_err(Error::Decryption)?;
                }
            }
            xref.insert(id.0, XrefEntry::Normal { offset: out.len() as u32, generation: id.1 });
            write_indirect_object(&mut out, id, &object);
        }

        let xref_start = out.len();
        write_classical_xref_table(&mut out, &xref);

        self.document.trailer.set("Size", (xref.max_id() + 1) as i64);
        out.extend_from_slice(b"trailer\n");
        self.document.trailer.write_into(&mut out);
        out.extend_from_slice(b"\nstartxref\n");
        write_usize(&mut out, xref_start);
        out.extend_from_slice(b"\n%%EOF");

        sink.write_all(&out).map_err(Error::Io)
    }

    /// Pack non-stream objects into `/Type /ObjStm` containers and emit
    /// everything (containers, remaining streams, and the xref stream
    /// itself) as plain top-level objects addressed by an xref stream.
    /// No encryption is applied on this path (see `DESIGN.md`).
    fn write_with_object_streams<W: IoWrite>(self, sink: &mut W, config: ObjectStreamConfig) -> Result<()> {
        let mut out = Vec::new();
        write_header(&mut out, &self.document.version);

        let mut xref = Xref::new(0, XrefType::CrossReferenceTable);
        xref.insert(0, XrefEntry::Free { next: 0, generation: 65535 });

        let mut builder = ObjectStreamBuilder::new(config);
        let mut direct: Vec<(ObjectId, Object)> = Vec::new();
        for (&id, object) in self.document.objects.iter() {
            match object {
                Object::Stream(_) => direct.push((id, object.clone())),
                _ => builder.push(id.0, object.clone()),
            }
        }

        let mut next_id = self.document.max_id().saturating_add(1);

        for (stream, contained) in builder.build()? {
            let container_id = (next_id, 0);
            next_id += 1;
            xref.insert(container_id.0, XrefEntry::Normal { offset: out.len() as u32, generation: 0 });
            write_indirect_object(&mut out, container_id, &Object::Stream(stream));
            for (obj_num, index) in contained {
                xref.insert(obj_num, XrefEntry::Compressed { container: container_id.0, index });
            }
        }

        for (id, object) in direct {
            xref.insert(id.0, XrefEntry::Normal { offset: out.len() as u32, generation: id.1 });
            write_indirect_object(&mut out, id, &object);
        }

        let xref_stream_id = (next_id, 0);
        let xref_offset = out.len();
        xref.insert(xref_stream_id.0, XrefEntry::Normal { offset: xref_offset as u32, generation: 0 });

        let mut trailer = self.document.trailer.clone();
        trailer.set("Size", (xref.max_id() + 1) as i64);
        trailer.set("Type", Object::Name(b"XRef".to_vec()));
        trailer.set("W", Object::Array(vec![Object::Integer(1), Object::Integer(4), Object::Integer(2)]));

        let rows = encode_xref_stream_rows(&xref);
        let mut xref_stream = Stream::new(trailer, rows);
        xref_stream.dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
        let compressed = crate::filters::encode_stream(&xref_stream.dict, &xref_stream.content)?;
        xref_stream.set_content(compressed);

        write_indirect_object(&mut out, xref_stream_id, &Object::Stream(xref_stream));

        out.extend_from_slice(b"startxref\n");
        write_usize(&mut out, xref_offset);
        out.extend_from_slice(b"\n%%EOF");

        sink.write_all(&out).map_err(Error::Io)
    }

    fn install_encryption(&mut self, pending: PendingEncryption) -> Result<(EncryptionState, ObjectId)> {
        let id0 = self
            .document
            .trailer
            .get(b"ID")
            .ok()
            .and_then(|o| o.as_array().ok())
            .and_then(|a| a.first())
            .and_then(|o| o.as_str().ok())
            .map(<[u8]>::to_vec)
            .unwrap_or_default();

        let generated = encryption::generate_params(
            &pending.user_password,
            &pending.owner_password,
            pending.revision,
            pending.permissions,
            pending.encrypt_metadata,
            &id0,
        )?;

        let mut encrypt_dict = Dictionary::new();
        encrypt_dict.set("Filter", Object::Name(b"Standard".to_vec()));
        encrypt_dict.set("V", generated.version);
        encrypt_dict.set("R", generated.revision);
        encrypt_dict.set("Length", generated.length_bits);
        encrypt_dict.set("P", generated.p as i64);
        encrypt_dict.set("O", Object::string_literal(generated.o.clone()));
        encrypt_dict.set("U", Object::string_literal(generated.u.clone()));
        if let Some(oe) = &generated.oe {
            encrypt_dict.set("OE", Object::string_literal(oe.clone()));
        }
        if let Some(ue) = &generated.ue {
            encrypt_dict.set("UE", Object::string_literal(ue.clone()));
        }
        if let Some(perms) = &generated.perms {
            encrypt_dict.set("Perms", Object::string_literal(perms.clone()));
        }
        encrypt_dict.set("EncryptMetadata", pending.encrypt_metadata);

        let stream_method = if generated.version <= 2 {
            EncryptMethod::Rc4
        } else if generated.version >= 5 {
            EncryptMethod::AesV3
        } else {
            EncryptMethod::AesV2
        };

        if generated.version >= 4 {
            let method_name: &[u8] = if generated.version >= 5 { b"AESV3" } else { b"AESV2" };
            let mut cf_entry = Dictionary::new();
            cf_entry.set("CFM", Object::Name(method_name.to_vec()));
            cf_entry.set("AuthEvent", Object::Name(b"DocOpen".to_vec()));
            cf_entry.set("Length", generated.length_bits / 8);
            let mut cf = Dictionary::new();
            cf.set("StdCF", cf_entry);
            encrypt_dict.set("CF", cf);
            encrypt_dict.set("StmF", Object::Name(b"StdCF".to_vec()));
            encrypt_dict.set("StrF", Object::Name(b"StdCF".to_vec()));
        }

        let encrypt_id = self.document.add_object(encrypt_dict);
        self.document.trailer.set("Encrypt", Object::Reference(encrypt_id));

        Ok((
            EncryptionState {
                version: generated.version,
                revision: generated.revision,
                file_key: generated.file_key,
                key_length_bytes: (generated.length_bits / 8) as usize,
                stream_method,
                string_method: stream_method,
                named_filters: HashMap::new(),
                encrypt_metadata: pending.encrypt_metadata,
            },
            encrypt_id,
        ))
    }
}

fn write_header(out: &mut Vec<u8>, version: &str) {
    out.extend_from_slice(b"%PDF-");
    out.extend_from_slice(version.as_bytes());
    out.push(b'\n');
    out.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
}

fn write_indirect_object(out: &mut Vec<u8>, id: ObjectId, object: &Object) {
    write_u32(out, id.0);
    out.push(b' ');
    write_u32(out, id.1 as u32);
    out.extend_from_slice(b" obj\n");
    object.write_into(out);
    out.extend_from_slice(b"\nendobj\n");
}

fn write_u32(out: &mut Vec<u8>, value: u32) {
    let mut buf = itoa::Buffer::new();
    out.extend_from_slice(buf.format(value).as_bytes());
}

fn write_usize(out: &mut Vec<u8>, value: usize) {
    let mut buf = itoa::Buffer::new();
    out.extend_from_slice(buf.format(value).as_bytes());
}

/// Emit `xref\n0 size\n` followed by one 20-byte row per object number
/// 0..size (an absent entry is treated as a free slot, per spec §6.1).
fn write_classical_xref_table(out: &mut Vec<u8>, xref: &Xref) {
    let size = xref.max_id() + 1;
    out.extend_from_slice(b"xref\n");
    write_u32(out, 0);
    out.push(b' ');
    write_u32(out, size);
    out.push(b'\n');
    for id in 0..size {
        match xref.get(id) {
            Some(XrefEntry::Normal { offset, generation }) => {
                out.extend_from_slice(format!("{offset:010} {generation:05} n \n").as_bytes());
            }
            Some(XrefEntry::Free { next, generation }) => {
                out.extend_from_slice(format!("{next:010} {generation:05} f \n").as_bytes());
            }
            _ => out.extend_from_slice(b"0000000000 65535 f \n"),
        }
    }
}

/// Encode one `/W [1 4 2]` row per object number `0..=max_id`, the
/// inverse of `parser::xref_stream::decode_xref_stream`.
fn encode_xref_stream_rows(xref: &Xref) -> Vec<u8> {
    let size = xref.max_id() + 1;
    let mut out = Vec::with_capacity(size as usize * 7);
    for id in 0..size {
        match xref.get(id) {
            Some(XrefEntry::Normal { offset, generation }) => {
                out.push(1);
                write_be(&mut out, *offset as u64, 4);
                write_be(&mut out, *generation as u64, 2);
            }
            Some(XrefEntry::Compressed { container, index }) => {
                out.push(2);
                write_be(&mut out, *container as u64, 4);
                write_be(&mut out, *index as u64, 2);
            }
            Some(XrefEntry::Free { next, generation }) => {
                out.push(0);
                write_be(&mut out, *next as u64, 4);
                write_be(&mut out, *generation as u64, 2);
            }
            _ => {
                out.push(0);
                write_be(&mut out, 0, 4);
                write_be(&mut out, 65535, 2);
            }
        }
    }
    out
}

fn write_be(out: &mut Vec<u8>, value: u64, width: usize) {
    let bytes = value.to_be_bytes();
    out.extend_from_slice(&bytes[8 - width..]);
}

fn random_id() -> Vec<u8> {
    let mut buf = [0u8; 16];
    rand::rng().fill_bytes(&mut buf);
    buf.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_has_catalog_pages_and_info() {
        let writer = Writer::new();
        assert!(writer.document().get_dict(writer.root_id).unwrap().type_is(b"Catalog"));
        assert!(writer.document().get_dict(writer.pages_id).unwrap().type_is(b"Pages"));
    }

    #[test]
    fn write_then_reload_round_trips_minimal_document() {
        let mut writer = Writer::new();
        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(writer.pages_id()));
        page.set("MediaBox", Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]));
        let page_id = writer.document_mut().add_object(page);
        writer.add_page(page_id).unwrap();

        let mut bytes = Vec::new();
        writer.write(&mut bytes).unwrap();

        let document = Document::load_mem(&bytes).unwrap();
        let root = document.trailer.get(b"Root").unwrap().as_reference().unwrap();
        let catalog = document.get_dict(root).unwrap();
        assert!(catalog.type_is(b"Catalog"));
        let pages_ref = catalog.get(b"Pages").unwrap().as_reference().unwrap();
        let pages = document.get_dict(pages_ref).unwrap();
        assert_eq!(pages.get(b"Count").unwrap().as_i64().unwrap(), 1);
    }

    #[test]
    fn write_with_object_streams_round_trips() {
        let mut writer = Writer::new();
        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(writer.pages_id()));
        let page_id = writer.document_mut().add_object(page);
        writer.add_page(page_id).unwrap();

        let mut bytes = Vec::new();
        writer.write_with_options(&mut bytes, SaveOptionsBuilder::new().use_object_streams(true).build()).unwrap();

        let document = Document::load_mem(&bytes).unwrap();
        let root = document.trailer.get(b"Root").unwrap().as_reference().unwrap();
        assert!(document.get_dict(root).unwrap().type_is(b"Catalog"));
    }

    #[test]
    fn encrypted_write_reloads_and_authenticates() {
        let mut writer = Writer::new();
        writer.encrypt("user", "owner", 4, Permissions::from_bits_truncate(-4));

        let mut bytes = Vec::new();
        writer.write(&mut bytes).unwrap();

        let mut document = Document::load_mem(&bytes).unwrap();
        assert!(document.is_encrypted());
        let permissions = document.authenticate("user").unwrap();
        assert_eq!(permissions.bits(), -4);
    }
}
