//! An incrementally-updatable view over a loaded [`Document`]: the
//! original bytes plus a snapshot of the object graph as it stood at
//! load time, so [`IncrementalDocument::save`] can append only the
//! objects a caller actually changed — a new revision tacked onto the
//! file's tail rather than a full rewrite (spec §6.1's `/Prev` chain,
//! in the direction a writer produces it instead of a reader consumes
//! it).
use std::collections::BTreeMap;
use std::io::Write as IoWrite;

use rand::RngCore;

use crate::xref::{Xref, XrefEntry, XrefType};
use crate::{Document, Error, Object, ObjectId, Result};

/// A document loaded from bytes that are still available for an
/// incremental save. Every object present at load time is fingerprinted
/// by its serialized form; [`IncrementalDocument::save`] diffs the
/// current object table against that fingerprint to find what changed.
#[derive(Debug, Clone)]
pub struct IncrementalDocument {
    original_bytes: Vec<u8>,
    baseline: BTreeMap<ObjectId, Vec<u8>>,
    document: Document,
}

impl IncrementalDocument {
    pub(crate) fn create_from(original_bytes: Vec<u8>, document: Document) -> Self {
        let baseline = document
            .objects
            .iter()
            .map(|(&id, object)| {
                let mut bytes = Vec::new();
                object.write_into(&mut bytes);
                (id, bytes)
            })
            .collect();
        IncrementalDocument {
            original_bytes,
            baseline,
            document,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// The file bytes this view was loaded from, unmodified.
    pub fn original_bytes(&self) -> &[u8] {
        &self.original_bytes
    }

    /// Objects new or changed since load, in ascending object-number
    /// order (deterministic layout for the appended revision).
    fn changed_objects(&self) -> Vec<(ObjectId, Object)> {
        let mut changed = Vec::new();
        for (&id, object) in self.document.objects.iter() {
            let mut bytes = Vec::new();
            object.write_into(&mut bytes);
            match self.baseline.get(&id) {
                Some(previous) if previous == &bytes => {}
                _ => changed.push((id, object.clone())),
            }
        }
        changed
    }

    /// Objects present at load time but removed from the object table
    /// since — these must be written as free entries in the new xref
    /// section, or the old revision's copy would still resolve.
    fn deleted_objects(&self) -> Vec<u32> {
        self.baseline
            .keys()
            .filter(|id| !self.document.objects.contains_key(id))
            .map(|id| id.0)
            .collect()
    }

    /// Append a new revision containing only the objects changed,
    /// added, or removed since load: updated objects, a fresh xref
    /// section chained to the original via `/Prev`, and a trailer whose
    /// `/Root` and `/Info` carry forward unless the caller changed them.
    ///
    /// Encryption is not re-applied on this path; an encrypted source
    /// document should be rewritten with [`crate::Writer`] instead.
    pub fn save<W: IoWrite>(&self, sink: &mut W) -> Result<()> {
        let changed = self.changed_objects();
        let deleted = self.deleted_objects();

        let mut out = self.original_bytes.clone();
        if !out.ends_with(b"\n") {
            out.push(b'\n');
        }

        let mut xref = Xref::new(0, XrefType::CrossReferenceTable);
        for (id, object) in &changed {
            xref.insert(id.0, XrefEntry::Normal { offset: out.len() as u32, generation: id.1 });
            write_indirect_object(&mut out, *id, object);
        }
        for obj_num in deleted {
            xref.insert(obj_num, XrefEntry::Free { next: 0, generation: 65535 });
        }

        if xref.entries.is_empty() {
            // Nothing changed: still emit a syntactically valid (empty)
            // revision rather than silently doing nothing.
            xref.insert(0, XrefEntry::Free { next: 0, generation: 65535 });
        }

        let xref_start = out.len();
        write_classical_xref_section(&mut out, &xref);

        let mut trailer = self.document.trailer.clone();
        trailer.set("Size", (self.document.max_id() + 1) as i64);
        trailer.set("Prev", self.document.xref_start as i64);
        if !trailer.has(b"ID") {
            let id = Object::string_literal(random_id());
            trailer.set("ID", Object::Array(vec![id.clone(), id]));
        }

        out.extend_from_slice(b"trailer\n");
        trailer.write_into(&mut out);
        out.extend_from_slice(b"\nstartxref\n");
        write_usize(&mut out, xref_start);
        out.extend_from_slice(b"\n%%EOF");

        sink.write_all(&out).map_err(Error::Io)
    }
}

fn write_indirect_object(out: &mut Vec<u8>, id: ObjectId, object: &Object) {
    let mut buf = itoa::Buffer::new();
    out.extend_from_slice(buf.format(id.0).as_bytes());
    out.push(b' ');
    out.extend_from_slice(buf.format(id.1).as_bytes());
    out.extend_from_slice(b" obj\n");
    object.write_into(out);
    out.extend_from_slice(b"\nendobj\n");
}

/// Emit a sparse classical xref section: a single subsection per
/// contiguous run of object numbers actually touched by this revision,
/// rather than `0 size` covering the whole file (most of which this
/// revision says nothing about).
fn write_classical_xref_section(out: &mut Vec<u8>, xref: &Xref) {
    out.extend_from_slice(b"xref\n");
    let ids: Vec<u32> = xref.entries.keys().copied().collect();
    let mut i = 0;
    while i < ids.len() {
        let start = ids[i];
        let mut end = start;
        while i + 1 < ids.len() && ids[i + 1] == end + 1 {
            i += 1;
            end = ids[i];
        }
        let count = end - start + 1;
        write_usize(out, start as usize);
        out.push(b' ');
        write_usize(out, count as usize);
        out.push(b'\n');
        for id in start..=end {
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
        i += 1;
    }
}

fn write_usize(out: &mut Vec<u8>, value: usize) {
    let mut buf = itoa::Buffer::new();
    out.extend_from_slice(buf.format(value).as_bytes());
}

fn random_id() -> Vec<u8> {
    let mut buf = [0u8; 16];
    rand::rng().fill_bytes(&mut buf);
    buf.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dictionary;

    #[test]
    fn save_with_no_changes_still_appends_valid_revision() {
        let mut writer = crate::Writer::new();
        let mut bytes = Vec::new();
        writer.write(&mut bytes).unwrap();

        let incremental: IncrementalDocument = bytes.as_slice().try_into().unwrap();
        let mut out = Vec::new();
        incremental.save(&mut out).unwrap();

        let reloaded = Document::load_mem(&out).unwrap();
        assert!(reloaded.trailer.has(b"Root"));
    }

    #[test]
    fn save_appends_only_changed_objects() {
        let mut writer = crate::Writer::new();
        let mut bytes = Vec::new();
        writer.write(&mut bytes).unwrap();

        let mut incremental: IncrementalDocument = bytes.as_slice().try_into().unwrap();
        let info_id = incremental
            .document()
            .trailer
            .get(b"Info")
            .unwrap()
            .as_reference()
            .unwrap();
        let mut info = Dictionary::new();
        info.set("Title", Object::string_literal(b"Updated".to_vec()));
        incremental.document_mut().set_object(info_id, info);

        let mut out = Vec::new();
        incremental.save(&mut out).unwrap();
        assert!(out.len() > bytes.len());
        assert!(out.starts_with(&bytes[..bytes.len().saturating_sub(0)]) || out.starts_with(b"%PDF"));

        let reloaded = Document::load_mem(&out).unwrap();
        let reloaded_info = reloaded.get_dict(info_id).unwrap();
        assert_eq!(reloaded_info.get(b"Title").unwrap().as_str().unwrap(), b"Updated");
    }
}
