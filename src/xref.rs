use std::collections::BTreeMap;

/// Which cross-reference construct produced a given [`Xref`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefType {
    CrossReferenceTable,
    CrossReferenceStream,
}

/// A single row of the document-wide object-number -> location map.
///
/// Mirrors the three kinds a PDF xref can name: a classical table row
/// pointing at a byte offset, a row pointing into a compressed object
/// stream, and a free-list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntry {
    Normal { offset: u32, generation: u16 },
    Compressed { container: u32, index: u16 },
    Free { next: u32, generation: u16 },
    /// A free entry with a generation that can never be reused (65535),
    /// kept distinct from `Free` so writers don't recycle its slot.
    UnusableFree,
}

/// The resolved object-number -> location table for one document
/// revision, after following every `/Prev` chain.
#[derive(Debug, Clone)]
pub struct Xref {
    pub entries: BTreeMap<u32, XrefEntry>,
    pub size: u32,
    pub xref_type: XrefType,
}

impl Xref {
    pub fn new(size: u32, xref_type: XrefType) -> Self {
        Xref {
            entries: BTreeMap::new(),
            size,
            xref_type,
        }
    }

    pub fn get(&self, id: u32) -> Option<&XrefEntry> {
        self.entries.get(&id)
    }

    pub fn insert(&mut self, id: u32, entry: XrefEntry) {
        self.entries.insert(id, entry);
    }

    pub fn max_id(&self) -> u32 {
        self.entries.keys().next_back().copied().unwrap_or(0)
    }

    /// Merge an older revision's entries in, without overwriting entries
    /// this (newer) table already defines. Used when following `/Prev`.
    pub fn merge(&mut self, older: Xref) {
        for (id, entry) in older.entries {
            self.entries.entry(id).or_insert(entry);
        }
    }

    /// Same semantics as [`Xref::merge`], named to match call sites that
    /// read more naturally as "extend this table with older entries".
    pub fn extend(&mut self, older: Xref) {
        self.merge(older);
    }
}
