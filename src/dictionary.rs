use indexmap::IndexMap;

use crate::{Error, Object, Result};

/// An insertion-ordered Name -> Object mapping.
///
/// Order is preserved so re-serializing an unmodified document produces
/// byte-stable output; key comparison is exact byte equality (PDF names
/// are not Unicode-normalized).
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dictionary(IndexMap<Vec<u8>, Object>);

impl Dictionary {
    pub fn new() -> Self {
        Dictionary(IndexMap::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<Vec<u8>>,
        V: Into<Object>,
    {
        // Duplicate keys overwrite; IndexMap::insert already keeps the
        // original insertion position, matching first-definition-wins
        // elsewhere in the object model.
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &[u8]) -> Result<&Object> {
        self.0.get(key).ok_or_else(|| Error::MissingEntry(String::from_utf8_lossy(key).into_owned()))
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Result<&mut Object> {
        self.0
            .get_mut(key)
            .ok_or_else(|| Error::MissingEntry(String::from_utf8_lossy(key).into_owned()))
    }

    pub fn has(&self, key: &[u8]) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Object> {
        self.0.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &Object)> {
        self.0.iter()
    }

    pub fn get_type(&self) -> Result<&[u8]> {
        self.get(b"Type").and_then(Object::as_name)
    }

    pub fn type_is(&self, name: &[u8]) -> bool {
        matches!(self.get_type(), Ok(t) if t == name)
    }

    pub fn has_type(&self, name: &[u8]) -> bool {
        self.type_is(name)
    }

    pub(crate) fn write_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"<<");
        for (key, value) in &self.0 {
            let mut name_bytes = Vec::new();
            Object::Name(key.clone()).write_into(&mut name_bytes);
            out.extend_from_slice(&name_bytes);
            out.push(b' ');
            value.write_into(out);
        }
        out.extend_from_slice(b">>");
    }
}

impl<'a> IntoIterator for &'a Dictionary {
    type Item = (&'a Vec<u8>, &'a Object);
    type IntoIter = indexmap::map::Iter<'a, Vec<u8>, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(Vec<u8>, Object)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (Vec<u8>, Object)>>(iter: T) -> Self {
        Dictionary(IndexMap::from_iter(iter))
    }
}
