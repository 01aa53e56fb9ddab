//! Keys and key sets
//!
//! A [`KeySet`] is the staging area for a build: records are appended as-is,
//! duplicates included. [`TrieIndex::build`](crate::TrieIndex::build) reads it,
//! deduplicates, and writes each record's assigned id back.

extern crate alloc;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::hash::{Hash, Hasher};

use crate::error::{Error, Result};

/// Weight given to keys appended without one.
pub const DEFAULT_WEIGHT: f32 = 1.0;

/// A byte string with a weight and, once indexed, an identifier.
///
/// Equality, ordering and hashing look at the bytes only.
#[derive(Clone, Debug)]
pub struct Key {
    pub(crate) text: Vec<u8>,
    pub(crate) weight: f32,
    pub(crate) id: Option<usize>,
}

impl Key {
    pub fn new(text: impl AsRef<[u8]>, weight: f32) -> Self {
        Self {
            text: text.as_ref().to_vec(),
            weight,
            id: None,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.text
    }

    /// UTF-8 view of the key, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.text).ok()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[inline]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Identifier within the index that produced this key. `None` before build.
    #[inline]
    pub fn id(&self) -> Option<usize> {
        self.id
    }

    pub fn set_text(&mut self, text: impl AsRef<[u8]>) {
        self.text.clear();
        self.text.extend_from_slice(text.as_ref());
    }

    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    /// Reset to an empty, unweighted, unassigned key. Keeps the buffer.
    pub fn clear(&mut self) {
        self.text.clear();
        self.weight = DEFAULT_WEIGHT;
        self.id = None;
    }
}

impl Default for Key {
    fn default() -> Self {
        Self {
            text: Vec::new(),
            weight: DEFAULT_WEIGHT,
            id: None,
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.text.cmp(&other.text)
    }
}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        &self.text
    }
}

/// Ordered, appendable collection of keys. Input to a build.
#[derive(Clone, Debug, Default)]
pub struct KeySet {
    keys: Vec<Key>,
    total_length: usize,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` with weight `1.0`.
    #[inline]
    pub fn push(&mut self, text: impl AsRef<[u8]>) {
        self.append(text, DEFAULT_WEIGHT);
    }

    /// Append `text` with an explicit weight. No deduplication happens here.
    pub fn append(&mut self, text: impl AsRef<[u8]>, weight: f32) {
        self.push_key(Key::new(text, weight));
    }

    /// Append a prepared key. Any id it carries is discarded.
    pub fn push_key(&mut self, mut key: Key) {
        key.id = None;
        self.total_length += key.text.len();
        self.keys.push(key);
    }

    pub fn get(&self, index: usize) -> Result<&Key> {
        self.keys.get(index).ok_or(Error::OutOfRange {
            index,
            len: self.keys.len(),
        })
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Key> {
        self.keys.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sum of the byte lengths of every appended key.
    #[inline]
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.total_length = 0;
    }

    pub(crate) fn set_id(&mut self, index: usize, id: usize) {
        self.keys[index].id = Some(id);
    }
}

impl<T: AsRef<[u8]>> FromIterator<T> for KeySet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut keyset = KeySet::new();
        keyset.extend(iter);
        keyset
    }
}

impl<T: AsRef<[u8]>> Extend<T> for KeySet {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for text in iter {
            self.push(text);
        }
    }
}

impl<'a> IntoIterator for &'a KeySet {
    type Item = &'a Key;
    type IntoIter = core::slice::Iter<'a, Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}
