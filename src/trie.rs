//! Trie index lifecycle: build, persist, load, map, query.
//!
//! A [`TrieIndex`] always queries one contiguous image. Building produces the
//! image in memory; `load` reads it from a file; `mmap` maps the file and
//! queries the mapped pages directly. All three answer identically.

extern crate alloc;
use alloc::collections::BinaryHeap;
use alloc::vec::Vec;
use core::cmp::{Ordering, Reverse};
use core::fmt;

#[cfg(feature = "std")]
use std::path::Path;

use tracing::debug;

use crate::agent::{AgentState, SearchAgent};
use crate::builder::build_parts;
use crate::config::OpenOptions;
use crate::error::{Error, Result, IN_MEMORY};
use crate::format::{self, Layout};
use crate::key::{Key, KeySet};
use crate::search::{CommonPrefixIter, PredictiveIter, TrieView};

/// Path label for images read from or written to a generic stream.
#[cfg(feature = "std")]
const STREAM: &str = "<stream>";

enum Backing {
    Owned(Vec<u8>),
    #[cfg(feature = "mmap")]
    Mapped(memmap2::Mmap),
}

impl Backing {
    fn bytes(&self) -> &[u8] {
        match self {
            Backing::Owned(bytes) => bytes,
            #[cfg(feature = "mmap")]
            Backing::Mapped(mmap) => mmap.as_ref(),
        }
    }
}

struct Loaded {
    backing: Backing,
    layout: Layout,
}

/// Immutable compressed dictionary.
///
/// Read-only once built or loaded: share it across threads (`&TrieIndex` is
/// `Sync`) and give each thread its own [`SearchAgent`].
///
/// # Example
/// ```
/// use alice_trie::{KeySet, SearchAgent, TrieIndex};
///
/// let mut keyset: KeySet = ["a", "ab", "abc", "b"].into_iter().collect();
/// let trie = TrieIndex::from_keyset(&mut keyset).unwrap();
///
/// let mut agent = SearchAgent::new();
/// agent.set_query("abc");
/// let mut prefixes = Vec::new();
/// while trie.common_prefix_search(&mut agent) {
///     prefixes.push(agent.key().as_bytes().to_vec());
/// }
/// assert_eq!(prefixes, [b"a".to_vec(), b"ab".to_vec(), b"abc".to_vec()]);
/// ```
#[derive(Default)]
pub struct TrieIndex {
    inner: Option<Loaded>,
}

impl TrieIndex {
    /// An index holding no structure. Every search misses.
    pub fn new() -> Self {
        Self { inner: None }
    }

    /// Build a new index from `keyset`, writing assigned ids back into it.
    pub fn from_keyset(keyset: &mut KeySet) -> Result<Self> {
        let mut trie = Self::new();
        trie.build(keyset)?;
        Ok(trie)
    }

    /// Build from `keyset`.
    ///
    /// Duplicate keys are merged and their weights summed; every record,
    /// duplicates included, gets its key's id written back.
    ///
    /// # Errors
    /// - `EmptyInput` if `keyset` has no records
    /// - `AlreadyBuilt` if this index already holds a structure
    pub fn build(&mut self, keyset: &mut KeySet) -> Result<()> {
        if self.inner.is_some() {
            return Err(Error::AlreadyBuilt);
        }

        let parts = build_parts(keyset)?;
        for (record, &id) in parts.record_ids.iter().enumerate() {
            keyset.set_id(record, id);
        }

        let image = format::encode(&parts);
        let layout = format::decode(&image, false).map_err(|r| Error::format(IN_MEMORY, r))?;
        debug!(
            records = keyset.len(),
            keys = layout.num_keys,
            nodes = layout.num_nodes,
            bytes = image.len(),
            "built trie index"
        );

        self.inner = Some(Loaded {
            backing: Backing::Owned(image),
            layout,
        });
        Ok(())
    }

    /// Wrap a complete image held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with(bytes, &OpenOptions::default())
    }

    pub fn from_bytes_with(bytes: Vec<u8>, options: &OpenOptions) -> Result<Self> {
        let layout = format::decode(&bytes, options.verify_checksum)
            .map_err(|r| Error::format(IN_MEMORY, r))?;
        Ok(Self {
            inner: Some(Loaded {
                backing: Backing::Owned(bytes),
                layout,
            }),
        })
    }

    /// The persisted form of this index, exactly as `save` writes it.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.inner.as_ref().map(|l| l.backing.bytes())
    }

    /// Release the structure (and any mapping). The index becomes empty.
    pub fn clear(&mut self) {
        self.inner = None;
    }

    #[inline]
    fn view(&self) -> Option<TrieView<'_>> {
        self.inner
            .as_ref()
            .map(|l| TrieView::new(l.backing.bytes(), &l.layout))
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Write the image to `path`.
    #[cfg(feature = "std")]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        use std::io::Write;

        let path = path.as_ref();
        let bytes = self.as_bytes().ok_or(Error::NotBuilt)?;

        let mut file = std::fs::File::create(path).map_err(|e| Error::io(path, e))?;
        file.write_all(bytes).map_err(|e| Error::io(path, e))?;
        file.sync_all().map_err(|e| Error::io(path, e))?;

        debug!(path = %path.display(), bytes = bytes.len(), "saved trie index");
        Ok(())
    }

    /// Write the image to any writer.
    #[cfg(feature = "std")]
    pub fn write_to<W: std::io::Write>(&self, writer: &mut W) -> Result<()> {
        let bytes = self.as_bytes().ok_or(Error::NotBuilt)?;
        writer
            .write_all(bytes)
            .map_err(|e| Error::io(Path::new(STREAM), e))
    }

    /// Read a whole image from any reader into memory.
    #[cfg(feature = "std")]
    pub fn read_from<R: std::io::Read>(&mut self, reader: &mut R) -> Result<()> {
        if self.inner.is_some() {
            return Err(Error::AlreadyBuilt);
        }
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| Error::io(Path::new(STREAM), e))?;
        let layout = format::decode(&bytes, true).map_err(|r| Error::format(STREAM, r))?;
        self.inner = Some(Loaded {
            backing: Backing::Owned(bytes),
            layout,
        });
        Ok(())
    }

    /// Read the file at `path` into memory and use it.
    #[cfg(feature = "std")]
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.load_with(path, &OpenOptions::default())
    }

    #[cfg(feature = "std")]
    pub fn load_with(&mut self, path: impl AsRef<Path>, options: &OpenOptions) -> Result<()> {
        let path = path.as_ref();
        if self.inner.is_some() {
            return Err(Error::AlreadyBuilt);
        }

        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        let layout = decode_file(&bytes, path, options)?;
        debug!(path = %path.display(), bytes = bytes.len(), keys = layout.num_keys, "loaded trie index");

        self.inner = Some(Loaded {
            backing: Backing::Owned(bytes),
            layout,
        });
        Ok(())
    }

    /// Map the file at `path` and query it in place.
    ///
    /// The mapping lives as long as the index (or until [`clear`](Self::clear)).
    /// The file must not be modified while mapped.
    #[cfg(feature = "mmap")]
    pub fn mmap(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.mmap_with(path, &OpenOptions::default())
    }

    #[cfg(feature = "mmap")]
    pub fn mmap_with(&mut self, path: impl AsRef<Path>, options: &OpenOptions) -> Result<()> {
        let path = path.as_ref();
        if self.inner.is_some() {
            return Err(Error::AlreadyBuilt);
        }

        let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
        // SAFETY: Saved images are write-once; callers must not modify the
        // file while an index maps it.
        let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| Error::io(path, e))?;
        let layout = decode_file(&mmap, path, options)?;
        debug!(path = %path.display(), bytes = mmap.len(), keys = layout.num_keys, "mapped trie index");

        self.inner = Some(Loaded {
            backing: Backing::Mapped(mmap),
            layout,
        });
        Ok(())
    }

    /// Open `path` with an eager read.
    #[cfg(feature = "std")]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut trie = Self::new();
        trie.load(path)?;
        Ok(trie)
    }

    /// Open `path` with a zero-copy mapping.
    #[cfg(feature = "mmap")]
    pub fn map(path: impl AsRef<Path>) -> Result<Self> {
        let mut trie = Self::new();
        trie.mmap(path)?;
        Ok(trie)
    }

    // ------------------------------------------------------------------------
    // Search protocol
    // ------------------------------------------------------------------------

    /// Exact match of the agent's query. Sets the matched key on success.
    pub fn lookup(&self, agent: &mut SearchAgent) -> bool {
        match self.view() {
            Some(view) => view.lookup(agent),
            None => {
                agent.finish_single();
                false
            }
        }
    }

    /// Restore the key for the agent's identifier.
    ///
    /// Returns `Ok(false)` if no identifier is staged.
    ///
    /// # Errors
    /// `InvalidId` if the identifier is not in `[0, num_keys())`.
    pub fn reverse_lookup(&self, agent: &mut SearchAgent) -> Result<bool> {
        match self.view() {
            Some(view) => view.reverse_lookup(agent),
            None => match agent.query_id() {
                Some(id) => {
                    agent.finish_single();
                    Err(Error::InvalidId { id, num_keys: 0 })
                }
                None => Ok(false),
            },
        }
    }

    /// Next key that is a prefix of the agent's query, shortest first.
    pub fn common_prefix_search(&self, agent: &mut SearchAgent) -> bool {
        match self.view() {
            Some(view) => view.common_prefix_search(agent),
            None => exhaust_empty(agent),
        }
    }

    /// Next key starting with the agent's query, in ascending byte order.
    pub fn predictive_search(&self, agent: &mut SearchAgent) -> bool {
        match self.view() {
            Some(view) => view.predictive_search(agent),
            None => exhaust_empty(agent),
        }
    }

    // ------------------------------------------------------------------------
    // Conveniences
    // ------------------------------------------------------------------------

    /// Identifier of `key`, if indexed.
    pub fn key_id(&self, key: impl AsRef<[u8]>) -> Option<usize> {
        self.view()?.key_id(key.as_ref())
    }

    #[inline]
    pub fn contains(&self, key: impl AsRef<[u8]>) -> bool {
        self.key_id(key).is_some()
    }

    /// Bytes of the key with identifier `id`.
    pub fn restore(&self, id: usize) -> Result<Vec<u8>> {
        let num_keys = self.num_keys();
        let view = self
            .view()
            .filter(|_| id < num_keys)
            .ok_or(Error::InvalidId { id, num_keys })?;
        let mut out = Vec::new();
        view.restore(id, &mut out);
        Ok(out)
    }

    /// Stored weight of key `id`.
    pub fn weight(&self, id: usize) -> Option<f32> {
        let view = self.view()?;
        (id < view.num_keys()).then(|| view.weight(id))
    }

    /// Lazily enumerate keys that are prefixes of `query`.
    pub fn common_prefixes(&self, query: impl AsRef<[u8]>) -> CommonPrefixIter<'_> {
        CommonPrefixIter::new(self, query.as_ref())
    }

    /// Lazily enumerate keys starting with `query` (autocomplete).
    pub fn predict(&self, query: impl AsRef<[u8]>) -> PredictiveIter<'_> {
        PredictiveIter::new(self, query.as_ref())
    }

    /// The `limit` heaviest keys starting with `query`, heaviest first.
    /// Equal weights keep byte order.
    pub fn predict_top(&self, query: impl AsRef<[u8]>, limit: usize) -> Vec<Key> {
        if limit == 0 {
            return Vec::new();
        }

        let mut heap: BinaryHeap<Reverse<Ranked>> = BinaryHeap::with_capacity(limit + 1);
        for key in self.predict(query) {
            heap.push(Reverse(Ranked(key)));
            if heap.len() > limit {
                heap.pop();
            }
        }
        heap.into_sorted_vec()
            .into_iter()
            .map(|Reverse(Ranked(key))| key)
            .collect()
    }

    // ------------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------------

    #[inline]
    pub fn num_keys(&self) -> usize {
        self.inner.as_ref().map_or(0, |l| l.layout.num_keys)
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.inner.as_ref().map_or(0, |l| l.layout.num_nodes)
    }

    /// Image size in bytes (what `save` writes).
    #[inline]
    pub fn size_bytes(&self) -> usize {
        self.inner.as_ref().map_or(0, |l| l.layout.image_len)
    }

    #[inline]
    pub fn is_built(&self) -> bool {
        self.inner.is_some()
    }

    /// True when the index queries a memory-mapped file.
    pub fn is_mapped(&self) -> bool {
        match self.inner.as_ref().map(|l| &l.backing) {
            #[cfg(feature = "mmap")]
            Some(Backing::Mapped(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for TrieIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrieIndex")
            .field("num_keys", &self.num_keys())
            .field("num_nodes", &self.num_nodes())
            .field("size_bytes", &self.size_bytes())
            .field("mapped", &self.is_mapped())
            .finish()
    }
}

#[cfg(feature = "std")]
fn decode_file(bytes: &[u8], path: &Path, options: &OpenOptions) -> Result<Layout> {
    format::decode(bytes, options.verify_checksum).map_err(|reason| {
        tracing::warn!(path = %path.display(), %reason, "rejected trie image");
        Error::format(path.display().to_string(), reason)
    })
}

/// Multi-result search against an index with no structure.
fn exhaust_empty(agent: &mut SearchAgent) -> bool {
    if agent.state() != AgentState::Idle {
        agent.exhaust();
    }
    false
}

/// Orders keys for `predict_top`: heavier is greater, then earlier bytes.
struct Ranked(Key);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .weight()
            .total_cmp(&other.0.weight())
            .then_with(|| other.0.as_bytes().cmp(self.0.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> KeySet {
        let mut keyset = KeySet::new();
        for (text, weight) in [
            ("a", 1.0),
            ("ab", 4.0),
            ("abc", 2.0),
            ("abd", 4.0),
            ("b", 1.0),
            ("international", 3.0),
            ("internet", 9.0),
        ] {
            keyset.append(text, weight);
        }
        keyset
    }

    /// Every observable answer of an index, for equivalence checks.
    fn fingerprint(trie: &TrieIndex) -> Vec<(Vec<u8>, usize, f32)> {
        trie.predict("")
            .map(|k| (k.as_bytes().to_vec(), k.id().unwrap(), k.weight()))
            .collect()
    }

    #[test]
    fn test_build_writes_ids_back() {
        let mut keyset = sample();
        keyset.append("ab", 1.0);
        let trie = TrieIndex::from_keyset(&mut keyset).unwrap();

        assert_eq!(trie.num_keys(), 7);
        for key in &keyset {
            assert_eq!(trie.key_id(key.as_bytes()), key.id());
        }
        let ab = keyset.get(1).unwrap().id().unwrap();
        assert_eq!(keyset.get(7).unwrap().id(), Some(ab));
        assert_eq!(trie.weight(ab), Some(5.0));
    }

    #[test]
    fn test_build_twice_fails() {
        let mut keyset = sample();
        let mut trie = TrieIndex::new();
        trie.build(&mut keyset).unwrap();
        assert!(matches!(trie.build(&mut keyset), Err(Error::AlreadyBuilt)));

        trie.clear();
        assert!(!trie.is_built());
        trie.build(&mut keyset).unwrap();
        assert!(trie.is_built());
    }

    #[test]
    fn test_build_empty() {
        let mut trie = TrieIndex::new();
        assert!(matches!(
            trie.build(&mut KeySet::new()),
            Err(Error::EmptyInput)
        ));
        assert!(!trie.is_built());
    }

    #[test]
    fn test_empty_index_rejects_everything() {
        let trie = TrieIndex::new();
        let mut agent = SearchAgent::new();

        agent.set_query("a");
        assert!(!trie.lookup(&mut agent));
        agent.set_query("a");
        assert!(!trie.common_prefix_search(&mut agent));
        assert_eq!(agent.state(), AgentState::Exhausted);
        agent.set_query("");
        assert!(!trie.predictive_search(&mut agent));

        agent.set_reverse_query(0);
        assert!(matches!(
            trie.reverse_lookup(&mut agent),
            Err(Error::InvalidId { id: 0, num_keys: 0 })
        ));
        assert!(matches!(trie.restore(0), Err(Error::InvalidId { .. })));
        assert_eq!(trie.size_bytes(), 0);
        assert!(trie.as_bytes().is_none());
    }

    #[test]
    fn test_dense_bijection() {
        let mut keyset = sample();
        let trie = TrieIndex::from_keyset(&mut keyset).unwrap();
        let mut agent = SearchAgent::new();

        let mut restored = Vec::new();
        for id in 0..trie.num_keys() {
            agent.set_reverse_query(id);
            assert!(trie.reverse_lookup(&mut agent).unwrap());
            restored.push(agent.key().as_bytes().to_vec());

            agent.set_query(agent.key().as_bytes().to_vec());
            assert!(trie.lookup(&mut agent));
            assert_eq!(agent.key().id(), Some(id));
        }
        restored.sort();
        restored.dedup();
        assert_eq!(restored.len(), trie.num_keys());

        agent.set_reverse_query(trie.num_keys());
        assert!(trie.reverse_lookup(&mut agent).is_err());
    }

    #[test]
    fn test_predict_top() {
        let mut keyset = sample();
        let trie = TrieIndex::from_keyset(&mut keyset).unwrap();

        let top: Vec<Vec<u8>> = trie
            .predict_top("a", 3)
            .iter()
            .map(|k| k.as_bytes().to_vec())
            .collect();
        // ab and abd tie at 4.0: byte order breaks the tie.
        assert_eq!(top, vec![b"ab".to_vec(), b"abd".to_vec(), b"abc".to_vec()]);

        let top = trie.predict_top("inter", 10);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].as_bytes(), b"internet");
        assert!(trie.predict_top("a", 0).is_empty());
    }

    #[test]
    fn test_bytes_roundtrip() {
        let mut keyset = sample();
        let trie = TrieIndex::from_keyset(&mut keyset).unwrap();
        let copy = TrieIndex::from_bytes(trie.as_bytes().unwrap().to_vec()).unwrap();

        assert_eq!(fingerprint(&trie), fingerprint(&copy));
        assert_eq!(copy.size_bytes(), trie.size_bytes());
        assert!(!copy.is_mapped());
    }

    #[test]
    fn test_save_load_mmap_equivalence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dict.trie");

        let mut keyset = sample();
        let built = TrieIndex::from_keyset(&mut keyset).unwrap();
        built.save(&path).unwrap();

        let loaded = TrieIndex::open(&path).unwrap();
        let mapped = TrieIndex::map(&path).unwrap();
        assert!(!loaded.is_mapped());
        assert!(mapped.is_mapped());

        let expected = fingerprint(&built);
        assert_eq!(fingerprint(&loaded), expected);
        assert_eq!(fingerprint(&mapped), expected);

        let prefixes: Vec<_> = mapped.common_prefixes("abcd").map(|k| k.id()).collect();
        let original: Vec<_> = built.common_prefixes("abcd").map(|k| k.id()).collect();
        assert_eq!(prefixes, original);

        for id in 0..built.num_keys() {
            assert_eq!(mapped.restore(id).unwrap(), built.restore(id).unwrap());
        }
    }

    #[test]
    fn test_load_into_built_index_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dict.trie");

        let mut keyset = sample();
        let mut trie = TrieIndex::from_keyset(&mut keyset).unwrap();
        trie.save(&path).unwrap();

        assert!(matches!(trie.load(&path), Err(Error::AlreadyBuilt)));
        assert!(matches!(trie.mmap(&path), Err(Error::AlreadyBuilt)));

        trie.clear();
        trie.mmap(&path).unwrap();
        assert_eq!(trie.num_keys(), 7);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.trie");

        match TrieIndex::map(&path) {
            Err(Error::Io { path: p, .. }) => assert!(p.ends_with("missing.trie")),
            other => panic!("expected Io, got {:?}", other),
        }
        assert!(matches!(TrieIndex::open(&path), Err(Error::Io { .. })));
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bogus.trie");
        let mut bytes = b"not a trie image".to_vec();
        bytes.resize(256, b'.');
        std::fs::write(&path, &bytes).unwrap();

        match TrieIndex::map(&path) {
            Err(Error::Format { path: p, reason }) => {
                assert!(p.ends_with("bogus.trie"));
                assert_eq!(reason, "invalid magic");
            }
            other => panic!("expected Format, got {:?}", other),
        }
    }

    #[test]
    fn test_corrupt_file_checksum() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dict.trie");

        let mut keyset = sample();
        let trie = TrieIndex::from_keyset(&mut keyset).unwrap();
        let mut bytes = trie.as_bytes().unwrap().to_vec();
        let before_footer = bytes.len() - format::FOOTER_LEN - 1;
        bytes[before_footer] ^= 0x40;
        std::fs::write(&path, &bytes).unwrap();

        assert!(matches!(TrieIndex::open(&path), Err(Error::Format { .. })));

        let lenient = OpenOptions::new().verify_checksum(false);
        let mut trie = TrieIndex::new();
        trie.load_with(&path, &lenient).unwrap();
        assert_eq!(trie.num_keys(), 7);
    }

    /// ["a", "b"] with its louds body rewritten to `body`, checksum intact.
    fn crafted(body: u64) -> Vec<u8> {
        let mut keyset: KeySet = ["a", "b"].into_iter().collect();
        let trie = TrieIndex::from_keyset(&mut keyset).unwrap();
        let mut bytes = trie.as_bytes().unwrap().to_vec();
        let at = format::decode(&bytes, true).unwrap().louds.words.start + 8;
        bytes[at..at + 8].copy_from_slice(&body.to_le_bytes());
        format::reseal(&mut bytes);
        bytes
    }

    #[test]
    fn test_crafted_louds_is_format_error() {
        let lenient = OpenOptions::new().verify_checksum(false);
        for body in [0xeu64, 0x19] {
            assert!(matches!(
                TrieIndex::from_bytes_with(crafted(body), &lenient),
                Err(Error::Format { .. })
            ));
            assert!(matches!(
                TrieIndex::from_bytes(crafted(body)),
                Err(Error::Format { .. })
            ));
        }

        let dir = tempdir().unwrap();
        let path = dir.path().join("cycle.trie");
        std::fs::write(&path, crafted(0x19)).unwrap();
        match TrieIndex::map(&path) {
            Err(Error::Format { reason, .. }) => {
                assert!(reason.contains("not below its parent"), "{}", reason)
            }
            other => panic!("expected Format, got {:?}", other),
        }
        let mut trie = TrieIndex::new();
        assert!(matches!(
            trie.load_with(&path, &lenient),
            Err(Error::Format { .. })
        ));
        assert!(!trie.is_built());
    }

    #[test]
    fn test_oversized_node_count_is_format_error() {
        let mut keyset = sample();
        let trie = TrieIndex::from_keyset(&mut keyset).unwrap();
        let mut bytes = trie.as_bytes().unwrap().to_vec();
        bytes[16..24].copy_from_slice(&(u64::MAX / 2 + 1).to_le_bytes());
        format::reseal(&mut bytes);

        let dir = tempdir().unwrap();
        let path = dir.path().join("huge.trie");
        std::fs::write(&path, &bytes).unwrap();

        assert!(matches!(
            TrieIndex::from_bytes(bytes),
            Err(Error::Format { .. })
        ));
        assert!(matches!(TrieIndex::map(&path), Err(Error::Format { .. })));
    }

    #[test]
    fn test_save_unbuilt_fails() {
        let dir = tempdir().unwrap();
        let trie = TrieIndex::new();
        assert!(matches!(
            trie.save(dir.path().join("x.trie")),
            Err(Error::NotBuilt)
        ));
    }

    #[test]
    fn test_stream_roundtrip() {
        let mut keyset = sample();
        let trie = TrieIndex::from_keyset(&mut keyset).unwrap();

        let mut buf = Vec::new();
        trie.write_to(&mut buf).unwrap();

        let mut copy = TrieIndex::new();
        copy.read_from(&mut buf.as_slice()).unwrap();
        assert_eq!(fingerprint(&copy), fingerprint(&trie));
    }

    #[test]
    fn test_shared_across_threads() {
        let mut keyset = sample();
        let trie = TrieIndex::from_keyset(&mut keyset).unwrap();

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let mut agent = SearchAgent::new();
                    agent.set_query("internet");
                    assert!(trie.lookup(&mut agent));
                    assert_eq!(trie.predict("inter").count(), 2);
                });
            }
        });
    }
}
