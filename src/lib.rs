//! # ALICE-Trie
//!
//! **Succinct static dictionary over byte-string keys**
//!
//! > "A key is a path. Lookup(Key) -> O(Key_Length) independent of Dictionary Size."
//!
//! ## Architecture
//!
//! - **LOUDS Trie**: topology in ~2 bits per node, navigated by rank/select
//! - **Path Compression**: single-child chains collapse into one tail label
//! - **Interleaved BitVector**: [Header|Body×8] layout for L1 cache locality
//! - **One Image**: built, loaded and memory-mapped indexes query the same bytes
//! - **Search Agent**: reusable cursor, one match per call, no result lists
//!
//! ## Operations
//!
//! | Operation | Time | Space |
//! |-----------|------|-------|
//! | Build | O(total key bytes × log N) | image only |
//! | Lookup | **O(M)** | O(1) |
//! | Reverse Lookup | O(key length × select) | O(1) |
//! | Common Prefix | O(M) for all matches | O(1) |
//! | Predictive | O(M + output) | O(depth) |
//! | Mmap | O(image) validation | **zero-copy** |
//!
//! ## Example
//!
//! ```
//! use alice_trie::{KeySet, SearchAgent, TrieIndex};
//!
//! let mut keyset = KeySet::new();
//! for word in ["a", "ab", "abc", "b"] {
//!     keyset.push(word);
//! }
//! let trie = TrieIndex::from_keyset(&mut keyset).unwrap();
//!
//! // Exact lookup
//! let mut agent = SearchAgent::new();
//! agent.set_query("ab");
//! assert!(trie.lookup(&mut agent));
//! let id = agent.key().id().unwrap();
//!
//! // Reverse lookup
//! agent.set_reverse_query(id);
//! assert!(trie.reverse_lookup(&mut agent).unwrap());
//! assert_eq!(agent.key().as_bytes(), b"ab");
//!
//! // Autocomplete, in byte order
//! let words: Vec<_> = trie.predict("a").map(|k| k.as_bytes().to_vec()).collect();
//! assert_eq!(words, [b"a".to_vec(), b"ab".to_vec(), b"abc".to_vec()]);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod agent;
pub mod bitvec;
pub mod builder;
pub mod config;
pub mod error;
pub mod format;
pub mod key;
pub mod search;
pub mod trie;

pub use agent::{AgentState, SearchAgent};
pub use config::OpenOptions;
pub use error::{Error, Result};
pub use key::{Key, KeySet};
pub use search::{CommonPrefixIter, PredictiveIter};
pub use trie::TrieIndex;

/// Version
pub const VERSION: &str = "0.1.0";
