//! Error types for building, searching and persisting trie indexes.

extern crate alloc;
use alloc::string::String;
use thiserror::Error;

/// Path label used for images that never touched the filesystem.
pub const IN_MEMORY: &str = "<memory>";

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot build a trie index from an empty key set")]
    EmptyInput,

    #[error("trie index already holds a structure; clear it before rebuilding")]
    AlreadyBuilt,

    #[error("trie index holds no structure")]
    NotBuilt,

    #[error("index {index} out of range for length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("key id {id} is not in this index (num_keys {num_keys})")]
    InvalidId { id: usize, num_keys: usize },

    #[cfg(feature = "std")]
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: invalid trie image: {reason}")]
    Format { path: String, reason: String },
}

impl Error {
    #[cfg(feature = "std")]
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Error::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn format(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
