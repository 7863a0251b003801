//! Error types for index and search operations
//!
//! Library code returns [`SearchError`]; the CLI wraps it in `anyhow` with
//! context. Absence of data (unknown trigram, never-stored key) is not an
//! error anywhere in this crate: it shows up as an empty set or `None`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    /// The document path could not be expressed relative to the crawl root
    #[error("Path error: {path} is not located below {root}")]
    Path { path: PathBuf, root: PathBuf },

    /// Cache or index file could not be read or written
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A stored record could not be encoded or decoded
    #[error("Serialization error on {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The query contains a construct the compiler cannot reduce soundly
    #[error("Unsupported query: {0}")]
    UnsupportedQuery(String),

    /// Declared postings count disagrees with the union of all shards
    #[error("Consistency error for trigram '{trigram}': declared {declared}, found {actual}")]
    Consistency {
        trigram: String,
        declared: u64,
        actual: u64,
    },

    /// A cache key too short to be sharded
    #[error("Invalid cache key: '{0}'")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SearchError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn serialization(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        SearchError::Serialization {
            path: path.into(),
            source,
        }
    }

    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        SearchError::UnsupportedQuery(msg.into())
    }

    /// True for errors that only concern a single query, not the index
    pub fn is_query_error(&self) -> bool {
        matches!(self, SearchError::UnsupportedQuery(_))
    }
}
