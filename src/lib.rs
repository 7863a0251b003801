//! triscan: offline trigram search engine for source trees
//!
//! A crawl stores every accepted file once: a copy of its content, its
//! unique wordlist, its trigram set and a metadata record with class tags.
//! Two inverted indexes map trigrams to document keys, one over content
//! words and one over tag values. A search intersects the postings of the
//! query's trigrams, rarest first, and verifies the candidates against the
//! stored wordlists and metadata.
//!
//! # Architecture
//!
//! - **Indexer**: crawls, extracts words and trigrams, classifies, writes stores
//! - **Postings**: sharded, append-only trigram postings on disk
//! - **Query**: semantic query tree, string parser and trigram compiler
//! - **Search**: selectivity-ordered intersection with early abort, verification
//!
//! # Example Usage
//!
//! ```no_run
//! use triscan::{Index, Indexer, SearchEngine};
//!
//! let index = Index::open("./idx").unwrap();
//! Indexer::new(&index).index("./src", false).unwrap();
//!
//! let mut engine = SearchEngine::new(&index);
//! for result in engine.search("createKeyStore").unwrap() {
//!     println!("{:?}", result.relative_path());
//! }
//! ```

pub mod cache;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod crawler;
pub mod document_key;
pub mod error;
pub mod index;
pub mod indexer;
pub mod models;
pub mod output;
pub mod postings;
pub mod query;
pub mod search;
pub mod trigram;
pub mod trigram_path;
pub mod word_order;

// Re-export commonly used types
pub use config::IndexConfig;
pub use document_key::{DocumentKey, DocumentKeyStrategy, Md5KeyStrategy};
pub use error::{Result, SearchError};
pub use index::Index;
pub use indexer::{Indexer, MetadataIndexer};
pub use models::{DocumentMetadata, IndexStats, SearchResultCandidate};
pub use query::{QueryNode, parse_query};
pub use search::SearchEngine;
