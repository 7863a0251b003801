//! Per-document and per-query caches
//!
//! Each cache is a [`ShardedStore`] below the index root:
//! - `cachedDocuments/`: copies of the original contents (`.originalContent`)
//! - `cachedWordlists/`: wordlist, trigram set and ttf map (`.wordlist`, `.trigrams`, `.ttfcount`)
//! - `cachedMetadata/`: [`DocumentMetadata`](crate::models::DocumentMetadata) records (`.metadata`)
//! - `cachedQueries/`: search results and previews (`.querycache`, `.previewcache`)
//!
//! All records are JSON.

pub mod document;
pub mod metadata;
pub mod query;
pub mod store;
pub mod wordlist;

pub use document::DocumentCache;
pub use metadata::MetadataCache;
pub use query::{PreviewMap, SearchQueryCache, normalize_query, query_key};
pub use store::ShardedStore;
pub use wordlist::WordlistCache;
