//! Cached search results keyed by the normalized query
//!
//! A failed read is never fatal here: the caller simply runs the search
//! again, so every load degrades to `None` and logs a warning.

use std::collections::BTreeMap;
use std::path::Path;

use md5::{Digest, Md5};

use super::store::ShardedStore;
use crate::document_key::{DocumentKey, to_hex};
use crate::error::Result;

pub const CACHED_QUERIES_FOLDER: &str = "cachedQueries";
pub const QUERY_RESULT_SUFFIX: &str = ".querycache";
pub const PREVIEW_SUFFIX: &str = ".previewcache";

/// Document key -> (line number -> line text)
pub type PreviewMap = BTreeMap<DocumentKey, BTreeMap<usize, String>>;

/// Lowercase, trim and collapse inner whitespace
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cache key of a query string: MD5 hex of its normalized form
pub fn query_key(query: &str) -> String {
    to_hex(&Md5::digest(normalize_query(query).as_bytes()))
}

#[derive(Debug, Clone)]
pub struct SearchQueryCache {
    store: ShardedStore,
}

impl SearchQueryCache {
    pub fn new(index_root: &Path) -> Self {
        Self {
            store: ShardedStore::new(index_root.join(CACHED_QUERIES_FOLDER)),
        }
    }

    pub fn is_query_result_available(&self, query_key: &str) -> bool {
        self.store.exists(query_key, QUERY_RESULT_SUFFIX)
    }

    pub fn save_query_result(&self, query_key: &str, keys: &[DocumentKey]) -> Result<()> {
        self.store.write_json(query_key, QUERY_RESULT_SUFFIX, keys)
    }

    pub fn load_query_result(&self, query_key: &str) -> Option<Vec<DocumentKey>> {
        self.store
            .read_json(query_key, QUERY_RESULT_SUFFIX)
            .unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable query cache entry {}: {}", query_key, e);
                None
            })
    }

    pub fn save_preview(&self, query_key: &str, preview: &PreviewMap) -> Result<()> {
        self.store.write_json(query_key, PREVIEW_SUFFIX, preview)
    }

    pub fn load_preview(&self, query_key: &str) -> Option<PreviewMap> {
        self.store
            .read_json(query_key, PREVIEW_SUFFIX)
            .unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable preview cache entry {}: {}", query_key, e);
                None
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalization() {
        assert_eq!(normalize_query("  CreateKeyStore   AND  foo "), "createkeystore and foo");
        assert_eq!(query_key("createKeyStore"), query_key(" createkeystore"));
        assert_eq!(query_key("x").len(), 32);
        assert_ne!(query_key("a/b"), query_key("a\\b"));
    }

    #[test]
    fn test_result_and_preview_roundtrip() {
        let temp = TempDir::new().unwrap();
        let cache = SearchQueryCache::new(temp.path());
        let qkey = query_key("createkeystore");
        let doc = DocumentKey::from_key_string("b299050fb1b506ef9ad13e6e55787a89");

        assert!(!cache.is_query_result_available(&qkey));
        assert!(cache.load_query_result(&qkey).is_none());

        cache.save_query_result(&qkey, std::slice::from_ref(&doc)).unwrap();
        let mut lines = BTreeMap::new();
        lines.insert(3, "createKeyStore();".to_string());
        let mut preview = PreviewMap::new();
        preview.insert(doc.clone(), lines);
        cache.save_preview(&qkey, &preview).unwrap();

        assert!(cache.is_query_result_available(&qkey));
        assert_eq!(cache.load_query_result(&qkey).unwrap(), vec![doc]);
        assert_eq!(cache.load_preview(&qkey).unwrap(), preview);
    }

    #[test]
    fn test_corrupt_entry_degrades_to_absent() {
        let temp = TempDir::new().unwrap();
        let cache = SearchQueryCache::new(temp.path());
        let qkey = query_key("broken");

        let path = temp
            .path()
            .join(CACHED_QUERIES_FOLDER)
            .join(&qkey[..2])
            .join(format!("{}{}", qkey, QUERY_RESULT_SUFFIX));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not a list").unwrap();

        assert!(cache.is_query_result_available(&qkey));
        assert!(cache.load_query_result(&qkey).is_none());
    }
}
