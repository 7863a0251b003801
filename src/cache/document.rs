//! Copies of the original document contents, used for result previews

use std::path::Path;

use super::store::ShardedStore;
use crate::document_key::DocumentKey;
use crate::error::Result;

pub const CACHED_DOCUMENTS_FOLDER: &str = "cachedDocuments";
pub const ORIGINAL_CONTENT_SUFFIX: &str = ".originalContent";

#[derive(Debug, Clone)]
pub struct DocumentCache {
    store: ShardedStore,
}

impl DocumentCache {
    pub fn new(index_root: &Path) -> Self {
        Self {
            store: ShardedStore::new(index_root.join(CACHED_DOCUMENTS_FOLDER)),
        }
    }

    pub fn create_document_copy(&self, key: &DocumentKey, content: &[u8]) -> Result<()> {
        self.store
            .write_bytes(key.as_str(), ORIGINAL_CONTENT_SUFFIX, content)
    }

    /// Cached content as text, invalid UTF-8 replaced
    pub fn load_content(&self, key: &DocumentKey) -> Result<Option<String>> {
        Ok(self
            .store
            .read_bytes(key.as_str(), ORIGINAL_CONTENT_SUFFIX)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }
}
