//! Document metadata records, reloaded read-only for verification and display

use std::path::Path;

use super::store::ShardedStore;
use crate::document_key::DocumentKey;
use crate::error::Result;
use crate::models::DocumentMetadata;

pub const CACHED_METADATA_FOLDER: &str = "cachedMetadata";
pub const METADATA_SUFFIX: &str = ".metadata";

/// Stored [`DocumentMetadata`] records, one per document key
#[derive(Debug, Clone)]
pub struct MetadataCache {
    store: ShardedStore,
}

impl MetadataCache {
    pub fn new(index_root: &Path) -> Self {
        Self {
            store: ShardedStore::new(index_root.join(CACHED_METADATA_FOLDER)),
        }
    }

    pub fn save(&self, metadata: &DocumentMetadata) -> Result<()> {
        self.store
            .write_json(metadata.document_key.as_str(), METADATA_SUFFIX, metadata)
    }

    pub fn load(&self, key: &DocumentKey) -> Result<Option<DocumentMetadata>> {
        self.store.read_json(key.as_str(), METADATA_SUFFIX)
    }

    /// Keys of all stored records, sorted
    pub fn all_keys(&self) -> Result<Vec<DocumentKey>> {
        Ok(self
            .store
            .keys_with_suffix(METADATA_SUFFIX)?
            .into_iter()
            .map(DocumentKey::from_key_string)
            .collect())
    }
}
