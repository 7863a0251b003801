//! Index handle: one index root with its caches and trigram namespaces
//!
//! The handle is passed by reference to the indexer and the search engine;
//! it holds no mutable state of its own.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::cache::document::CACHED_DOCUMENTS_FOLDER;
use crate::cache::metadata::CACHED_METADATA_FOLDER;
use crate::cache::query::CACHED_QUERIES_FOLDER;
use crate::cache::wordlist::CACHED_WORDLISTS_FOLDER;
use crate::cache::{DocumentCache, MetadataCache, SearchQueryCache, WordlistCache};
use crate::config::IndexConfig;
use crate::postings::{
    CONTENT_INDEX_FOLDER, METADATA_INDEX_FOLDER, TrigramIndexReader, TrigramIndexWriter,
};

/// File holding the format fingerprint of the build that wrote the index
pub const FORMAT_HASH_FILE: &str = "format.hash";

/// Fingerprint of this build's on-disk format (see build.rs)
pub const INDEX_FORMAT_HASH: &str = env!("INDEX_FORMAT_HASH");

#[derive(Debug, Clone)]
pub struct Index {
    root: PathBuf,
    config: IndexConfig,
    documents: DocumentCache,
    wordlists: WordlistCache,
    metadata: MetadataCache,
    queries: SearchQueryCache,
}

impl Index {
    /// Open the index at `root`, reading `config.toml` if present
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let config = IndexConfig::load_or_default(root)?;
        Ok(Self::with_config(root, config))
    }

    pub fn with_config(root: impl AsRef<Path>, config: IndexConfig) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            documents: DocumentCache::new(&root),
            wordlists: WordlistCache::new(&root),
            metadata: MetadataCache::new(&root),
            queries: SearchQueryCache::new(&root),
            config,
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn document_cache(&self) -> &DocumentCache {
        &self.documents
    }

    pub fn wordlist_cache(&self) -> &WordlistCache {
        &self.wordlists
    }

    pub fn metadata_cache(&self) -> &MetadataCache {
        &self.metadata
    }

    pub fn query_cache(&self) -> &SearchQueryCache {
        &self.queries
    }

    pub fn content_index_path(&self) -> PathBuf {
        self.root.join(CONTENT_INDEX_FOLDER)
    }

    pub fn metadata_index_path(&self) -> PathBuf {
        self.root.join(METADATA_INDEX_FOLDER)
    }

    pub fn content_writer(&self) -> crate::error::Result<TrigramIndexWriter> {
        TrigramIndexWriter::new(
            self.content_index_path(),
            self.config.flush_threshold,
            self.config.flush_workers,
        )
    }

    pub fn metadata_writer(&self) -> crate::error::Result<TrigramIndexWriter> {
        TrigramIndexWriter::new(
            self.metadata_index_path(),
            self.config.flush_threshold,
            self.config.flush_workers,
        )
    }

    pub fn content_reader(&self) -> TrigramIndexReader {
        self.reader_for(self.content_index_path())
    }

    pub fn metadata_reader(&self) -> TrigramIndexReader {
        self.reader_for(self.metadata_index_path())
    }

    fn reader_for(&self, base: PathBuf) -> TrigramIndexReader {
        TrigramIndexReader::new(
            base,
            self.config.max_shard_generations,
            self.config.flush_threshold as u64,
        )
    }

    /// Remove both trigram namespaces and every per-document and query cache
    ///
    /// Generations restart at 0 on every build, so stale shards must go first.
    /// Per-document records go too, otherwise records of deleted files would
    /// pile up and the metadata pass would index documents that no longer
    /// exist.
    pub fn clear_postings(&self) -> Result<()> {
        for folder in [
            CONTENT_INDEX_FOLDER,
            METADATA_INDEX_FOLDER,
            CACHED_DOCUMENTS_FOLDER,
            CACHED_WORDLISTS_FOLDER,
            CACHED_METADATA_FOLDER,
            CACHED_QUERIES_FOLDER,
        ] {
            let path = self.root.join(folder);
            self.remove_dir(&path)?;
        }
        Ok(())
    }

    /// Remove the metadata namespace only (before a metadata pass)
    pub fn clear_metadata_postings(&self) -> Result<()> {
        self.remove_dir(&self.metadata_index_path())
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        match fs::remove_dir_all(path) {
            Ok(()) => {
                log::debug!("Removed {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }

    pub fn write_format_hash(&self) -> Result<()> {
        let path = self.root.join(FORMAT_HASH_FILE);
        fs::write(&path, INDEX_FORMAT_HASH)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// True if the index was written by a build with the same format
    ///
    /// An index without `format.hash` is treated as compatible.
    pub fn check_format_hash(&self) -> bool {
        let path = self.root.join(FORMAT_HASH_FILE);
        match fs::read_to_string(&path) {
            Ok(stored) if stored.trim() == INDEX_FORMAT_HASH => true,
            Ok(stored) => {
                log::warn!(
                    "Index at {} was built with format {} (current {}), consider rebuilding it",
                    self.root.display(),
                    stored.trim(),
                    INDEX_FORMAT_HASH
                );
                false
            }
            Err(_) => true,
        }
    }
}
