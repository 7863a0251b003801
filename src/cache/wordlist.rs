//! Per-document wordlist, trigram set and trigram term frequencies
//!
//! The three artifacts are written and read independently. Search only needs
//! the wordlist (candidate verification); the other two are kept for
//! statistics and reindexing.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::store::ShardedStore;
use crate::document_key::DocumentKey;
use crate::error::Result;
use crate::trigram::{Trigram, WordExtraction};

pub const CACHED_WORDLISTS_FOLDER: &str = "cachedWordlists";
pub const WORDLIST_SUFFIX: &str = ".wordlist";
pub const TRIGRAMS_SUFFIX: &str = ".trigrams";
pub const TTF_SUFFIX: &str = ".ttfcount";

#[derive(Debug, Clone)]
pub struct WordlistCache {
    store: ShardedStore,
}

impl WordlistCache {
    pub fn new(index_root: &Path) -> Self {
        Self {
            store: ShardedStore::new(index_root.join(CACHED_WORDLISTS_FOLDER)),
        }
    }

    /// Persist all three artifacts of an extraction
    pub fn save_extraction(&self, key: &DocumentKey, extraction: &WordExtraction) -> Result<()> {
        self.save_wordlist(key, &extraction.wordlist)?;
        self.save_trigrams(key, &extraction.trigrams)?;
        self.save_ttf(key, &extraction.ttf)
    }

    pub fn save_wordlist(&self, key: &DocumentKey, wordlist: &[String]) -> Result<()> {
        self.store.write_json(key.as_str(), WORDLIST_SUFFIX, wordlist)
    }

    pub fn load_wordlist(&self, key: &DocumentKey) -> Result<Option<Vec<String>>> {
        self.store.read_json(key.as_str(), WORDLIST_SUFFIX)
    }

    pub fn save_trigrams(&self, key: &DocumentKey, trigrams: &BTreeSet<Trigram>) -> Result<()> {
        self.store.write_json(key.as_str(), TRIGRAMS_SUFFIX, trigrams)
    }

    pub fn load_trigrams(&self, key: &DocumentKey) -> Result<Option<BTreeSet<Trigram>>> {
        self.store.read_json(key.as_str(), TRIGRAMS_SUFFIX)
    }

    pub fn save_ttf(&self, key: &DocumentKey, ttf: &BTreeMap<Trigram, u64>) -> Result<()> {
        self.store.write_json(key.as_str(), TTF_SUFFIX, ttf)
    }

    pub fn load_ttf(&self, key: &DocumentKey) -> Result<Option<BTreeMap<Trigram, u64>>> {
        self.store.read_json(key.as_str(), TTF_SUFFIX)
    }
}
