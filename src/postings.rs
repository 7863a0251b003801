//! Inverted trigram index: trigram -> set of document keys
//!
//! # On-disk format
//!
//! For every trigram, below the namespace directory and the path computed by
//! [`trigram_path`](crate::trigram_path):
//!
//! - `<tokens>.<gen>.reference`: one generation shard, JSON
//!   `{"relatedDocuments": [...], "indexGeneration": gen, "trigram": "..."}`
//! - `<tokens>.reference_count`: JSON `{"trigram": "...", "relatedDocumentsCount": n}`
//!   with the number of keys over all shards written so far
//!
//! Shards are immutable once written and numbered 0, 1, 2, ... without gaps.
//! The postings list of a trigram is the union of all its shards.
//!
//! Content and metadata trigrams live in two separate namespaces,
//! [`CONTENT_INDEX_FOLDER`] and [`METADATA_INDEX_FOLDER`].

pub mod flusher;
pub mod reader;
pub mod writer;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::document_key::DocumentKey;
use crate::error::{Result, SearchError};
use crate::trigram_path;

pub use flusher::ShardFlusher;
pub use reader::{ConsistencyReport, TrigramIndexReader};
pub use writer::TrigramIndexWriter;

pub const CONTENT_INDEX_FOLDER: &str = "inverseTrigram.index";
pub const METADATA_INDEX_FOLDER: &str = "inverseMetadataTrigram.index";

pub const REFERENCE_SUFFIX: &str = ".reference";
pub const REFERENCE_COUNT_SUFFIX: &str = ".reference_count";

/// One generation shard of a postings list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShardRecord {
    pub related_documents: BTreeSet<DocumentKey>,
    pub index_generation: u32,
    pub trigram: String,
}

/// Declared size of a postings list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CountRecord {
    pub trigram: String,
    pub related_documents_count: u64,
}

/// Path of generation shard `generation` of `trigram`
pub fn shard_path(base: &Path, trigram: &str, generation: u32) -> PathBuf {
    trigram_path::path_for_trigram(
        base,
        trigram,
        &format!(".{}{}", generation, REFERENCE_SUFFIX),
    )
}

/// Path of the count file of `trigram`
pub fn count_path(base: &Path, trigram: &str) -> PathBuf {
    trigram_path::path_for_trigram(base, trigram, REFERENCE_COUNT_SUFFIX)
}

pub(crate) fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SearchError::io(parent, e))?;
    }

    let file = File::create(path).map_err(|e| SearchError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|e| SearchError::serialization(path, e))?;
    writer.flush().map_err(|e| SearchError::io(path, e))
}

pub(crate) fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| SearchError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| SearchError::serialization(path, e))
}
