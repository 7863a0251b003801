//! Core data models shared by the indexer, the stores and the search engine

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use strum::{Display, EnumString};

use crate::document_key::{DocumentId, DocumentKey};

/// Per-document record created once at index time
///
/// The class map is open-ended: classifiers add `name -> value` tags such as
/// `filetype -> java` or `unit-test -> true`. Tag values are indexed into
/// the metadata trigram index by the metadata pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub document_key: DocumentKey,
    pub relative_path: String,
    pub filename: String,
    pub file_size: u64,
    pub line_count: usize,
    #[serde(default)]
    pub classes: BTreeMap<String, String>,
}

impl DocumentMetadata {
    pub fn new(id: &DocumentId, file_size: u64) -> Self {
        let relative_path = id.relative_path().to_string();
        let filename = relative_path
            .rsplit('/')
            .next()
            .unwrap_or(relative_path.as_str())
            .to_string();

        Self {
            document_key: id.key().clone(),
            relative_path,
            filename,
            file_size,
            line_count: 0,
            classes: BTreeMap::new(),
        }
    }

    pub fn add_class(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.classes.insert(name.into(), value.into());
    }

    pub fn class(&self, name: &str) -> Option<&str> {
        self.classes.get(name).map(String::as_str)
    }
}

/// A trigram together with its (estimated) postings size
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrigramOccurrence {
    pub trigram: String,
    pub count: u64,
}

impl TrigramOccurrence {
    pub fn new(trigram: impl Into<String>, count: u64) -> Self {
        Self {
            trigram: trigram.into(),
            count,
        }
    }
}

/// Outcome of one intersection step
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TrigramUsageState {
    /// Never loaded (skipped by early abort)
    Unknown,
    /// Loading the trigram shrank the result set
    Success,
    /// The result set kept its size
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrigramUsage {
    pub trigram: String,
    pub occurrence_count: u64,
    pub state: TrigramUsageState,
}

impl TrigramUsage {
    pub fn new(occurrence: &TrigramOccurrence, state: TrigramUsageState) -> Self {
        Self {
            trigram: occurrence.trigram.clone(),
            occurrence_count: occurrence.count,
            state,
        }
    }
}

/// Diagnostics of the last trigram intersection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchExecutionDetails {
    /// Trigrams left out after the early abort fired
    pub skipped_trigrams: Vec<String>,
    /// Per-trigram usage, in intersection order
    pub usage: Vec<TrigramUsage>,
    /// All requested trigrams, sorted ascending by estimated count
    pub occurrences: Vec<TrigramOccurrence>,
}

impl SearchExecutionDetails {
    pub fn was_aborted_early(&self) -> bool {
        !self.skipped_trigrams.is_empty()
    }
}

/// A verified search hit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResultCandidate {
    pub document_key: DocumentKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,
    /// Line number (1-based) to line text for the first matching lines
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub preview: BTreeMap<usize, String>,
}

impl SearchResultCandidate {
    pub fn new(document_key: DocumentKey) -> Self {
        Self {
            document_key,
            metadata: None,
            preview: BTreeMap::new(),
        }
    }

    pub fn relative_path(&self) -> Option<&str> {
        self.metadata.as_ref().map(|m| m.relative_path.as_str())
    }
}

/// Summary of an indexing run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    /// Documents written to the content index
    pub indexed_documents: usize,
    /// Documents whose class tags were written to the metadata index
    pub metadata_documents: usize,
    /// Files skipped because of errors; retry them in a later run
    pub failed: Vec<PathBuf>,
    /// Distinct content trigrams seen during this run
    pub content_trigrams: usize,
    /// Distinct metadata trigrams seen during this run
    pub metadata_trigrams: usize,
}
