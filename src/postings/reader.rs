//! Read path of the inverted trigram index
//!
//! Nothing here returns an error for missing or damaged data. An unknown
//! trigram has no documents, a corrupt shard ends the union early, and a
//! corrupt count file is answered with the flush threshold so the trigram is
//! ordered as "large" by the search.

use serde::Serialize;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use super::{CountRecord, ShardRecord, count_path, read_json_file, shard_path};
use crate::document_key::DocumentKey;
use crate::error::SearchError;
use crate::models::TrigramOccurrence;

#[derive(Debug, Clone)]
pub struct TrigramIndexReader {
    base: PathBuf,
    max_generations: u32,
    corrupt_count_estimate: u64,
}

/// Declared count versus the union of all shards of a trigram
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    pub trigram: String,
    /// `None` when there is no readable count file
    pub declared: Option<u64>,
    pub actual: u64,
    pub shards: u32,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.declared.unwrap_or(0) == self.actual
    }

    pub fn to_error(&self) -> Option<SearchError> {
        if self.is_consistent() {
            return None;
        }
        Some(SearchError::Consistency {
            trigram: self.trigram.clone(),
            declared: self.declared.unwrap_or(0),
            actual: self.actual,
        })
    }
}

impl TrigramIndexReader {
    /// Reader for the namespace directory `base`
    ///
    /// `max_generations` bounds the shards read per trigram and
    /// `corrupt_count_estimate` is reported for unreadable count files.
    pub fn new(base: impl Into<PathBuf>, max_generations: u32, corrupt_count_estimate: u64) -> Self {
        Self {
            base: base.into(),
            max_generations,
            corrupt_count_estimate,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Union of all generation shards of `trigram`
    pub fn document_ids_for_trigram(&self, trigram: &str) -> BTreeSet<DocumentKey> {
        self.load_shards(trigram).0
    }

    fn load_shards(&self, trigram: &str) -> (BTreeSet<DocumentKey>, u32) {
        let mut result = BTreeSet::new();
        let mut shards = 0;

        for generation in 0..self.max_generations {
            let path = shard_path(&self.base, trigram, generation);
            match read_json_file::<ShardRecord>(&path) {
                Ok(record) => {
                    result.extend(record.related_documents);
                    shards += 1;
                }
                Err(SearchError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                    break;
                }
                Err(e) => {
                    log::warn!("Stopping at unreadable shard of '{}': {}", trigram, e);
                    break;
                }
            }
        }

        (result, shards)
    }

    /// Cheap size estimate of the postings of `trigram`
    pub fn document_count_for_trigram(&self, trigram: &str) -> TrigramOccurrence {
        let count = match self.declared_count(trigram) {
            Ok(Some(count)) => count,
            Ok(None) => 0,
            Err(e) => {
                log::debug!("Unreadable count for '{}': {}", trigram, e);
                self.corrupt_count_estimate
            }
        };
        TrigramOccurrence::new(trigram, count)
    }

    fn declared_count(&self, trigram: &str) -> Result<Option<u64>, SearchError> {
        let path = count_path(&self.base, trigram);
        match read_json_file::<CountRecord>(&path) {
            Ok(record) => Ok(Some(record.related_documents_count)),
            Err(SearchError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Compare the declared count of `trigram` with its recomputed union
    pub fn check_consistency(&self, trigram: &str) -> ConsistencyReport {
        let declared = self.declared_count(trigram).ok().flatten();
        let (documents, shards) = self.load_shards(trigram);

        let report = ConsistencyReport {
            trigram: trigram.to_string(),
            declared,
            actual: documents.len() as u64,
            shards,
        };
        if let Some(e) = report.to_error() {
            log::warn!("{}", e);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postings::{TrigramIndexWriter, write_json_file};
    use tempfile::TempDir;

    fn key(i: usize) -> DocumentKey {
        DocumentKey::from_key_string(format!("{:032x}", i))
    }

    #[test]
    fn test_union_over_rollover() {
        let temp = TempDir::new().unwrap();
        let writer = TrigramIndexWriter::new(temp.path(), 5, 2).unwrap();
        for i in 0..23 {
            writer.add("abc", &key(i));
        }
        writer.save().unwrap();

        let reader = TrigramIndexReader::new(temp.path(), 4096, 3072);
        let ids = reader.document_ids_for_trigram("abc");
        assert_eq!(ids, (0..23).map(key).collect::<BTreeSet<_>>());
        assert_eq!(reader.document_count_for_trigram("abc").count, 23);

        let report = reader.check_consistency("abc");
        assert!(report.is_consistent());
        assert_eq!(report.shards, 5);
    }

    #[test]
    fn test_unknown_trigram() {
        let temp = TempDir::new().unwrap();
        let reader = TrigramIndexReader::new(temp.path(), 4096, 3072);

        assert!(reader.document_ids_for_trigram("zzz").is_empty());
        assert_eq!(reader.document_count_for_trigram("zzz").count, 0);
        assert!(reader.check_consistency("zzz").is_consistent());
    }

    #[test]
    fn test_corrupt_count_file_is_large() {
        let temp = TempDir::new().unwrap();
        let path = count_path(temp.path(), "abc");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "garbage").unwrap();

        let reader = TrigramIndexReader::new(temp.path(), 4096, 3072);
        assert_eq!(reader.document_count_for_trigram("abc").count, 3072);
    }

    #[test]
    fn test_corrupt_shard_stops_union() {
        let temp = TempDir::new().unwrap();
        let writer = TrigramIndexWriter::new(temp.path(), 2, 1).unwrap();
        for i in 0..6 {
            writer.add("abc", &key(i));
        }
        writer.save().unwrap();
        std::fs::write(shard_path(temp.path(), "abc", 1), "{").unwrap();

        let reader = TrigramIndexReader::new(temp.path(), 4096, 3072);
        assert_eq!(reader.document_ids_for_trigram("abc").len(), 2);

        let report = reader.check_consistency("abc");
        assert_eq!(report.declared, Some(6));
        assert_eq!(report.actual, 2);
        assert!(matches!(
            report.to_error(),
            Some(SearchError::Consistency { declared: 6, actual: 2, .. })
        ));
    }

    #[test]
    fn test_generation_bound() {
        let temp = TempDir::new().unwrap();
        let writer = TrigramIndexWriter::new(temp.path(), 1, 1).unwrap();
        for i in 0..5 {
            writer.add("abc", &key(i));
        }
        writer.save().unwrap();

        let reader = TrigramIndexReader::new(temp.path(), 3, 3072);
        assert_eq!(reader.document_ids_for_trigram("abc").len(), 3);
    }

    #[test]
    fn test_mismatched_declared_count() {
        let temp = TempDir::new().unwrap();
        write_json_file(
            &shard_path(temp.path(), "abc", 0),
            &ShardRecord {
                related_documents: [key(1)].into_iter().collect(),
                index_generation: 0,
                trigram: "abc".to_string(),
            },
        )
        .unwrap();
        write_json_file(
            &count_path(temp.path(), "abc"),
            &CountRecord {
                trigram: "abc".to_string(),
                related_documents_count: 9,
            },
        )
        .unwrap();

        let reader = TrigramIndexReader::new(temp.path(), 4096, 3072);
        assert!(!reader.check_consistency("abc").is_consistent());
    }
}
