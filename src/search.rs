//! Search engine
//!
//! # Algorithm
//!
//! 1. Read the cheap count estimate of every required trigram
//! 2. Sort trigrams ascending by estimate (stable, ties in lexicographic order)
//! 3. Seed the result with the postings of the smallest trigram
//! 4. Intersect the postings of each further trigram into the result
//! 5. Stop early once a trigram is more than `ratio` times larger than the
//!    current result; the remaining trigrams are recorded as skipped
//! 6. Verify every candidate against its stored wordlist
//!
//! Steps 1-5 may return false positives but never lose a true match, so
//! verification (step 6) is what makes results exact. A result where some
//! candidate could not be verified is returned but never cached.
//!
//! Content and metadata trigrams are searched by two independent
//! [`TrigramSearch`] instances with their own abort ratio and diagnostics.

use std::collections::{BTreeMap, BTreeSet};

use crate::cache::{PreviewMap, query_key};
use crate::document_key::DocumentKey;
use crate::error::Result;
use crate::index::Index;
use crate::models::{
    DocumentMetadata, SearchExecutionDetails, SearchResultCandidate, TrigramOccurrence,
    TrigramUsage, TrigramUsageState,
};
use crate::postings::TrigramIndexReader;
use crate::query::{QueryNode, compile, has_metadata_text_node};
use crate::trigram::{Trigram, split_words, unique_trigrams_from_word};

/// Maximum preview lines per result
pub const MAX_PREVIEW_LINES: usize = 3;

/// Selectivity-ordered intersection over one trigram namespace
#[derive(Debug, Clone)]
pub struct TrigramSearch {
    reader: TrigramIndexReader,
    abort_ratio: u64,
    details: SearchExecutionDetails,
}

impl TrigramSearch {
    pub fn new(reader: TrigramIndexReader, abort_ratio: u64) -> Self {
        Self {
            reader,
            abort_ratio,
            details: SearchExecutionDetails::default(),
        }
    }

    /// Keys of the documents that may contain all of `trigrams`
    ///
    /// An empty trigram set matches nothing.
    pub fn search_trigrams(&mut self, trigrams: &BTreeSet<Trigram>) -> BTreeSet<DocumentKey> {
        let mut details = SearchExecutionDetails::default();

        let mut occurrences: Vec<TrigramOccurrence> = trigrams
            .iter()
            .map(|trigram| self.reader.document_count_for_trigram(trigram))
            .collect();
        occurrences.sort_by_key(|occurrence| occurrence.count);

        let mut result = BTreeSet::new();
        let mut remaining = occurrences.iter();

        if let Some(seed) = remaining.next() {
            result = self.reader.document_ids_for_trigram(&seed.trigram);
            details
                .usage
                .push(TrigramUsage::new(seed, TrigramUsageState::Success));
        }

        while let Some(occurrence) = remaining.next() {
            let postings = self.reader.document_ids_for_trigram(&occurrence.trigram);
            let before = result.len();
            result.retain(|key| postings.contains(key));

            let state = if result.len() < before {
                TrigramUsageState::Success
            } else {
                TrigramUsageState::Failed
            };
            details.usage.push(TrigramUsage::new(occurrence, state));

            if occurrence.count > self.abort_ratio.saturating_mul(result.len() as u64) {
                for skipped in remaining.by_ref() {
                    details.skipped_trigrams.push(skipped.trigram.clone());
                    details
                        .usage
                        .push(TrigramUsage::new(skipped, TrigramUsageState::Unknown));
                }
            }
        }

        if details.was_aborted_early() {
            log::debug!(
                "Early abort with {} candidates, skipped {:?}",
                result.len(),
                details.skipped_trigrams
            );
        }

        details.occurrences = occurrences;
        self.details = details;
        result
    }

    /// Diagnostics of the last call to [`search_trigrams`](Self::search_trigrams)
    pub fn execution_details(&self) -> &SearchExecutionDetails {
        &self.details
    }
}

/// Term and query search over one index
pub struct SearchEngine<'a> {
    index: &'a Index,
    content: TrigramSearch,
    metadata: TrigramSearch,
}

impl<'a> SearchEngine<'a> {
    pub fn new(index: &'a Index) -> Self {
        let config = index.config();
        Self {
            content: TrigramSearch::new(index.content_reader(), config.content_abort_ratio),
            metadata: TrigramSearch::new(index.metadata_reader(), config.metadata_abort_ratio),
            index,
        }
    }

    pub fn content_execution_details(&self) -> &SearchExecutionDetails {
        self.content.execution_details()
    }

    pub fn metadata_execution_details(&self) -> &SearchExecutionDetails {
        self.metadata.execution_details()
    }

    /// Unverified candidates for a single term
    pub fn candidates_for_term(&mut self, term: &str) -> BTreeSet<DocumentKey> {
        let trigrams = unique_trigrams_from_word(&term.to_lowercase());
        self.content.search_trigrams(&trigrams)
    }

    /// Documents containing `term` as part of one of their words
    pub fn search(&mut self, term: &str) -> Result<Vec<SearchResultCandidate>> {
        let needle = term.to_lowercase();
        let cache_key = query_key(term);
        if let Some(results) = self.cached_results(&cache_key) {
            return Ok(results);
        }

        let candidates = self.candidates_for_term(term);
        log::debug!("{} candidates for '{}'", candidates.len(), term);

        let (verified, complete) = verify(candidates, |key| {
            self.wordlist_matches(key, std::slice::from_ref(&needle), &[])
        });

        Ok(self.finish(&cache_key, verified, Some(&needle), complete))
    }

    /// Evaluate a semantic query
    ///
    /// Fails only if the query cannot be compiled. A query without any
    /// positive trigram (only exclusions, or only words shorter than three
    /// characters) matches nothing.
    pub fn search_query(&mut self, ast: &QueryNode) -> Result<Vec<SearchResultCandidate>> {
        let core = compile(ast)?;

        let cache_key = query_key(&ast.to_string());
        if let Some(results) = self.cached_results(&cache_key) {
            return Ok(results);
        }

        let content = if core.content_trigrams().is_empty() {
            None
        } else {
            Some(self.content.search_trigrams(core.content_trigrams()))
        };

        let metadata = if has_metadata_text_node(ast) && !core.metadata_trigrams().is_empty() {
            Some(self.metadata.search_trigrams(core.metadata_trigrams()))
        } else {
            None
        };

        let candidates = match (content, metadata) {
            (Some(content), Some(metadata)) => content.intersection(&metadata).cloned().collect(),
            (Some(content), None) => content,
            (None, Some(metadata)) => metadata,
            (None, None) => BTreeSet::new(),
        };

        let required = ast.required_words();
        let excluded = ast.excluded_words();
        let required_metadata = ast.required_metadata();
        let excluded_metadata = ast.excluded_metadata();

        let (verified, complete) = verify(candidates, |key| {
            let words = if required.is_empty() && excluded.is_empty() {
                Some(true)
            } else {
                self.wordlist_matches(key, &required, &excluded)
            };
            match words {
                Some(true) => self.metadata_matches(key, &required_metadata, &excluded_metadata),
                other => other,
            }
        });

        Ok(self.finish(
            &cache_key,
            verified,
            required.first().map(String::as_str),
            complete,
        ))
    }

    /// Check a document's wordlist: every required word must occur in some
    /// word, no excluded term in any
    ///
    /// An excluded term spanning several words (a phrase) rejects the
    /// document only if each of its words occurs. `None` if the wordlist
    /// cannot be read.
    fn wordlist_matches(
        &self,
        key: &DocumentKey,
        required: &[String],
        excluded: &[String],
    ) -> Option<bool> {
        let wordlist = match self.index.wordlist_cache().load_wordlist(key) {
            Ok(Some(wordlist)) => wordlist,
            Ok(None) => {
                log::warn!("Candidate {} has no wordlist", key);
                return None;
            }
            Err(e) => {
                log::warn!("Cannot verify candidate {}: {}", key, e);
                return None;
            }
        };

        let contains = |needle: &str| wordlist.iter().any(|word| word.contains(needle));
        let is_excluded = |term: &String| {
            let parts = split_words(term);
            !parts.is_empty() && parts.iter().all(|part| contains(part.as_str()))
        };
        Some(required.iter().all(|word| contains(word.as_str())) && !excluded.iter().any(is_excluded))
    }

    /// Check a document's class tags; `None` if its metadata cannot be read
    fn metadata_matches(
        &self,
        key: &DocumentKey,
        required: &[(String, String)],
        excluded: &[(String, String)],
    ) -> Option<bool> {
        if required.is_empty() && excluded.is_empty() {
            return Some(true);
        }

        let metadata = match self.index.metadata_cache().load(key) {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                log::warn!("Candidate {} has no metadata", key);
                return None;
            }
            Err(e) => {
                log::warn!("Cannot verify metadata of {}: {}", key, e);
                return None;
            }
        };

        let carries = |(name, value): &(String, String)| {
            metadata
                .class(name)
                .is_some_and(|class| class.to_lowercase().contains(value.as_str()))
        };
        Some(required.iter().all(|pair| carries(pair)) && !excluded.iter().any(|pair| carries(pair)))
    }

    fn load_metadata(&self, key: &DocumentKey) -> Option<DocumentMetadata> {
        match self.index.metadata_cache().load(key) {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!("Unreadable metadata for {}: {}", key, e);
                None
            }
        }
    }

    fn cached_results(&self, cache_key: &str) -> Option<Vec<SearchResultCandidate>> {
        if !self.index.config().use_query_cache {
            return None;
        }

        let cache = self.index.query_cache();
        let keys = cache.load_query_result(cache_key)?;
        let mut preview = cache.load_preview(cache_key).unwrap_or_default();
        log::debug!("Query cache hit {} ({} results)", cache_key, keys.len());

        Some(
            keys.into_iter()
                .map(|key| {
                    let mut candidate = SearchResultCandidate::new(key);
                    candidate.metadata = self.load_metadata(&candidate.document_key);
                    candidate.preview = preview.remove(&candidate.document_key).unwrap_or_default();
                    candidate
                })
                .collect(),
        )
    }

    /// Attach metadata and previews, then remember the result if `complete`
    fn finish(
        &self,
        cache_key: &str,
        keys: Vec<DocumentKey>,
        preview_term: Option<&str>,
        complete: bool,
    ) -> Vec<SearchResultCandidate> {
        let mut results = Vec::with_capacity(keys.len());
        let mut previews = PreviewMap::new();

        for key in keys {
            let mut candidate = SearchResultCandidate::new(key);
            candidate.metadata = self.load_metadata(&candidate.document_key);

            if let Some(term) = preview_term {
                candidate.preview = self.preview_for(&candidate.document_key, term);
                if !candidate.preview.is_empty() {
                    previews.insert(candidate.document_key.clone(), candidate.preview.clone());
                }
            }
            results.push(candidate);
        }

        if !complete {
            log::debug!("Not caching {}: some candidates could not be verified", cache_key);
        } else if self.index.config().use_query_cache {
            let cache = self.index.query_cache();
            let keys: Vec<DocumentKey> = results.iter().map(|r| r.document_key.clone()).collect();
            if let Err(e) = cache
                .save_query_result(cache_key, &keys)
                .and_then(|()| cache.save_preview(cache_key, &previews))
            {
                log::warn!("Failed to cache query result: {}", e);
            }
        }

        results
    }

    fn preview_for(&self, key: &DocumentKey, term: &str) -> BTreeMap<usize, String> {
        match self.index.document_cache().load_content(key) {
            Ok(Some(content)) => extract_preview(&content, term),
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                log::debug!("No preview for {}: {}", key, e);
                BTreeMap::new()
            }
        }
    }
}

/// Keep the candidates `check` accepts
///
/// The flag is false if `check` could not decide for some candidate.
fn verify(
    candidates: BTreeSet<DocumentKey>,
    check: impl Fn(&DocumentKey) -> Option<bool>,
) -> (Vec<DocumentKey>, bool) {
    let mut complete = true;
    let mut verified = Vec::new();
    for key in candidates {
        match check(&key) {
            Some(true) => verified.push(key),
            Some(false) => {}
            None => complete = false,
        }
    }
    (verified, complete)
}

/// First lines (1-based) whose lowercased text contains `term`
pub fn extract_preview(content: &str, term: &str) -> BTreeMap<usize, String> {
    let term = term.to_lowercase();
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| line.to_lowercase().contains(&term))
        .take(MAX_PREVIEW_LINES)
        .map(|(number, line)| (number + 1, line.trim().to_string()))
        .collect()
}
