//! Document classifiers: attach class tags to a document's metadata
//!
//! The indexer calls a classifier exactly twice per document: once with the
//! file path before the content is read, once with the unique wordlist.

use std::path::Path;

use crate::document_key::DocumentKey;
use crate::models::DocumentMetadata;

pub trait Classifier: Send + Sync {
    fn classify_path(&self, key: &DocumentKey, metadata: &mut DocumentMetadata, path: &Path);

    fn classify_words(&self, key: &DocumentKey, metadata: &mut DocumentMetadata, wordlist: &[String]);
}

pub const FILETYPE: &str = "filetype";
pub const UNIT_TEST: &str = "unit-test";

const ASSERT_WORDS: &[&str] = &["assertequals", "assertthat", "asserttrue", "assertfalse"];
const JUNIT_WORDS: &[&str] = &[
    "junit",
    "@before",
    "@test",
    "@ignore",
    "@beforeall",
    "@after",
    "@afterall",
];
const MATCHER_WORDS: &[&str] = &["hamcrest", "matchers", "equalto", "sameinstance"];
const MOCKITO_WORDS: &[&str] = &["mockito", "mock", "spy", "thenreturn"];

/// File type by extension, plus unit-test detection for Java
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleClassifier;

impl Classifier for SimpleClassifier {
    fn classify_path(&self, _key: &DocumentKey, metadata: &mut DocumentMetadata, path: &Path) {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("java") => metadata.add_class(FILETYPE, "java"),
            Some("py") => metadata.add_class(FILETYPE, "python"),
            _ => {}
        }
    }

    fn classify_words(&self, _key: &DocumentKey, metadata: &mut DocumentMetadata, wordlist: &[String]) {
        if metadata.class(FILETYPE) != Some("java") {
            return;
        }

        // Two different kinds of testing vocabulary make a unit test
        let groups = [ASSERT_WORDS, JUNIT_WORDS, MATCHER_WORDS, MOCKITO_WORDS];
        let hits = groups
            .iter()
            .filter(|group| group.iter().any(|word| wordlist.iter().any(|w| w == word)))
            .count();

        if hits >= 2 {
            metadata.add_class(UNIT_TEST, "true");
        }
    }
}
