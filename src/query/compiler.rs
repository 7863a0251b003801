//! Compile a semantic query into the trigrams a match must contain
//!
//! The compiled form over-approximates: every document matching the
//! positive words of the query contains all compiled trigrams, but not
//! every document containing the trigrams matches. Search verifies the
//! candidates afterwards.

use std::collections::BTreeSet;

use super::ast::QueryNode;
use crate::error::{Result, SearchError};
use crate::trigram::{Trigram, unique_trigrams_from_word};

static NO_TRIGRAMS: BTreeSet<Trigram> = BTreeSet::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreQueryNode {
    /// No trigram constraint
    Empty,
    Trigrams {
        content: BTreeSet<Trigram>,
        metadata: BTreeSet<Trigram>,
    },
}

impl CoreQueryNode {
    pub fn content_trigrams(&self) -> &BTreeSet<Trigram> {
        match self {
            CoreQueryNode::Empty => &NO_TRIGRAMS,
            CoreQueryNode::Trigrams { content, .. } => content,
        }
    }

    pub fn metadata_trigrams(&self) -> &BTreeSet<Trigram> {
        match self {
            CoreQueryNode::Empty => &NO_TRIGRAMS,
            CoreQueryNode::Trigrams { metadata, .. } => metadata,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content_trigrams().is_empty() && self.metadata_trigrams().is_empty()
    }
}

/// Compile `ast` into its trigram filter
///
/// `Or` and unknown node kinds cannot be reduced to a conjunction of
/// trigrams and fail with [`SearchError::UnsupportedQuery`]. `Excluding`
/// contributes no trigrams.
pub fn compile(ast: &QueryNode) -> Result<CoreQueryNode> {
    match ast {
        QueryNode::Empty => Ok(CoreQueryNode::Empty),
        // Phrases are not segmented into words; they compile like a single word
        QueryNode::Text(word) | QueryNode::ExactMatchingText(word) => Ok(CoreQueryNode::Trigrams {
            content: unique_trigrams_from_word(&word.to_lowercase()),
            metadata: BTreeSet::new(),
        }),
        QueryNode::MetadataText { value, .. } => Ok(CoreQueryNode::Trigrams {
            content: BTreeSet::new(),
            metadata: unique_trigrams_from_word(&value.to_lowercase()),
        }),
        QueryNode::And(children) => {
            let mut content = BTreeSet::new();
            let mut metadata = BTreeSet::new();
            for child in children {
                let compiled = compile(child)?;
                content.extend(compiled.content_trigrams().iter().cloned());
                metadata.extend(compiled.metadata_trigrams().iter().cloned());
            }
            Ok(CoreQueryNode::Trigrams { content, metadata })
        }
        QueryNode::Or(_) => Err(SearchError::unsupported(
            "OR queries cannot be compiled into a trigram filter",
        )),
        QueryNode::Excluding(_) => Ok(CoreQueryNode::Empty),
        QueryNode::Including(child) => compile(child),
        QueryNode::Unsupported(kind) => Err(SearchError::unsupported(format!(
            "node type '{}' is not supported",
            kind
        ))),
    }
}

/// Whether any `MetadataText` node occurs anywhere in `ast`
pub fn has_metadata_text_node(ast: &QueryNode) -> bool {
    match ast {
        QueryNode::MetadataText { .. } => true,
        other => other.children().into_iter().any(has_metadata_text_node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigram::{unique_trigrams_from_wordlist, unique_wordlist};

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty() {
        assert_eq!(compile(&QueryNode::Empty).unwrap(), CoreQueryNode::Empty);
    }

    #[test]
    fn test_text_is_lowercased() {
        let core = compile(&QueryNode::text("ABCd")).unwrap();
        assert_eq!(core.content_trigrams(), &set(&["abc", "bcd"]));
        assert!(core.metadata_trigrams().is_empty());
    }

    #[test]
    fn test_exact_matches_like_text() {
        assert_eq!(
            compile(&QueryNode::ExactMatchingText("hello".into())).unwrap(),
            compile(&QueryNode::text("hello")).unwrap()
        );
    }

    #[test]
    fn test_metadata_goes_to_metadata_set() {
        let core = compile(&QueryNode::metadata("filetype", "Java")).unwrap();
        assert!(core.content_trigrams().is_empty());
        assert_eq!(core.metadata_trigrams(), &set(&["jav", "ava"]));
    }

    #[test]
    fn test_and_unions_children() {
        let ast = QueryNode::And(vec![
            QueryNode::text("abcd"),
            QueryNode::text("bcde"),
            QueryNode::metadata("filetype", "python"),
            QueryNode::excluding(QueryNode::text("zzzz")),
        ]);
        let core = compile(&ast).unwrap();
        assert_eq!(core.content_trigrams(), &set(&["abc", "bcd", "cde"]));
        assert_eq!(
            core.metadata_trigrams(),
            &set(&["pyt", "yth", "tho", "hon"])
        );
    }

    #[test]
    fn test_or_is_unsupported() {
        let ast = QueryNode::Or(vec![QueryNode::text("abc"), QueryNode::text("def")]);
        let err = compile(&ast).unwrap_err();
        assert!(err.is_query_error());

        // Also when nested
        let nested = QueryNode::And(vec![QueryNode::text("abc"), ast]);
        assert!(matches!(compile(&nested), Err(SearchError::UnsupportedQuery(_))));
    }

    #[test]
    fn test_unknown_node_is_unsupported() {
        let err = compile(&QueryNode::Unsupported("near".into())).unwrap_err();
        assert!(err.to_string().contains("near"));
    }

    #[test]
    fn test_excluding_is_empty_and_including_is_child() {
        assert_eq!(
            compile(&QueryNode::excluding(QueryNode::text("abc"))).unwrap(),
            CoreQueryNode::Empty
        );
        assert_eq!(
            compile(&QueryNode::including(QueryNode::text("abc"))).unwrap(),
            compile(&QueryNode::text("abc")).unwrap()
        );
    }

    #[test]
    fn test_has_metadata_text_node() {
        assert!(!has_metadata_text_node(&QueryNode::text("abc")));
        assert!(has_metadata_text_node(&QueryNode::And(vec![
            QueryNode::text("abc"),
            QueryNode::including(QueryNode::metadata("k", "value")),
        ])));
        assert!(has_metadata_text_node(&QueryNode::excluding(QueryNode::metadata("k", "v"))));
    }

    #[test]
    fn test_compiled_trigrams_are_in_matching_documents() {
        let document = "public KeyStore createKeyStore(String type) throws Exception";
        let doc_trigrams = unique_trigrams_from_wordlist(&unique_wordlist(document));

        let ast = QueryNode::And(vec![
            QueryNode::text("KeyStore"),
            QueryNode::including(QueryNode::text("throws")),
            QueryNode::text("eateKey"),
        ]);
        let core = compile(&ast).unwrap();
        assert!(core.content_trigrams().is_subset(&doc_trigrams));
    }
}
