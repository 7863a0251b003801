//! Semantic query tree

use std::fmt;

/// A parsed search query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryNode {
    Empty,
    /// A word that must occur (as a substring of some indexed word)
    Text(String),
    /// A quoted phrase
    ExactMatchingText(String),
    /// A class tag constraint, e.g. `filetype:java`
    MetadataText { key: String, value: String },
    And(Vec<QueryNode>),
    Or(Vec<QueryNode>),
    Including(Box<QueryNode>),
    Excluding(Box<QueryNode>),
    /// A node kind produced elsewhere that this crate cannot evaluate
    Unsupported(String),
}

impl QueryNode {
    pub fn text(word: impl Into<String>) -> Self {
        QueryNode::Text(word.into())
    }

    pub fn metadata(key: impl Into<String>, value: impl Into<String>) -> Self {
        QueryNode::MetadataText {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn including(child: QueryNode) -> Self {
        QueryNode::Including(Box::new(child))
    }

    pub fn excluding(child: QueryNode) -> Self {
        QueryNode::Excluding(Box::new(child))
    }

    pub fn children(&self) -> Vec<&QueryNode> {
        match self {
            QueryNode::And(children) | QueryNode::Or(children) => children.iter().collect(),
            QueryNode::Including(child) | QueryNode::Excluding(child) => vec![child.as_ref()],
            QueryNode::Empty
            | QueryNode::Text(_)
            | QueryNode::ExactMatchingText(_)
            | QueryNode::MetadataText { .. }
            | QueryNode::Unsupported(_) => Vec::new(),
        }
    }

    /// Lowercased words every result must contain
    ///
    /// Collected from text leaves reachable without passing an `Excluding`
    /// or `Or` node.
    pub fn required_words(&self) -> Vec<String> {
        let mut words = Vec::new();
        self.collect_words(false, &mut words);
        words
    }

    /// Lowercased words no result may contain
    pub fn excluded_words(&self) -> Vec<String> {
        let mut words = Vec::new();
        self.collect_words(true, &mut words);
        words
    }

    fn collect_words(&self, excluded: bool, out: &mut Vec<String>) {
        match self {
            QueryNode::Text(word) | QueryNode::ExactMatchingText(word) => {
                if !excluded {
                    out.push(word.to_lowercase());
                }
            }
            QueryNode::And(children) => {
                for child in children {
                    child.collect_words(excluded, out);
                }
            }
            QueryNode::Including(child) => child.collect_words(excluded, out),
            QueryNode::Excluding(child) => {
                if excluded {
                    let mut inner = Vec::new();
                    child.collect_words(false, &mut inner);
                    out.extend(inner);
                }
            }
            QueryNode::Empty
            | QueryNode::MetadataText { .. }
            | QueryNode::Or(_)
            | QueryNode::Unsupported(_) => {}
        }
    }

    /// `(key, lowercased value)` pairs every result must carry as class tags
    pub fn required_metadata(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        self.collect_metadata(false, &mut pairs);
        pairs
    }

    /// `(key, lowercased value)` pairs no result may carry as class tags
    pub fn excluded_metadata(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        self.collect_metadata(true, &mut pairs);
        pairs
    }

    fn collect_metadata(&self, excluded: bool, out: &mut Vec<(String, String)>) {
        match self {
            QueryNode::MetadataText { key, value } => {
                if !excluded {
                    out.push((key.clone(), value.to_lowercase()));
                }
            }
            QueryNode::And(children) => {
                for child in children {
                    child.collect_metadata(excluded, out);
                }
            }
            QueryNode::Including(child) => child.collect_metadata(excluded, out),
            QueryNode::Excluding(child) => {
                if excluded {
                    child.collect_metadata(false, out);
                }
            }
            QueryNode::Empty
            | QueryNode::Text(_)
            | QueryNode::ExactMatchingText(_)
            | QueryNode::Or(_)
            | QueryNode::Unsupported(_) => {}
        }
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Empty => write!(f, "[ 'EMPTY' ]"),
            QueryNode::Text(word) => write!(f, "[ 'TEXT', '{}' ]", word),
            QueryNode::ExactMatchingText(phrase) => write!(f, "[ 'EXACT', '{}' ]", phrase),
            QueryNode::MetadataText { key, value } => write!(f, "[ 'METADATA', '{}':'{}' ]", key, value),
            QueryNode::And(children) => write_list(f, "AND", children),
            QueryNode::Or(children) => write_list(f, "OR", children),
            QueryNode::Including(child) => write!(f, "[ 'INCLUDING', {} ]", child),
            QueryNode::Excluding(child) => write!(f, "[ 'EXCLUDING', {} ]", child),
            QueryNode::Unsupported(kind) => write!(f, "[ 'UNSUPPORTED', '{}' ]", kind),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, name: &str, children: &[QueryNode]) -> fmt::Result {
    write!(f, "[ '{}'", name)?;
    for child in children {
        write!(f, ", {}", child)?;
    }
    write!(f, " ]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_and_excluded_words() {
        let ast = QueryNode::And(vec![
            QueryNode::text("KeyStore"),
            QueryNode::including(QueryNode::ExactMatchingText("load".into())),
            QueryNode::excluding(QueryNode::text("Legacy")),
            QueryNode::Or(vec![QueryNode::text("a1"), QueryNode::text("b1")]),
            QueryNode::metadata("filetype", "Java"),
        ]);

        assert_eq!(ast.required_words(), vec!["keystore", "load"]);
        assert_eq!(ast.excluded_words(), vec!["legacy"]);
        assert_eq!(
            ast.required_metadata(),
            vec![("filetype".to_string(), "java".to_string())]
        );
        assert!(ast.excluded_metadata().is_empty());
    }

    #[test]
    fn test_excluded_metadata() {
        let ast = QueryNode::And(vec![
            QueryNode::text("keystore"),
            QueryNode::excluding(QueryNode::metadata("filetype", "Java")),
            QueryNode::metadata("unit-test", "true"),
        ]);

        assert_eq!(
            ast.excluded_metadata(),
            vec![("filetype".to_string(), "java".to_string())]
        );
        assert_eq!(
            ast.required_metadata(),
            vec![("unit-test".to_string(), "true".to_string())]
        );
        assert!(ast.excluded_words().is_empty());
    }

    #[test]
    fn test_display() {
        let ast = QueryNode::And(vec![QueryNode::text("foo"), QueryNode::metadata("k", "v")]);
        assert_eq!(ast.to_string(), "[ 'AND', [ 'TEXT', 'foo' ], [ 'METADATA', 'k':'v' ] ]");
    }

    #[test]
    fn test_children() {
        let ast = QueryNode::excluding(QueryNode::text("x"));
        assert_eq!(ast.children(), vec![&QueryNode::text("x")]);
        assert!(QueryNode::Empty.children().is_empty());
    }
}
