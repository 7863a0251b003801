//! Document keys derived from paths relative to the crawl root
//!
//! A document key is a fixed-width hex digest of the relative path text.
//! It names every per-document cache file and every postings entry, so it
//! must be a pure function of the path: the same relative path always maps
//! to the same key, in every process and on every run.
//!
//! The hashed text joins the path components with `\`, so a file keeps
//! the key it was given by indexes built on Windows. Displayed paths keep
//! `/` separators.
//!
//! The hash function is a strategy. MD5 is the default (keys are 32 hex
//! characters); a keyed BLAKE3 variant exists for deployments that do not
//! want keys to be guessable from path names.

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};

use crate::error::{Result, SearchError};

/// Stable identifier of an indexed document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKey(String);

impl DocumentKey {
    /// Rehydrate a key that was read back from disk (file names, postings)
    pub fn from_key_string(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Hash function turning relative path text into a document key
///
/// `relative_path` uses `/` separators; implementations hash
/// [`key_text`] of it.
pub trait DocumentKeyStrategy: Send + Sync {
    fn generate_key(&self, relative_path: &str) -> DocumentKey;
}

/// Text that is hashed for a `/`-separated relative path
pub fn key_text(relative_path: &str) -> String {
    relative_path.replace('/', "\\")
}

/// MD5 of the UTF-8 key text, 32 lowercase hex characters
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5KeyStrategy;

impl DocumentKeyStrategy for Md5KeyStrategy {
    fn generate_key(&self, relative_path: &str) -> DocumentKey {
        let digest = Md5::digest(key_text(relative_path).as_bytes());
        DocumentKey(to_hex(&digest))
    }
}

/// Keyed BLAKE3 truncated to 128 bits, 32 lowercase hex characters
#[derive(Clone)]
pub struct Blake3KeyedStrategy {
    key: [u8; 32],
}

impl Blake3KeyedStrategy {
    const CONTEXT: &'static str = "triscan 2024 document key";

    /// Derive the hashing key from an arbitrary secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: blake3::derive_key(Self::CONTEXT, secret),
        }
    }
}

impl DocumentKeyStrategy for Blake3KeyedStrategy {
    fn generate_key(&self, relative_path: &str) -> DocumentKey {
        let hash = blake3::keyed_hash(&self.key, key_text(relative_path).as_bytes());
        DocumentKey(to_hex(&hash.as_bytes()[..16]))
    }
}

/// A document key together with the relative path it was derived from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentId {
    key: DocumentKey,
    relative_path: String,
}

impl DocumentId {
    /// Derive the id of `file` below `crawl_root`
    pub fn from_path(
        file: &Path,
        crawl_root: &Path,
        strategy: &dyn DocumentKeyStrategy,
    ) -> Result<Self> {
        let relative_path = relative_path_text(file, crawl_root)?;
        Ok(Self::from_relative_path(relative_path, strategy))
    }

    pub fn from_relative_path(
        relative_path: impl Into<String>,
        strategy: &dyn DocumentKeyStrategy,
    ) -> Self {
        let relative_path = relative_path.into();
        let key = strategy.generate_key(&relative_path);
        Self { key, relative_path }
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }
}

/// Relative path text with `/` separators, independent of the platform
pub fn relative_path_text(file: &Path, crawl_root: &Path) -> Result<String> {
    let relative = file.strip_prefix(crawl_root).map_err(|_| SearchError::Path {
        path: file.to_path_buf(),
        root: crawl_root.to_path_buf(),
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => {
                return Err(SearchError::Path {
                    path: file.to_path_buf(),
                    root: crawl_root.to_path_buf(),
                });
            }
        }
    }

    if parts.is_empty() {
        return Err(SearchError::Path {
            path: file.to_path_buf(),
            root: crawl_root.to_path_buf(),
        });
    }

    Ok(parts.join("/"))
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_md5_known_keys() {
        let strategy = Md5KeyStrategy;
        assert_eq!(
            strategy.generate_key("a/a.java").as_str(),
            "b299050fb1b506ef9ad13e6e55787a89"
        );
        assert_eq!(
            strategy.generate_key("a/b.java").as_str(),
            "f4bda76da7d5e4eafa0e0c893c00262a"
        );
    }

    #[test]
    fn test_key_text_uses_backslashes() {
        assert_eq!(key_text("a/a.java"), "a\\a.java");
        assert_eq!(key_text("top.txt"), "top.txt");
        // Both spellings name the same file
        assert_eq!(
            Md5KeyStrategy.generate_key("a/b.java"),
            Md5KeyStrategy.generate_key("a\\b.java")
        );
    }

    #[test]
    fn test_md5_is_fixed_width() {
        let strategy = Md5KeyStrategy;
        for path in ["", "x", "some/deeply/nested/File.java", "喫茶店.txt"] {
            assert_eq!(strategy.generate_key(path).as_str().len(), 32);
        }
    }

    #[test]
    fn test_blake3_keyed_is_deterministic_and_secret_dependent() {
        let first = Blake3KeyedStrategy::new(b"secret");
        let again = Blake3KeyedStrategy::new(b"secret");
        let other = Blake3KeyedStrategy::new(b"other");

        let key = first.generate_key("a/a.java");
        assert_eq!(key, again.generate_key("a/a.java"));
        assert_ne!(key, other.generate_key("a/a.java"));
        assert_eq!(key.as_str().len(), 32);
    }

    #[test]
    fn test_document_id_from_path() {
        let root = PathBuf::from("/crawl");
        let file = PathBuf::from("/crawl/a/a.java");

        let id = DocumentId::from_path(&file, &root, &Md5KeyStrategy).unwrap();
        assert_eq!(id.relative_path(), "a/a.java");
        assert_eq!(id.key().as_str(), "b299050fb1b506ef9ad13e6e55787a89");
    }

    #[test]
    fn test_path_outside_root_fails() {
        let root = PathBuf::from("/crawl");
        let file = PathBuf::from("/elsewhere/a.java");

        let err = DocumentId::from_path(&file, &root, &Md5KeyStrategy).unwrap_err();
        assert!(matches!(err, SearchError::Path { .. }));
    }

    #[test]
    fn test_root_itself_is_not_a_document() {
        let root = PathBuf::from("/crawl");
        assert!(relative_path_text(&root, &root).is_err());
    }
}
