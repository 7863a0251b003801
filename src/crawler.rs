//! Crawl a directory tree for indexable source files

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use crate::config::IndexConfig;

/// File name patterns of indexed files (matched case-sensitively)
pub const SOURCE_FILE_PATTERNS: &[&str] = &[
    "*.java",
    "*.{c,cpp,h,hpp}",
    "*.{xtend,xtext}",
    "*.py",
    "*.MF",
    "*.{properties,ini,persistence}",
    "*.json",
    "*.{txt,text,MD,md}",
    "*.{xml,pom}",
    "*.{htm,html}",
];

/// Archives are recognized but not indexed yet
pub const ARCHIVE_PATTERNS: &[&str] = &["*.{zip,jar}"];

pub struct SourceCrawler {
    root: PathBuf,
    sources: GlobSet,
    archives: GlobSet,
    follow_symlinks: bool,
    max_file_size: u64,
    excluded: Vec<PathBuf>,
}

impl SourceCrawler {
    pub fn new(root: impl AsRef<Path>, config: &IndexConfig) -> Result<Self> {
        Self::with_patterns(root, SOURCE_FILE_PATTERNS, config)
    }

    /// Crawler accepting files whose name matches one of `patterns`
    pub fn with_patterns(root: impl AsRef<Path>, patterns: &[&str], config: &IndexConfig) -> Result<Self> {
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            sources: build_glob_set(patterns)?,
            archives: build_glob_set(ARCHIVE_PATTERNS)?,
            follow_symlinks: config.follow_symlinks,
            max_file_size: config.max_file_size,
            excluded: Vec::new(),
        })
    }

    /// Never descend into `dir` (e.g. an index folder inside the crawl root)
    pub fn exclude(mut self, dir: impl AsRef<Path>) -> Self {
        self.excluded.push(dir.as_ref().to_path_buf());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walk the crawl root; every call starts a fresh walk
    pub fn files(&self) -> impl Iterator<Item = PathBuf> + '_ {
        let excluded = self.excluded.clone();

        // Hidden and ignored files are indexed too
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .follow_links(self.follow_symlinks)
            .filter_entry(move |entry| !excluded.iter().any(|dir| entry.path() == dir))
            .build();

        walker.filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    return None;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                return None;
            }

            let path = entry.path();
            if self.should_index(path) {
                Some(path.to_path_buf())
            } else {
                None
            }
        })
    }

    /// All indexable files, sorted
    pub fn crawl(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self.files().collect();
        files.sort();
        files
    }

    pub fn should_index(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };

        if self.archives.is_match(name) {
            log::debug!("Skipping archive {}", path.display());
            return false;
        }
        if !self.sources.is_match(name) {
            return false;
        }

        if let Ok(metadata) = std::fs::metadata(path) {
            if metadata.len() > self.max_file_size {
                log::debug!("Skipping {} (too large: {} bytes)", path.display(), metadata.len());
                return false;
            }
        }

        true
    }
}

fn build_glob_set(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))?);
    }
    builder.build().context("Failed to build glob set")
}
