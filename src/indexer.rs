//! Indexing pipelines
//!
//! The content pass crawls a directory tree and, for every accepted file,
//! stores a copy of the content, the wordlist artifacts and the document
//! metadata, then feeds the document's trigrams to the content index. The
//! metadata pass afterwards indexes the class tags of every stored metadata
//! record into the metadata index.
//!
//! Every run is a full rebuild: postings from an earlier run are removed
//! before the first shard is written.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::classifier::{Classifier, SimpleClassifier};
use crate::config::IndexConfig;
use crate::crawler::SourceCrawler;
use crate::document_key::{DocumentId, DocumentKeyStrategy, Md5KeyStrategy};
use crate::error::SearchError;
use crate::index::Index;
use crate::models::{DocumentMetadata, IndexStats};
use crate::postings::TrigramIndexWriter;
use crate::trigram::{Trigram, WordExtraction, unique_trigrams_from_word};

/// Builds the content and metadata indexes of one index root
pub struct Indexer<'a> {
    index: &'a Index,
    strategy: Box<dyn DocumentKeyStrategy>,
    classifier: Box<dyn Classifier>,
}

impl<'a> Indexer<'a> {
    /// Indexer with MD5 document keys and the simple file-type classifier
    pub fn new(index: &'a Index) -> Self {
        Self {
            index,
            strategy: Box::new(Md5KeyStrategy),
            classifier: Box::new(SimpleClassifier),
        }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn DocumentKeyStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_classifier(mut self, classifier: Box<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Rebuild the index from all files below `crawl_root`
    pub fn index(&self, crawl_root: impl AsRef<Path>, show_progress: bool) -> Result<IndexStats> {
        let crawl_root = crawl_root.as_ref();
        let start = Instant::now();
        log::info!(
            "Indexing {} into {}",
            crawl_root.display(),
            self.index.root().display()
        );

        IndexConfig::init_config_toml(self.index.root())?;
        self.index.clear_postings()?;

        let files = self.crawler(crawl_root)?.crawl();
        let total_files = files.len();
        log::info!("Discovered {} files to index", total_files);

        let num_threads = self.index.config().effective_threads();
        log::info!(
            "Using {} threads for parallel indexing (out of {} available)",
            num_threads,
            num_cpus::get()
        );

        let pb = progress_bar(total_files as u64, show_progress)?;
        let writer = self.index.content_writer()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .context("Failed to create thread pool")?;

        let failed: Vec<PathBuf> = pool.install(|| {
            files
                .par_iter()
                .filter_map(|file| {
                    let outcome = self.index_document(file, crawl_root, &writer);
                    pb.inc(1);
                    match outcome {
                        Ok(()) => None,
                        Err(e) => {
                            log::warn!("Skipping {}: {}", file.display(), e);
                            Some(file.clone())
                        }
                    }
                })
                .collect()
        });

        pb.set_message("writing postings...");
        writer.save().context("Failed to write content postings")?;

        let mut stats = IndexStats {
            indexed_documents: total_files - failed.len(),
            failed,
            content_trigrams: writer.trigram_count(),
            ..Default::default()
        };

        pb.set_message("indexing metadata...");
        MetadataIndexer::new(self.index).index_all(&mut stats)?;

        self.index.write_format_hash()?;
        pb.finish_and_clear();

        log::info!(
            "Indexed {} documents ({} failed, {} content trigrams, {} metadata trigrams) in {:.2?}",
            stats.indexed_documents,
            stats.failed.len(),
            stats.content_trigrams,
            stats.metadata_trigrams,
            start.elapsed()
        );
        Ok(stats)
    }

    fn crawler(&self, crawl_root: &Path) -> Result<SourceCrawler> {
        let crawler = SourceCrawler::new(crawl_root, self.index.config())?;

        // Keep the index out of its own crawl
        let (Ok(crawl), Ok(index)) = (crawl_root.canonicalize(), self.index.root().canonicalize())
        else {
            return Ok(crawler);
        };
        match index.strip_prefix(&crawl) {
            Ok(relative) if !relative.as_os_str().is_empty() => {
                log::debug!("Excluding index folder {} from crawl", relative.display());
                Ok(crawler.exclude(crawl_root.join(relative)))
            }
            _ => Ok(crawler),
        }
    }

    fn index_document(
        &self,
        file: &Path,
        crawl_root: &Path,
        writer: &TrigramIndexWriter,
    ) -> crate::error::Result<()> {
        let id = DocumentId::from_path(file, crawl_root, self.strategy.as_ref())?;
        let key = id.key();

        let bytes = std::fs::read(file).map_err(|e| SearchError::io(file, e))?;
        let mut metadata = DocumentMetadata::new(&id, bytes.len() as u64);
        self.classifier.classify_path(key, &mut metadata, file);

        self.index.document_cache().create_document_copy(key, &bytes)?;

        let content = String::from_utf8_lossy(&bytes);
        let extraction = WordExtraction::from_content(&content);
        metadata.line_count = extraction.line_count;
        self.index.wordlist_cache().save_extraction(key, &extraction)?;

        self.classifier.classify_words(key, &mut metadata, &extraction.wordlist);
        self.index.metadata_cache().save(&metadata)?;

        writer.add_trigrams_for_document(key, &extraction.trigrams);
        log::debug!(
            "Indexed {} as {} ({} words, {} trigrams)",
            id.relative_path(),
            key,
            extraction.wordlist.len(),
            extraction.trigrams.len()
        );
        Ok(())
    }
}

/// Indexes the class tags of every stored metadata record
pub struct MetadataIndexer<'a> {
    index: &'a Index,
}

impl<'a> MetadataIndexer<'a> {
    pub fn new(index: &'a Index) -> Self {
        Self { index }
    }

    /// Rebuild the metadata index and record the counts in `stats`
    pub fn index_all(&self, stats: &mut IndexStats) -> Result<()> {
        self.index.clear_metadata_postings()?;
        let writer = self.index.metadata_writer()?;

        let keys = self
            .index
            .metadata_cache()
            .all_keys()
            .context("Failed to list stored metadata")?;
        log::info!("Indexing metadata of {} documents", keys.len());

        for key in keys {
            let metadata = match self.index.metadata_cache().load(&key) {
                Ok(Some(metadata)) => metadata,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("Skipping metadata of {}: {}", key, e);
                    continue;
                }
            };

            let trigrams = class_trigrams(&metadata);
            if !trigrams.is_empty() {
                writer.add_trigrams_for_document(&key, &trigrams);
            }
            stats.metadata_documents += 1;
        }

        writer.save().context("Failed to write metadata postings")?;
        stats.metadata_trigrams = writer.trigram_count();
        Ok(())
    }
}

/// Trigrams of all class values, each value taken as one lowercased word
fn class_trigrams(metadata: &DocumentMetadata) -> BTreeSet<Trigram> {
    metadata
        .classes
        .values()
        .flat_map(|value| unique_trigrams_from_word(&value.to_lowercase()))
        .collect()
}

fn progress_bar(len: u64, show_progress: bool) -> Result<ProgressBar> {
    if !show_progress {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new(len);
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{FILETYPE, UNIT_TEST};
    use crate::document_key::DocumentKey;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, TempDir) {
        let crawl = TempDir::new().unwrap();
        fs::create_dir_all(crawl.path().join("src")).unwrap();
        fs::write(
            crawl.path().join("src/KeyStore.java"),
            "public class KeyStore {\n  void createKeyStore() {}\n}\n",
        )
        .unwrap();
        fs::write(
            crawl.path().join("src/KeyStoreTest.java"),
            "import org.junit.Test;\n@Test\nvoid works() { assertEquals(1, 1); }\n",
        )
        .unwrap();
        fs::write(crawl.path().join("notes.txt"), "copyright notice\n").unwrap();
        fs::write(crawl.path().join("image.png"), "not indexed").unwrap();
        (crawl, TempDir::new().unwrap())
    }

    fn key_of(relative_path: &str) -> DocumentKey {
        DocumentId::from_relative_path(relative_path, &Md5KeyStrategy)
            .key()
            .clone()
    }

    #[test]
    fn test_index_writes_all_stores() {
        let (crawl, index_dir) = setup();
        let index = Index::with_config(index_dir.path(), IndexConfig::default());

        let stats = Indexer::new(&index).index(crawl.path(), false).unwrap();
        assert_eq!(stats.indexed_documents, 3);
        assert_eq!(stats.metadata_documents, 3);
        assert!(stats.failed.is_empty());
        assert!(stats.content_trigrams > 0);

        let key = key_of("src/KeyStore.java");
        let content = index.document_cache().load_content(&key).unwrap().unwrap();
        assert!(content.contains("createKeyStore"));

        let wordlist = index.wordlist_cache().load_wordlist(&key).unwrap().unwrap();
        assert!(wordlist.contains(&"createkeystore".to_string()));

        let metadata = index.metadata_cache().load(&key).unwrap().unwrap();
        assert_eq!(metadata.relative_path, "src/KeyStore.java");
        assert_eq!(metadata.filename, "KeyStore.java");
        assert_eq!(metadata.line_count, 3);
        assert_eq!(metadata.class(FILETYPE), Some("java"));

        let reader = index.content_reader();
        assert!(reader.document_ids_for_trigram("tek").contains(&key));

        assert!(index_dir.path().join("config.toml").exists());
        assert!(index.check_format_hash());
    }

    #[test]
    fn test_metadata_pass_indexes_class_values() {
        let (crawl, index_dir) = setup();
        let index = Index::with_config(index_dir.path(), IndexConfig::default());
        Indexer::new(&index).index(crawl.path(), false).unwrap();

        let reader = index.metadata_reader();
        let java = reader.document_ids_for_trigram("jav");
        assert!(java.contains(&key_of("src/KeyStore.java")));
        assert!(java.contains(&key_of("src/KeyStoreTest.java")));
        assert!(!java.contains(&key_of("notes.txt")));

        let test_key = key_of("src/KeyStoreTest.java");
        let metadata = index.metadata_cache().load(&test_key).unwrap().unwrap();
        assert_eq!(metadata.class(UNIT_TEST), Some("true"));
        assert!(reader.document_ids_for_trigram("tru").contains(&test_key));
    }

    #[test]
    fn test_reindex_drops_removed_documents() {
        let (crawl, index_dir) = setup();
        let index = Index::with_config(index_dir.path(), IndexConfig::default());
        Indexer::new(&index).index(crawl.path(), false).unwrap();

        fs::remove_file(crawl.path().join("notes.txt")).unwrap();
        let stats = Indexer::new(&index).index(crawl.path(), false).unwrap();
        assert_eq!(stats.indexed_documents, 2);
        assert_eq!(stats.metadata_documents, 2);

        let reader = index.content_reader();
        assert!(!reader.document_ids_for_trigram("cop").contains(&key_of("notes.txt")));
    }

    #[test]
    fn test_custom_key_strategy() {
        use crate::document_key::Blake3KeyedStrategy;

        let (crawl, index_dir) = setup();
        let index = Index::with_config(index_dir.path(), IndexConfig::default());
        Indexer::new(&index)
            .with_strategy(Box::new(Blake3KeyedStrategy::new(b"secret")))
            .index(crawl.path(), false)
            .unwrap();

        let id = DocumentId::from_relative_path("notes.txt", &Blake3KeyedStrategy::new(b"secret"));
        assert!(index.metadata_cache().load(id.key()).unwrap().is_some());
        assert!(index.metadata_cache().load(&key_of("notes.txt")).unwrap().is_none());
    }

    #[test]
    fn test_index_folder_inside_crawl_root_is_skipped() {
        let crawl = TempDir::new().unwrap();
        fs::write(crawl.path().join("a.txt"), "alpha beta").unwrap();
        let index_root = crawl.path().join("index");
        fs::create_dir_all(&index_root).unwrap();

        let index = Index::with_config(&index_root, IndexConfig::default());
        Indexer::new(&index).index(crawl.path(), false).unwrap();
        let stats = Indexer::new(&index).index(crawl.path(), false).unwrap();
        assert_eq!(stats.indexed_documents, 1);
    }
}
