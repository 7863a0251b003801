//! Index configuration (`config.toml` in the index root)
//!
//! Every field has a default, so a missing file or a file that only
//! overrides a few keys is fine. None of these settings change what a
//! correct search returns; they tune shard sizes, I/O ordering and
//! parallelism.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name of the configuration inside the index root
pub const CONFIG_TOML: &str = "config.toml";

/// Number of document keys per generation shard
pub const DEFAULT_FLUSH_THRESHOLD: usize = 3072;

/// Upper bound of generation shards read for one trigram
pub const DEFAULT_MAX_SHARD_GENERATIONS: u32 = 4096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Postings per generation shard before a flush
    pub flush_threshold: usize,
    /// Early-abort ratio for content trigram intersection
    pub content_abort_ratio: u64,
    /// Early-abort ratio for metadata trigram intersection
    pub metadata_abort_ratio: u64,
    /// Defensive bound on shard generations read per trigram
    pub max_shard_generations: u32,
    /// Number of threads for per-file work (0 = auto, 80% of available cores)
    pub parallel_threads: usize,
    /// Number of threads writing shard files
    pub flush_workers: usize,
    /// Maximum file size to index (bytes)
    pub max_file_size: u64,
    /// Follow symbolic links while crawling
    pub follow_symlinks: bool,
    /// Serve repeated queries from the query cache
    pub use_query_cache: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            content_abort_ratio: 48,
            metadata_abort_ratio: 128,
            max_shard_generations: DEFAULT_MAX_SHARD_GENERATIONS,
            parallel_threads: 0,
            flush_workers: 2,
            max_file_size: 10 * 1024 * 1024, // 10 MB
            follow_symlinks: false,
            use_query_cache: true,
        }
    }
}

impl IndexConfig {
    /// Load `config.toml` from the index root, falling back to defaults
    /// when the file does not exist
    pub fn load_or_default(index_root: impl AsRef<Path>) -> Result<Self> {
        let path = index_root.as_ref().join(CONFIG_TOML);
        if !path.exists() {
            log::debug!("No {} in {:?}, using defaults", CONFIG_TOML, index_root.as_ref());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: IndexConfig = toml::from_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;

        log::info!("Loaded index configuration from {}", path.display());
        Ok(config)
    }

    /// Write a default `config.toml` unless one exists already
    pub fn init_config_toml(index_root: impl AsRef<Path>) -> Result<()> {
        let path = index_root.as_ref().join(CONFIG_TOML);
        if path.exists() {
            return Ok(());
        }

        let default_config = r#"# Postings per generation shard
flush_threshold = 3072
# Stop intersecting once a trigram is this many times larger than the result
content_abort_ratio = 48
metadata_abort_ratio = 128
max_shard_generations = 4096
parallel_threads = 0  # 0 = auto (80% of CPU cores)
flush_workers = 2
max_file_size = 10485760  # 10 MB
follow_symlinks = false
use_query_cache = true
"#;
        std::fs::write(&path, default_config)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        log::debug!("Created default {}", path.display());
        Ok(())
    }

    /// Resolve the number of worker threads for per-file processing
    pub fn effective_threads(&self) -> usize {
        if self.parallel_threads == 0 {
            // Use 80% of available cores (minimum 1)
            let available_cores = num_cpus::get();
            ((available_cores as f64 * 0.8).ceil() as usize).max(1)
        } else {
            self.parallel_threads
        }
    }

    fn validate(&self) -> Result<()> {
        if self.flush_threshold == 0 {
            anyhow::bail!("flush_threshold must be greater than zero");
        }
        if self.flush_workers == 0 {
            anyhow::bail!("flush_workers must be greater than zero");
        }
        Ok(())
    }
}
