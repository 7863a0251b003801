//! CLI argument parsing and command handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::index::Index;
use crate::indexer::Indexer;
use crate::models::SearchResultCandidate;
use crate::output;
use crate::query::parse_query;
use crate::search::SearchEngine;
use crate::word_order::TrigramPenaltyStrategy;

/// triscan: offline trigram search over source trees
#[derive(Parser, Debug)]
#[command(
    name = "triscan",
    version,
    about = "Offline trigram search engine for source code",
    long_about = "triscan crawls a source tree once, stores a trigram index of file \
                  contents and document tags on disk, and answers substring and \
                  word queries from that index without touching the source tree again."
)]
pub struct Cli {
    /// Enable verbose logging (can be repeated for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rebuild the index of a source tree
    ///
    /// Runs the content pass followed by the metadata pass. Postings of an
    /// earlier run are removed first.
    Index {
        /// Directory to crawl
        #[arg(value_name = "CRAWL")]
        crawl: PathBuf,

        /// Directory holding the index
        #[arg(value_name = "INDEX")]
        index: PathBuf,

        /// Suppress all output (no progress bar, no summary)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Find documents with a word containing TERM
    ///
    /// Example: triscan search ./idx reatekeystor
    Search {
        /// Directory holding the index
        #[arg(value_name = "INDEX")]
        index: PathBuf,

        /// Search term (case-insensitive)
        term: String,

        /// Output format as JSON
        #[arg(long)]
        json: bool,

        /// Show trigram statistics and the word-order scores
        #[arg(long)]
        explain: bool,
    },

    /// Evaluate a query string
    ///
    /// Syntax:
    ///   word            document must contain the word
    ///   -word           document must not contain the word
    ///   "phrase"        exact text
    ///   key:value       document tag, e.g. filetype:java or unit-test:true
    ///
    /// Whitespace-separated terms are combined with AND.
    Query {
        /// Directory holding the index
        #[arg(value_name = "INDEX")]
        index: PathBuf,

        /// Query string
        query: String,

        /// Output format as JSON
        #[arg(long)]
        json: bool,

        /// Show trigram statistics and the word-order scores
        #[arg(long)]
        explain: bool,
    },

    /// Compare declared and stored postings sizes of trigrams
    Check {
        /// Directory holding the index
        #[arg(value_name = "INDEX")]
        index: PathBuf,

        /// Trigrams to check
        #[arg(required = true)]
        trigrams: Vec<String>,

        /// Check the metadata index instead of the content index
        #[arg(long)]
        metadata: bool,
    },
}

impl Cli {
    /// Execute the parsed command
    pub fn execute(self) -> Result<()> {
        let log_level = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
            .init();

        match self.command {
            Command::Index { crawl, index, quiet } => handle_index(&crawl, &index, quiet),
            Command::Search {
                index,
                term,
                json,
                explain,
            } => handle_search(&index, &term, json, explain),
            Command::Query {
                index,
                query,
                json,
                explain,
            } => handle_query(&index, &query, json, explain),
            Command::Check {
                index,
                trigrams,
                metadata,
            } => handle_check(&index, &trigrams, metadata),
        }
    }
}

fn ensure_directory(path: &Path, role: &str) -> Result<()> {
    anyhow::ensure!(
        path.is_dir(),
        "{} folder {} does not exist or is not a directory",
        role,
        path.display()
    );
    Ok(())
}

fn open_index(path: &Path) -> Result<Index> {
    ensure_directory(path, "Index")?;
    let index = Index::open(path)
        .with_context(|| format!("Failed to open index at {}", path.display()))?;
    if !index.check_format_hash() {
        output::warn("The index was written by a different version of triscan; rebuild it with 'triscan index'.");
    }
    Ok(index)
}

fn handle_index(crawl: &Path, index_path: &Path, quiet: bool) -> Result<()> {
    ensure_directory(crawl, "Crawl")?;
    ensure_directory(index_path, "Index")?;

    let index = Index::open(index_path)
        .with_context(|| format!("Failed to open index at {}", index_path.display()))?;
    let start = Instant::now();
    let stats = Indexer::new(&index).index(crawl, !quiet)?;

    if !quiet {
        println!("Indexing complete!");
        println!("  Documents indexed:  {}", stats.indexed_documents);
        println!("  Content trigrams:   {}", stats.content_trigrams);
        println!("  Tagged documents:   {}", stats.metadata_documents);
        println!("  Metadata trigrams:  {}", stats.metadata_trigrams);
        println!("  Duration:           {:.2?}", start.elapsed());

        if !stats.failed.is_empty() {
            output::warn(&format!(
                "{} files could not be indexed (run with -v for details):",
                stats.failed.len()
            ));
            for path in &stats.failed {
                eprintln!("  {}", path.display());
            }
        }
    }
    Ok(())
}

fn handle_search(index_path: &Path, term: &str, json: bool, explain: bool) -> Result<()> {
    let index = open_index(index_path)?;
    let mut engine = SearchEngine::new(&index);

    let start = Instant::now();
    let results = engine.search(term)?;
    log::info!("Search for '{}' took {:.2?}", term, start.elapsed());

    print_results(&results, json)?;
    if explain {
        let words = vec![term.to_lowercase()];
        output::print_explain("content", engine.content_execution_details());
        let scores = TrigramPenaltyStrategy.order_words(&words, &engine.content_execution_details().usage);
        output::print_word_scores(&scores);
    }
    Ok(())
}

fn handle_query(index_path: &Path, query: &str, json: bool, explain: bool) -> Result<()> {
    let index = open_index(index_path)?;
    let ast = parse_query(query);
    log::debug!("Parsed query: {}", ast);

    let mut engine = SearchEngine::new(&index);
    let start = Instant::now();
    let results = match engine.search_query(&ast) {
        Ok(results) => results,
        Err(e) => {
            if e.is_query_error() {
                output::warn("The query cannot be narrowed by trigrams (OR is not supported); split it into separate queries.");
            }
            return Err(e).with_context(|| format!("Failed to evaluate query '{}'", query));
        }
    };
    log::info!("Query '{}' took {:.2?}", query, start.elapsed());

    print_results(&results, json)?;
    if explain {
        output::print_explain("content", engine.content_execution_details());
        output::print_explain("metadata", engine.metadata_execution_details());
        let scores = TrigramPenaltyStrategy
            .order_words(&ast.required_words(), &engine.content_execution_details().usage);
        output::print_word_scores(&scores);
    }
    Ok(())
}

fn handle_check(index_path: &Path, trigrams: &[String], metadata: bool) -> Result<()> {
    let index = open_index(index_path)?;
    let reader = if metadata {
        index.metadata_reader()
    } else {
        index.content_reader()
    };

    let mut inconsistent = 0usize;
    for trigram in trigrams {
        let report = reader.check_consistency(trigram);
        if !report.is_consistent() {
            inconsistent += 1;
        }
        output::print_consistency(&report);
    }

    anyhow::ensure!(
        inconsistent == 0,
        "{} of {} trigrams are inconsistent",
        inconsistent,
        trigrams.len()
    );
    Ok(())
}

fn print_results(results: &[SearchResultCandidate], json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(results).context("Failed to serialize results")?
        );
    } else {
        output::print_results(results);
    }
    Ok(())
}
