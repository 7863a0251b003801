//! User-facing terminal output
//!
//! Messages for people go to stderr in color; results go to stdout. Logging
//! (timestamps, levels, module names) stays out of this module.

use owo_colors::OwoColorize;

use crate::models::{SearchExecutionDetails, SearchResultCandidate, TrigramUsageState};
use crate::postings::ConsistencyReport;
use crate::word_order::WordScore;

/// Display a warning message to the user in yellow with padding
pub fn warn(message: &str) {
    eprintln!("\n{}\n", message.yellow());
}

/// Display an error message to the user in red with padding
///
/// # Example
/// ```ignore
/// output::error("Index folder ./idx does not exist or is not a directory");
/// ```
pub fn error(message: &str) {
    eprintln!("\n{}\n", message.red());
}

pub fn info(message: &str) {
    eprintln!("\n{}\n", message);
}

/// Print one block per result: path, tags, preview lines
pub fn print_results(results: &[SearchResultCandidate]) {
    if results.is_empty() {
        info("No matches.");
        return;
    }

    for result in results {
        let path = result
            .relative_path()
            .map(str::to_string)
            .unwrap_or_else(|| result.document_key.to_string());
        println!("{}", path.bright_cyan().bold());

        if let Some(metadata) = &result.metadata {
            if !metadata.classes.is_empty() {
                let tags: Vec<String> = metadata
                    .classes
                    .iter()
                    .map(|(name, value)| format!("{}:{}", name, value))
                    .collect();
                println!("  {}", tags.join(" ").dimmed());
            }
        }

        for (line, text) in &result.preview {
            println!("  {:>5} {} {}", line.to_string().yellow(), "│".dimmed(), text);
        }
    }
    info(&format!("{} documents", results.len()));
}

/// Print the trigram statistics of the last search over one index
pub fn print_explain(label: &str, details: &SearchExecutionDetails) {
    eprintln!("{} {}", "Trigram statistics:".bold(), label);
    if details.occurrences.is_empty() {
        eprintln!("  no lookups (empty query or cached result)");
        return;
    }

    for usage in &details.usage {
        let state = match usage.state {
            TrigramUsageState::Success => usage.state.to_string().green().to_string(),
            TrigramUsageState::Failed => usage.state.to_string().red().to_string(),
            TrigramUsageState::Unknown => usage.state.to_string().dimmed().to_string(),
        };
        eprintln!("  {:<8} {:>8}  {}", usage.trigram, usage.occurrence_count, state);
    }
    if details.was_aborted_early() {
        eprintln!(
            "  aborted early, skipped: {}",
            details.skipped_trigrams.join(", ").dimmed()
        );
    }
}

pub fn print_word_scores(scores: &[WordScore]) {
    if scores.is_empty() {
        return;
    }
    eprintln!("{}", "Word order:".bold());
    for score in scores {
        eprintln!("  {:>4}  {}", score.score, score.word);
    }
}

pub fn print_consistency(report: &ConsistencyReport) {
    let declared = report
        .declared
        .map(|count| count.to_string())
        .unwrap_or_else(|| "-".to_string());
    let line = format!(
        "{:<8} declared {:>8}  stored {:>8}  shards {}",
        report.trigram, declared, report.actual, report.shards
    );
    if report.is_consistent() {
        println!("{} {}", "ok".green(), line);
    } else {
        println!("{} {}", "MISMATCH".red().bold(), line);
    }
}
