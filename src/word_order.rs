//! Reorder query words by how useful their trigrams were in a previous search
//!
//! Each word starts with a score of 1. Trigrams that shrank the result
//! ("success") raise it, trigrams that did not ("failed") lower it, and
//! trigrams the search never looked at count as unused. Words are then
//! sorted by descending score; equal scores keep their input order.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::{TrigramUsage, TrigramUsageState};
use crate::trigram::unique_trigrams_from_word;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordScore {
    pub word: String,
    pub score: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrigramPenaltyStrategy;

impl TrigramPenaltyStrategy {
    /// Score `words` against `usage` and return them best first
    pub fn order_words<S: AsRef<str>>(&self, words: &[S], usage: &[TrigramUsage]) -> Vec<WordScore> {
        let usage_map: HashMap<&str, TrigramUsageState> = usage
            .iter()
            .map(|u| (u.trigram.as_str(), u.state))
            .collect();

        let mut scores: Vec<WordScore> = words
            .iter()
            .map(|word| WordScore {
                word: word.as_ref().to_string(),
                score: score_word(word.as_ref(), &usage_map),
            })
            .collect();

        // sort_by is stable
        scores.sort_by(|a, b| b.score.cmp(&a.score));
        scores
    }
}

fn score_word(word: &str, usage: &HashMap<&str, TrigramUsageState>) -> i64 {
    let mut unused = 0i64;
    let mut success = 0i64;
    let mut failure = 0i64;
    for trigram in unique_trigrams_from_word(word) {
        match usage.get(trigram.as_str()) {
            None => unused += 1,
            Some(TrigramUsageState::Success) => success += 1,
            Some(TrigramUsageState::Failed) => failure += 1,
            Some(TrigramUsageState::Unknown) => {}
        }
    }

    let mut score = 1i64;
    if success + failure == 0 {
        return score - unused;
    }

    score += success - failure;
    if unused == 0 {
        score += if success >= failure { 2 } else { -1 };
    } else if failure == 0 {
        score += (unused + 1) / 2;
    } else if success >= failure {
        score += 2;
    } else {
        score -= (unused + 1) / 2;
    }
    score
}
