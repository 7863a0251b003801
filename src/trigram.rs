//! Word and trigram extraction
//!
//! A trigram is 3 consecutive Unicode code points of a lowercased word.
//! Words are produced by splitting each line on a fixed delimiter class and
//! dropping everything shorter than 3 code points, so trigrams never span
//! a delimiter.
//!
//! # Algorithm
//!
//! 1. Lowercase each line and split it on ` / + - * \t \n \r . : ; , ( ) { } [ ]`
//! 2. Trim tokens, drop empty ones and ones shorter than 3 code points
//! 3. Deduplicate into the unique wordlist (first-seen order)
//! 4. Slide a 3-code-point window over each word to get its trigrams
//!
//! The trigram term frequency (ttf) map adds, for each distinct word, the
//! number of times the word occurs to each of its *unique* trigrams.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// A trigram is kept as its literal text
pub type Trigram = String;

/// Minimum word length in code points
pub const MIN_WORD_LENGTH: usize = 3;

fn is_delimiter(c: char) -> bool {
    matches!(
        c,
        ' ' | '/'
            | '+'
            | '-'
            | '*'
            | '\t'
            | '\n'
            | '\r'
            | '.'
            | ':'
            | ';'
            | ','
            | '('
            | ')'
            | '{'
            | '}'
            | '['
            | ']'
    )
}

/// Split one line into lowercased, non-empty tokens (any length)
pub fn split_words(line: &str) -> Vec<String> {
    line.to_lowercase()
        .split(is_delimiter)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_long_enough(word: &str) -> bool {
    word.chars().count() >= MIN_WORD_LENGTH
}

/// All words of at least 3 code points, in text order, with repetitions
fn words_of(content: &str) -> impl Iterator<Item = String> + '_ {
    content
        .lines()
        .flat_map(split_words)
        .filter(|word| is_long_enough(word))
}

/// Unique wordlist of a text, first-seen order
pub fn unique_wordlist(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    words_of(content)
        .filter(|word| seen.insert(word.clone()))
        .collect()
}

/// Every 3-code-point window of `word`, in order, with repetitions
pub fn trigram_windows(word: &str) -> Vec<Trigram> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .windows(3)
        .map(|window| window.iter().collect())
        .collect()
}

/// Unique trigrams of a single word (the word is used as given)
pub fn unique_trigrams_from_word(word: &str) -> BTreeSet<Trigram> {
    trigram_windows(word).into_iter().collect()
}

/// Union of the unique trigrams of every word in `words`
pub fn unique_trigrams_from_wordlist<S: AsRef<str>>(words: &[S]) -> BTreeSet<Trigram> {
    words
        .iter()
        .flat_map(|word| trigram_windows(word.as_ref()))
        .collect()
}

/// Trigram term frequency map of a text
pub fn trigram_term_frequency(content: &str) -> BTreeMap<Trigram, u64> {
    let mut word_counts: HashMap<String, u64> = HashMap::new();
    for word in words_of(content) {
        *word_counts.entry(word).or_insert(0) += 1;
    }

    let mut ttf = BTreeMap::new();
    for (word, count) in word_counts {
        for trigram in unique_trigrams_from_word(&word) {
            *ttf.entry(trigram).or_insert(0) += count;
        }
    }
    ttf
}

/// Everything the indexer derives from a document's text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordExtraction {
    pub wordlist: Vec<String>,
    pub trigrams: BTreeSet<Trigram>,
    pub ttf: BTreeMap<Trigram, u64>,
    pub line_count: usize,
}

impl WordExtraction {
    pub fn from_content(content: &str) -> Self {
        let wordlist = unique_wordlist(content);
        let trigrams = unique_trigrams_from_wordlist(&wordlist);
        let ttf = trigram_term_frequency(content);

        Self {
            wordlist,
            trigrams,
            ttf,
            line_count: content.lines().count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.wordlist.is_empty()
    }
}
