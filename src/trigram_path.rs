//! Filesystem-safe paths for trigrams
//!
//! Each UTF-16 code unit of the trigram becomes a token: ASCII units are two
//! lowercase hex digits (`a` -> `61`), every other unit is `u` followed by four
//! hex digits (`あ` -> `u3042`). Code points above U+FFFF therefore become two
//! `u` tokens (their surrogate pair). The first two tokens are nested
//! directories and all tokens joined with `_` form the file name:
//!
//! ```text
//! "abc"    -> 61/62/61_62_63<suffix>
//! "喫茶店" -> u55ab/u8336/u55ab_u8336_u5e97<suffix>
//! ```
//!
//! Tokens are either exactly 2 hex digits or exactly 5 characters starting
//! with `u`, and are `_`-separated, so distinct trigrams never share a name.

use std::path::{Path, PathBuf};

/// Encode a trigram into path tokens
pub fn encode_tokens(trigram: &str) -> Vec<String> {
    trigram
        .encode_utf16()
        .map(|unit| {
            if unit <= 0x7f {
                format!("{:02x}", unit)
            } else {
                format!("u{:04x}", unit)
            }
        })
        .collect()
}

/// Path of a trigram's files below `base`, without any suffix
pub fn trigram_stem(base: &Path, trigram: &str) -> PathBuf {
    let tokens = encode_tokens(trigram);

    let mut path = base.to_path_buf();
    for dir in tokens.iter().take(2) {
        path.push(dir);
    }
    path.push(tokens.join("_"));
    path
}

/// Path of a trigram's file below `base` ending in `suffix`
pub fn path_for_trigram(base: &Path, trigram: &str, suffix: &str) -> PathBuf {
    let mut path = trigram_stem(base, trigram).into_os_string();
    path.push(suffix);
    PathBuf::from(path)
}
