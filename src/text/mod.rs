//! Text normalization shared by vocabulary building and feature encoding.
//!
//! Training and inference must tokenize identically, otherwise the encoded
//! term slots drift from what the model was fitted on. Everything that turns a
//! description into tokens goes through [`tokenize`].

use std::sync::LazyLock;

use regex::Regex;

mod urgency;
mod vocabulary;

pub use urgency::{URGENCY_KEYWORDS, is_urgency_keyword};
pub use vocabulary::{MAX_VOCABULARY_SIZE, Vocabulary};

/// Tokens must be strictly longer than this many characters.
pub const MIN_TOKEN_CHARS: usize = 2;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s]").expect("static token regex"));

/// Lower-case, strip punctuation, split on whitespace and keep tokens longer than two chars.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    stripped
        .split_whitespace()
        .filter(|token| token.chars().count() > MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_short_tokens() {
        let tokens = tokenize("Burst water-main, flooding the street!! at 5th Ave.");
        assert_eq!(
            tokens,
            vec!["burst", "watermain", "flooding", "the", "street", "5th", "ave"]
        );
    }

    #[test]
    fn empty_and_whitespace_inputs_yield_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t\n ").is_empty());
        assert!(tokenize("a an to ?!").is_empty());
    }

    #[test]
    fn lowercases_unicode_letters() {
        assert_eq!(tokenize("ÉCOLE Café"), vec!["école", "café"]);
    }
}
