use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::tokenize;

/// Upper bound on the number of terms kept in a vocabulary.
pub const MAX_VOCABULARY_SIZE: usize = 60;

/// Most frequent descriptive terms from a training corpus.
///
/// Indices follow descending corpus frequency; equal counts keep the order in
/// which the terms were first seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: Vec<String>,
    word_to_index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build a vocabulary from training descriptions, keeping the top [`MAX_VOCABULARY_SIZE`] terms.
    pub fn build<'a, I>(descriptions: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self::build_with_limit(descriptions, MAX_VOCABULARY_SIZE)
    }

    pub(crate) fn build_with_limit<'a, I>(descriptions: I, limit: usize) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        // term -> (count, first seen position)
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        let mut seen = 0usize;
        for description in descriptions {
            for token in tokenize(description) {
                let entry = counts.entry(token).or_insert_with(|| {
                    seen += 1;
                    (0, seen)
                });
                entry.0 += 1;
            }
        }

        let mut ranked: Vec<(String, usize, usize)> = counts
            .into_iter()
            .map(|(term, (count, first))| (term, count, first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        ranked.truncate(limit);

        let terms: Vec<String> = ranked.into_iter().map(|(term, _, _)| term).collect();
        let word_to_index = terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();
        Self {
            terms,
            word_to_index,
        }
    }

    /// Slot index for a normalized token, if it is in the vocabulary.
    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.word_to_index.get(token).copied()
    }

    /// Number of terms in the vocabulary.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms in index order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_frequency_then_first_encounter() {
        let vocab = Vocabulary::build([
            "pothole near school",
            "garbage near market",
            "pothole again near bridge",
        ]);
        assert_eq!(vocab.index_of("near"), Some(0));
        assert_eq!(vocab.index_of("pothole"), Some(1));
        // Single occurrences keep first-encounter order.
        assert_eq!(vocab.index_of("school"), Some(2));
        assert_eq!(vocab.index_of("garbage"), Some(3));
        assert_eq!(vocab.index_of("market"), Some(4));
        assert_eq!(vocab.index_of("again"), Some(5));
        assert_eq!(vocab.index_of("bridge"), Some(6));
        assert_eq!(vocab.len(), 7);
    }

    #[test]
    fn caps_size_at_sixty_terms() {
        let descriptions: Vec<String> = (0..200).map(|i| format!("term{i:03} filler")).collect();
        let vocab = Vocabulary::build(descriptions.iter().map(String::as_str));
        assert_eq!(vocab.len(), MAX_VOCABULARY_SIZE);
        assert_eq!(vocab.index_of("filler"), Some(0));
        assert_eq!(vocab.index_of("term000"), Some(1));
        assert_eq!(vocab.index_of("term100"), None);
    }

    #[test]
    fn empty_corpus_builds_empty_vocabulary() {
        let vocab = Vocabulary::build(["", "  ", "a b"]);
        assert!(vocab.is_empty());
        assert_eq!(vocab.index_of("anything"), None);
    }
}
