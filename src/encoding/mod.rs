//! Feature encoding for complaint `{category, description}` pairs.
//!
//! Feature layout (`f32`):
//! - `[0]` category index normalized to `[0, 1]`
//! - `[1]` urgency score (`keyword hits / sqrt(token count)`)
//! - `[2]` length score (`min(token count / 50, 1)`)
//! - `[3..]` max-normalized term frequencies for the first [`MAX_TEXT_FEATURES`] vocabulary slots

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::text::{self, Vocabulary};

mod category;

pub use category::CategoryIndex;

/// Leading non-text features (category, urgency, length).
pub const HEAD_FEATURES: usize = 3;
/// Number of vocabulary slots copied into the feature vector.
pub const MAX_TEXT_FEATURES: usize = 35;
/// Largest feature vector any encoder can produce.
pub const MAX_FEATURE_LEN: usize = HEAD_FEATURES + MAX_TEXT_FEATURES;

const LENGTH_SATURATION_TOKENS: f32 = 50.0;

/// Errors raised when a complaint cannot be turned into model input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncodingError {
    /// A required payload field was empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    /// Encoded features contained NaN or infinity.
    #[error("Invalid feature encoding (non-finite value)")]
    NonFinite,
}

/// Vocabulary and category index fitted together on one training corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Encoders {
    pub category: CategoryIndex,
    pub vocabulary: Vocabulary,
}

impl Encoders {
    /// Fit encoders on `(category, description)` pairs.
    pub fn fit<'a, I>(samples: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)> + Clone,
    {
        let category = CategoryIndex::build(samples.clone().into_iter().map(|(c, _)| c));
        let vocabulary = Vocabulary::build(samples.into_iter().map(|(_, d)| d));
        Self {
            category,
            vocabulary,
        }
    }

    /// Length of every vector these encoders produce.
    pub fn feature_len(&self) -> usize {
        HEAD_FEATURES + self.vocabulary.len().min(MAX_TEXT_FEATURES)
    }

    /// Encode one complaint.
    pub fn encode(&self, category: &str, description: &str) -> FeatureVector {
        let category_feature = self.category.normalized(category);
        let tokens = text::tokenize(description);
        let text = text_features(&tokens, &self.vocabulary);

        let mut values = Vec::with_capacity(self.feature_len());
        values.push(category_feature);
        values.push(text.urgency);
        values.push(text.length);
        values.extend(text.term_frequencies.iter().take(MAX_TEXT_FEATURES));
        FeatureVector(values)
    }
}

/// Encoded model input for one complaint.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reject vectors carrying NaN or infinite values.
    pub fn ensure_finite(self) -> Result<Self, EncodingError> {
        if self.0.iter().all(|value| value.is_finite()) {
            Ok(self)
        } else {
            Err(EncodingError::NonFinite)
        }
    }
}

struct TextFeatures {
    term_frequencies: Vec<f32>,
    urgency: f32,
    length: f32,
}

fn text_features(tokens: &[String], vocabulary: &Vocabulary) -> TextFeatures {
    let mut term_frequencies = vec![0.0f32; vocabulary.len()];
    for token in tokens {
        if let Some(idx) = vocabulary.index_of(token) {
            term_frequencies[idx] += 1.0;
        }
    }
    // Max-normalization: the fitted weights expect each vector scaled by its own peak.
    let peak = term_frequencies.iter().copied().fold(1.0f32, f32::max);
    for value in &mut term_frequencies {
        *value /= peak;
    }

    let token_count = tokens.len();
    let hits = tokens
        .iter()
        .filter(|token| text::is_urgency_keyword(token))
        .count();
    let urgency = if token_count > 0 {
        hits as f32 / (token_count as f32).sqrt()
    } else {
        0.0
    };
    let length = (token_count as f32 / LENGTH_SATURATION_TOKENS).min(1.0);

    TextFeatures {
        term_frequencies,
        urgency,
        length,
    }
}
