//! Complaint priority scoring: training pipeline, result labels and the shared service.

pub mod labels;
pub mod pipeline;
pub mod result;
pub mod service;

use std::time::Duration;

use thiserror::Error;

use crate::encoding::EncodingError;
use crate::ml::regressor::ModelError;

pub use labels::{ImpactLevel, PRIORITY_THRESHOLDS, PriorityLevel};
pub use pipeline::{PipelineError, TrainedScorer, TrainingReport, train_from_samples, train_from_source};
pub use result::{ComplaintPayload, FALLBACK_SCORE, PriorityResult, Tag};
pub use service::{PriorityService, ServiceStats};

/// Reasons a prediction falls back to the default result.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PriorityError {
    /// Message of the failed run, shared by every caller that waited on it.
    #[error("Priority model training failed: {0}")]
    Training(String),
    #[error("Priority model still training after {0:?}")]
    NotReady(Duration),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Model(#[from] ModelError),
}
