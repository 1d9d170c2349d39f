//! Priority scoring for municipal complaints.
/// Application directory resolution.
pub mod app_dirs;
/// TOML settings.
pub mod config;
/// Training samples and dataset sources.
pub mod dataset;
/// Feature encoding of complaints.
pub mod encoding;
/// Logging setup shared by the binaries.
pub mod logging;
/// Regression model, training and metrics.
pub mod ml;
/// Scoring pipeline, labels and the prediction service.
pub mod priority;
/// Tokenization, vocabulary and urgency keywords.
pub mod text;

pub use priority::{ComplaintPayload, PriorityResult, PriorityService};
