//! Labeled complaint samples and the sources that provide them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod csv;

pub use csv::{REQUIRED_COLUMNS, parse_samples};

/// One supervised example: complaint text plus its target priority in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub category: String,
    pub description: String,
    pub priority: f32,
}

impl TrainingSample {
    pub fn new(category: impl Into<String>, description: impl Into<String>, priority: f32) -> Self {
        Self {
            category: category.into(),
            description: description.into(),
            priority,
        }
    }
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read dataset {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Dataset {path} is empty")]
    Empty { path: PathBuf },
    #[error("Dataset header is missing the `{0}` column")]
    MissingColumn(&'static str),
    #[error("Dataset contains no usable samples")]
    NoSamples,
}

/// Provider of training rows for the training pipeline.
pub trait SampleSource: Send + Sync {
    /// Load every usable sample; an empty result is an error.
    fn load(&self) -> Result<Vec<TrainingSample>, DatasetError>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

/// Copy of `assets/dataset/test_data.csv` compiled into the binary.
pub const BUNDLED_TEST_DATA: &str = include_str!("../../assets/dataset/test_data.csv");

/// Comma-separated dataset on disk with a `category,impact,description,priority` style header.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SampleSource for CsvFileSource {
    fn load(&self) -> Result<Vec<TrainingSample>, DatasetError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| DatasetError::Read {
            path: self.path.clone(),
            source,
        })?;
        if text.trim().is_empty() {
            return Err(DatasetError::Empty {
                path: self.path.clone(),
            });
        }
        let samples = parse_samples(&text)?;
        if samples.is_empty() {
            return Err(DatasetError::NoSamples);
        }
        Ok(samples)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// The synthetic dataset shipped inside the binary, used when no file is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledTestData;

impl SampleSource for BundledTestData {
    fn load(&self) -> Result<Vec<TrainingSample>, DatasetError> {
        let samples = parse_samples(BUNDLED_TEST_DATA)?;
        if samples.is_empty() {
            return Err(DatasetError::NoSamples);
        }
        Ok(samples)
    }

    fn describe(&self) -> String {
        "bundled test dataset".to_string()
    }
}

impl SampleSource for Vec<TrainingSample> {
    fn load(&self) -> Result<Vec<TrainingSample>, DatasetError> {
        if self.is_empty() {
            return Err(DatasetError::NoSamples);
        }
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory samples", self.len())
    }
}

/// Count samples per priority band using the level thresholds.
pub fn priority_distribution(samples: &[TrainingSample]) -> [usize; 4] {
    let mut counts = [0usize; 4];
    for sample in samples {
        let band = crate::priority::PriorityLevel::from_score(sample.priority) as usize;
        counts[band] += 1;
    }
    counts
}
