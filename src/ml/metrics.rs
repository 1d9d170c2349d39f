//! Evaluation metrics for the priority regressor.

use ndarray::{ArrayView1, Zip};
use serde::{Deserialize, Serialize};

use crate::priority::PriorityLevel;

/// Mean squared error between predictions and targets (0 for empty input).
pub fn mean_squared_error(predicted: ArrayView1<f32>, target: ArrayView1<f32>) -> f32 {
    mean_of(predicted, target, |diff| diff * diff)
}

/// Mean absolute error between predictions and targets (0 for empty input).
pub fn mean_absolute_error(predicted: ArrayView1<f32>, target: ArrayView1<f32>) -> f32 {
    mean_of(predicted, target, f32::abs)
}

fn mean_of(predicted: ArrayView1<f32>, target: ArrayView1<f32>, f: impl Fn(f32) -> f32) -> f32 {
    if predicted.is_empty() || predicted.len() != target.len() {
        return 0.0;
    }
    let mut total = 0.0f32;
    Zip::from(predicted)
        .and(target)
        .for_each(|&p, &t| total += f(p - t));
    total / predicted.len() as f32
}

/// Serialized regression metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mse: f32,
    pub mae: f32,
    /// Fraction of rows whose predicted priority band matches the target band.
    pub band_accuracy: f32,
    pub rows: usize,
}

const BANDS: usize = PriorityLevel::ALL.len();

/// Target band (rows) against predicted band (columns).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandConfusion {
    counts: [[u32; BANDS]; BANDS],
}

impl BandConfusion {
    /// Band each predicted score and its target; pairs beyond the shorter input are ignored.
    pub fn from_scores(predicted: ArrayView1<f32>, target: ArrayView1<f32>) -> Self {
        let mut confusion = Self::default();
        for (&p, &t) in predicted.iter().zip(target.iter()) {
            confusion.add(PriorityLevel::from_score(t), PriorityLevel::from_score(p));
        }
        confusion
    }

    pub fn add(&mut self, truth: PriorityLevel, predicted: PriorityLevel) {
        let cell = &mut self.counts[truth as usize][predicted as usize];
        *cell = cell.saturating_add(1);
    }

    pub fn get(&self, truth: PriorityLevel, predicted: PriorityLevel) -> u32 {
        self.counts[truth as usize][predicted as usize]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().map(|&v| u64::from(v)).sum()
    }

    /// Fraction of rows landing in their target band (0 when empty).
    pub fn accuracy(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: u64 = PriorityLevel::ALL
            .iter()
            .map(|&level| u64::from(self.get(level, level)))
            .sum();
        correct as f32 / total as f32
    }

    /// Precision and recall for every band, lowest first.
    pub fn per_band(&self) -> [BandStats; BANDS] {
        PriorityLevel::ALL.map(|level| {
            let tp = self.get(level, level) as f32;
            let support: u32 = PriorityLevel::ALL.iter().map(|&p| self.get(level, p)).sum();
            let predicted: u32 = PriorityLevel::ALL.iter().map(|&t| self.get(t, level)).sum();
            BandStats {
                level,
                precision: ratio(tp, predicted as f32),
                recall: ratio(tp, support as f32),
                support,
            }
        })
    }
}

fn ratio(part: f32, whole: f32) -> f32 {
    if whole == 0.0 { 0.0 } else { part / whole }
}

/// Precision/recall statistics for one priority band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandStats {
    pub level: PriorityLevel,
    /// `TP / (TP + FP)`.
    pub precision: f32,
    /// `TP / (TP + FN)`.
    pub recall: f32,
    /// Rows whose target falls in this band.
    pub support: u32,
}
