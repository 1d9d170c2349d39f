//! Training pipeline: samples -> encoders -> feature matrix -> fitted regressor.

use std::time::Instant;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::PriorityError;
use super::result::ComplaintPayload;
use crate::dataset::{DatasetError, SampleSource, TrainingSample, priority_distribution};
use crate::encoding::{EncodingError, Encoders};
use crate::ml::metrics::{
    BandConfusion, RegressionMetrics, mean_absolute_error, mean_squared_error,
};
use crate::ml::regressor::{
    EpochMetrics, PriorityModel, TrainOptions, TrainingError, train_regressor,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Training(#[from] TrainingError),
}

/// Encoders and the model fitted against them; always published together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedScorer {
    pub encoders: Encoders,
    pub model: PriorityModel,
}

impl TrainedScorer {
    /// Validate the payload, encode it and run the model.
    pub fn score(&self, payload: &ComplaintPayload) -> Result<f32, PriorityError> {
        if payload.category.trim().is_empty() {
            return Err(EncodingError::MissingField("category").into());
        }
        if payload.description.trim().is_empty() {
            return Err(EncodingError::MissingField("description").into());
        }
        let features = self
            .encoders
            .encode(&payload.category, &payload.description)
            .ensure_finite()?;
        Ok(self.model.predict(features.as_slice())?)
    }
}

/// Diagnostics from one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub samples: usize,
    pub feature_len: usize,
    pub vocabulary_size: usize,
    pub categories: usize,
    /// Sample counts per band: low, medium, high, critical.
    pub distribution: [usize; 4],
    /// Rows fitted on; with no holdout these are also the validation rows.
    pub train_rows: usize,
    pub validation_rows: usize,
    pub holdout: bool,
    pub epochs_run: usize,
    pub stopped_early: bool,
    pub best_val_loss: f32,
    pub final_epoch: Option<EpochMetrics>,
    pub validation: RegressionMetrics,
    pub elapsed_ms: u64,
}

/// Load samples from `source` and train a scorer.
pub fn train_from_source(
    source: &dyn SampleSource,
    options: &TrainOptions,
) -> Result<(TrainedScorer, TrainingReport), PipelineError> {
    let samples = source.load()?;
    info!(
        "Training priority model on {} complaint samples from {}",
        samples.len(),
        source.describe()
    );
    train_from_samples(&samples, options)
}

/// Fit encoders and the regressor on in-memory samples.
pub fn train_from_samples(
    samples: &[TrainingSample],
    options: &TrainOptions,
) -> Result<(TrainedScorer, TrainingReport), PipelineError> {
    if samples.is_empty() {
        return Err(DatasetError::NoSamples.into());
    }
    let started = Instant::now();
    let encoders = Encoders::fit(
        samples
            .iter()
            .map(|sample| (sample.category.as_str(), sample.description.as_str())),
    );
    let feature_len = encoders.feature_len();
    info!("Feature vector size: {feature_len} (includes text context features)");

    let mut features = Array2::<f32>::zeros((samples.len(), feature_len));
    for (mut row, sample) in features.rows_mut().into_iter().zip(samples) {
        let encoded = encoders.encode(&sample.category, &sample.description);
        row.assign(&ArrayView1::from(encoded.as_slice()));
    }
    let labels: Array1<f32> = samples.iter().map(|sample| sample.priority).collect();

    let distribution = priority_distribution(samples);
    info!("Training with config: {options:?}");
    info!(
        "Sample priority distribution: low={}, medium={}, high={}, critical={}",
        distribution[0], distribution[1], distribution[2], distribution[3]
    );

    let (mut model, history) = train_regressor(features.view(), labels.view(), options)?;
    let validation_start = if history.holdout {
        history.train_rows
    } else {
        0
    };
    let validation = evaluate(
        &model,
        features.slice(s![validation_start.., ..]),
        labels.slice(s![validation_start..]),
    );
    model.metrics = Some(validation);

    let report = TrainingReport {
        samples: samples.len(),
        feature_len,
        vocabulary_size: encoders.vocabulary.len(),
        categories: encoders.category.len(),
        distribution,
        train_rows: history.train_rows,
        validation_rows: history.validation_rows,
        holdout: history.holdout,
        epochs_run: history.epochs.len(),
        stopped_early: history.stopped_early,
        best_val_loss: history.best_val_loss,
        final_epoch: history.last().copied(),
        validation,
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        "Priority model training completed in {}ms ({} epochs, validation mae={:.4}, band accuracy={:.3})",
        report.elapsed_ms, report.epochs_run, validation.mae, validation.band_accuracy
    );
    Ok((TrainedScorer { encoders, model }, report))
}

/// Regression error and priority-band agreement on held-out rows.
pub fn evaluate(
    model: &PriorityModel,
    features: ArrayView2<f32>,
    labels: ArrayView1<f32>,
) -> RegressionMetrics {
    let predicted = model.predict_batch(features);
    RegressionMetrics {
        mse: mean_squared_error(predicted.view(), labels),
        mae: mean_absolute_error(predicted.view(), labels),
        band_accuracy: BandConfusion::from_scores(predicted.view(), labels).accuracy(),
        rows: labels.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<TrainingSample> {
        let mut samples = Vec::new();
        for i in 0..12 {
            samples.push(TrainingSample::new(
                "water_supply",
                format!("Burst water main flooding street {i}"),
                0.95,
            ));
            samples.push(TrainingSample::new(
                "roads",
                format!("Small pothole near corner {i}"),
                0.2,
            ));
        }
        samples
    }

    fn quick() -> TrainOptions {
        TrainOptions {
            epochs: 10,
            ..TrainOptions::default()
        }
    }

    #[test]
    fn report_describes_the_run() {
        let samples = corpus();
        let (scorer, report) = train_from_samples(&samples, &quick()).unwrap();
        assert_eq!(report.samples, 24);
        assert_eq!(report.categories, 2);
        assert_eq!(report.distribution, [12, 0, 0, 12]);
        assert_eq!(report.feature_len, scorer.encoders.feature_len());
        assert_eq!(report.epochs_run, 10);
        assert_eq!(report.validation.rows, 4);
        assert_eq!(scorer.model.metrics, Some(report.validation));
    }

    #[test]
    fn scorer_rejects_blank_fields() {
        let (scorer, _) = train_from_samples(&corpus(), &quick()).unwrap();
        let missing = scorer.score(&ComplaintPayload::new("roads", "  "));
        assert!(matches!(
            missing,
            Err(PriorityError::Encoding(EncodingError::MissingField("description")))
        ));
        let missing = scorer.score(&ComplaintPayload::new("", "pothole"));
        assert!(matches!(
            missing,
            Err(PriorityError::Encoding(EncodingError::MissingField("category")))
        ));
    }

    #[test]
    fn empty_samples_are_a_dataset_error() {
        assert!(matches!(
            train_from_samples(&[], &quick()),
            Err(PipelineError::Dataset(DatasetError::NoSamples))
        ));
    }

    #[test]
    fn evaluation_reports_band_agreement() {
        let (scorer, _) = train_from_samples(&corpus(), &quick()).unwrap();
        let features = ndarray::Array2::<f32>::zeros((3, scorer.encoders.feature_len()));
        let labels = ndarray::array![0.2f32, 0.5, 0.95];
        let metrics = evaluate(&scorer.model, features.view(), labels.view());
        assert_eq!(metrics.rows, 3);
        // Identical inputs land in one band, so at most one target can match.
        assert!(metrics.band_accuracy <= 1.0 / 3.0 + 1e-6, "{metrics:?}");
        assert!(metrics.mse >= 0.0 && metrics.mae >= 0.0);
    }
}
