use ndarray::{Array1, ArrayView2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::HIDDEN_UNITS;
use super::layers::{BatchNorm, Dense, relu, sigmoid};
use crate::ml::metrics::RegressionMetrics;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Feature length {actual} does not match model input length {expected}")]
    InputLength { expected: usize, actual: usize },
    #[error("Model produced a non-finite score")]
    NonFinite,
    #[error("Model shape mismatch: {0}")]
    Shape(String),
}

/// Trained priority regressor weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityModel {
    pub model_version: i64,
    pub input_len: usize,
    pub dense1: Dense,
    pub norm1: BatchNorm,
    pub dense2: Dense,
    pub dense3: Dense,
    pub output: Dense,
    #[serde(default)]
    pub metrics: Option<RegressionMetrics>,
}

impl PriorityModel {
    /// Freshly initialized network for `input_len` features.
    pub fn new<R: Rng>(input_len: usize, rng: &mut R) -> Self {
        let [h1, h2, h3] = HIDDEN_UNITS;
        Self {
            model_version: 1,
            input_len,
            dense1: Dense::glorot(input_len, h1, rng),
            norm1: BatchNorm::new(h1),
            dense2: Dense::glorot(h1, h2, rng),
            dense3: Dense::glorot(h2, h3, rng),
            output: Dense::glorot(h3, 1, rng),
            metrics: None,
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let [h1, h2, h3] = HIDDEN_UNITS;
        let dense = [
            ("dense1", &self.dense1, self.input_len, h1),
            ("dense2", &self.dense2, h1, h2),
            ("dense3", &self.dense3, h2, h3),
            ("output", &self.output, h3, 1),
        ];
        for (name, layer, inputs, units) in dense {
            if layer.inputs() != inputs || layer.units() != units {
                return Err(ModelError::Shape(format!(
                    "{name} is {}x{} (expected {inputs}x{units})",
                    layer.inputs(),
                    layer.units()
                )));
            }
            if layer.bias.len() != units {
                return Err(ModelError::Shape(format!("{name} bias length mismatch")));
            }
        }
        let norm = &self.norm1;
        if norm.units() != h1
            || norm.beta.len() != h1
            || norm.moving_mean.len() != h1
            || norm.moving_variance.len() != h1
        {
            return Err(ModelError::Shape("norm1 length mismatch".to_string()));
        }
        Ok(())
    }

    /// Inference-mode forward pass (no dropout, moving batch-norm statistics).
    pub fn predict_batch(&self, input: ArrayView2<f32>) -> Array1<f32> {
        let h1 = self.norm1.apply(&relu(&self.dense1.affine(input)));
        let h2 = relu(&self.dense2.affine(h1.view()));
        let h3 = relu(&self.dense3.affine(h2.view()));
        self.output
            .affine(h3.view())
            .index_axis_move(Axis(1), 0)
            .mapv(sigmoid)
    }

    /// Score one encoded complaint.
    pub fn predict(&self, features: &[f32]) -> Result<f32, ModelError> {
        if features.len() != self.input_len {
            return Err(ModelError::InputLength {
                expected: self.input_len,
                actual: features.len(),
            });
        }
        let row = ArrayView2::from_shape((1, features.len()), features)
            .map_err(|err| ModelError::Shape(err.to_string()))?;
        let score = self
            .predict_batch(row)
            .first()
            .copied()
            .ok_or(ModelError::NonFinite)?;
        if score.is_finite() {
            Ok(score)
        } else {
            Err(ModelError::NonFinite)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn model(input_len: usize) -> PriorityModel {
        PriorityModel::new(input_len, &mut StdRng::seed_from_u64(42))
    }

    #[test]
    fn fresh_model_is_valid_and_bounded() {
        let model = model(10);
        model.validate().unwrap();
        let score = model.predict(&[0.3; 10]).unwrap();
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn rejects_wrong_input_length() {
        let model = model(5);
        assert_eq!(
            model.predict(&[0.0; 4]),
            Err(ModelError::InputLength {
                expected: 5,
                actual: 4
            })
        );
    }

    #[test]
    fn validate_catches_shape_drift() {
        let mut model = model(4);
        model.input_len = 6;
        assert!(matches!(model.validate(), Err(ModelError::Shape(_))));
    }

    #[test]
    fn batch_and_single_predictions_agree() {
        let model = model(3);
        let rows = ndarray::array![[0.1f32, 0.2, 0.3], [0.9, 0.0, 0.5]];
        let batch = model.predict_batch(rows.view());
        let single = model.predict(&[0.9, 0.0, 0.5]).unwrap();
        assert!((batch[1] - single).abs() < 1e-6);
    }

    #[test]
    fn survives_json_round_trip() {
        let model = model(4);
        let json = serde_json::to_string(&model).unwrap();
        let restored: PriorityModel = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, model);
    }
}
