use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fully connected layer; `weights` is `inputs x units`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dense {
    pub weights: Array2<f32>,
    pub bias: Array1<f32>,
}

impl Dense {
    /// Glorot-uniform weights, zero bias.
    pub fn glorot<R: Rng>(inputs: usize, units: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (inputs + units).max(1) as f32).sqrt();
        let weights =
            Array2::from_shape_fn((inputs, units), |_| (rng.random::<f32>() * 2.0 - 1.0) * limit);
        Self {
            weights,
            bias: Array1::zeros(units),
        }
    }

    pub fn inputs(&self) -> usize {
        self.weights.nrows()
    }

    pub fn units(&self) -> usize {
        self.weights.ncols()
    }

    /// `x . W + b` for a batch of rows.
    pub fn affine(&self, input: ArrayView2<f32>) -> Array2<f32> {
        input.dot(&self.weights) + &self.bias
    }
}

/// Batch normalization over the feature axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchNorm {
    pub gamma: Array1<f32>,
    pub beta: Array1<f32>,
    pub moving_mean: Array1<f32>,
    pub moving_variance: Array1<f32>,
    pub momentum: f32,
    pub epsilon: f32,
}

impl BatchNorm {
    pub fn new(units: usize) -> Self {
        Self {
            gamma: Array1::ones(units),
            beta: Array1::zeros(units),
            moving_mean: Array1::zeros(units),
            moving_variance: Array1::ones(units),
            momentum: 0.99,
            epsilon: 1e-3,
        }
    }

    pub fn units(&self) -> usize {
        self.gamma.len()
    }

    /// Inference-mode normalization with the moving statistics.
    pub fn apply(&self, input: &Array2<f32>) -> Array2<f32> {
        let scale = &self.gamma / &self.moving_variance.mapv(|v| (v + self.epsilon).sqrt());
        let shift = &self.beta - &(&self.moving_mean * &scale);
        input * &scale + &shift
    }

    /// Fold one batch's statistics into the moving averages.
    pub fn update_moving(&mut self, batch_mean: &Array1<f32>, batch_variance: &Array1<f32>) {
        let keep = self.momentum;
        self.moving_mean = &self.moving_mean * keep + &(batch_mean * (1.0 - keep));
        self.moving_variance = &self.moving_variance * keep + &(batch_variance * (1.0 - keep));
    }
}

/// Per-feature mean and biased variance of a batch.
pub(super) fn batch_moments(input: &Array2<f32>) -> (Array1<f32>, Array1<f32>) {
    let rows = input.nrows().max(1) as f32;
    let mean = input.sum_axis(Axis(0)) / rows;
    let centered = input - &mean;
    let variance = centered.mapv(|v| v * v).sum_axis(Axis(0)) / rows;
    (mean, variance)
}

pub(super) fn relu(input: &Array2<f32>) -> Array2<f32> {
    input.mapv(|v| v.max(0.0))
}

/// Derivative mask of ReLU evaluated at the pre-activation.
pub(super) fn relu_grad(pre_activation: &Array2<f32>) -> Array2<f32> {
    pre_activation.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 })
}

pub(super) fn sigmoid(value: f32) -> f32 {
    1.0 / (1.0 + (-value).exp())
}

/// Inverted dropout mask: dropped units are 0, kept units are scaled by `1 / (1 - rate)`.
pub(super) fn dropout_mask<R: Rng>(rows: usize, cols: usize, rate: f32, rng: &mut R) -> Array2<f32> {
    let rate = rate.clamp(0.0, 0.9);
    let keep_scale = 1.0 / (1.0 - rate);
    Array2::from_shape_fn((rows, cols), |_| {
        if rng.random::<f32>() < rate {
            0.0
        } else {
            keep_scale
        }
    })
}
