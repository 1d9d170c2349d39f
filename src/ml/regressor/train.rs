use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Ix1, Ix2, Zip, s};
use rand::rngs::StdRng;
use rand::{SeedableRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::adam::{Adam, Moments};
use super::layers::{Dense, batch_moments, dropout_mask, relu, relu_grad, sigmoid};
use super::model::{ModelError, PriorityModel};
use super::{DEFAULT_L2_PENALTY, DROPOUT_RATES};
use crate::ml::metrics::{mean_absolute_error, mean_squared_error};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainOptions {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    /// Trailing fraction of rows held out for validation.
    pub validation_split: f32,
    /// Epochs without a validation-loss improvement before stopping.
    pub patience: usize,
    /// Log progress every `log_every` epochs (and on the last one).
    pub log_every: usize,
    pub l2_penalty: f32,
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            epochs: 200,
            batch_size: 32,
            learning_rate: 0.001,
            validation_split: 0.15,
            patience: 30,
            log_every: 25,
            l2_penalty: DEFAULT_L2_PENALTY,
            seed: 42,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrainingError {
    #[error("Empty training set")]
    EmptyDataset,
    #[error("Feature rows ({rows}) and labels ({labels}) differ in length")]
    LabelMismatch { rows: usize, labels: usize },
    #[error("Training diverged at epoch {epoch} (non-finite loss)")]
    Diverged { epoch: usize },
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Per-epoch losses; `loss`/`val_loss` include the L2 penalty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub loss: f32,
    pub val_loss: f32,
    pub mae: f32,
    pub val_mae: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochMetrics>,
    pub best_val_loss: f32,
    pub stopped_early: bool,
    /// False when the dataset was too small to hold rows out and training rows were reused.
    pub holdout: bool,
    pub train_rows: usize,
    pub validation_rows: usize,
}

impl TrainingHistory {
    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }
}

/// Fit a fresh [`PriorityModel`] on encoded features (`rows x input_len`) and labels in `[0, 1]`.
///
/// The trailing `validation_split` fraction of rows is held out; training rows are
/// reshuffled every epoch. Training stops early once validation loss has not improved
/// for `patience` consecutive epochs.
pub fn train_regressor(
    features: ArrayView2<f32>,
    labels: ArrayView1<f32>,
    options: &TrainOptions,
) -> Result<(PriorityModel, TrainingHistory), TrainingError> {
    let rows = features.nrows();
    if rows != labels.len() {
        return Err(TrainingError::LabelMismatch {
            rows,
            labels: labels.len(),
        });
    }
    if rows == 0 {
        return Err(TrainingError::EmptyDataset);
    }

    let split = options.validation_split.clamp(0.0, 0.9);
    let split_at = ((rows as f32) * (1.0 - split)).floor() as usize;
    let holdout = split_at > 0 && split_at < rows;
    let (train_x, train_y, val_x, val_y) = if holdout {
        (
            features.slice_move(s![..split_at, ..]),
            labels.slice_move(s![..split_at]),
            features.slice_move(s![split_at.., ..]),
            labels.slice_move(s![split_at..]),
        )
    } else {
        (features, labels, features, labels)
    };

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut model = PriorityModel::new(features.ncols(), &mut rng);
    let mut optimizer = Optimizer::new(&model, options.learning_rate);
    let batch_size = options.batch_size.max(1);
    let log_every = options.log_every.max(1);
    let l2 = options.l2_penalty.max(0.0);

    let mut indices: Vec<usize> = (0..train_x.nrows()).collect();
    let mut history = TrainingHistory {
        epochs: Vec::new(),
        best_val_loss: f32::INFINITY,
        stopped_early: false,
        holdout,
        train_rows: train_x.nrows(),
        validation_rows: val_x.nrows(),
    };
    let mut epochs_without_improvement = 0usize;

    for epoch in 0..options.epochs {
        indices.shuffle(&mut rng);
        let mut loss_sum = 0.0f32;
        let mut mae_sum = 0.0f32;
        for batch in indices.chunks(batch_size) {
            let x = train_x.select(Axis(0), batch);
            let y = train_y.select(Axis(0), batch);
            let cache = forward_train(&mut model, x, &mut rng);
            let predicted = cache.output.column(0);
            let weight = batch.len() as f32;
            loss_sum += mean_squared_error(predicted, y.view()) * weight;
            mae_sum += mean_absolute_error(predicted, y.view()) * weight;
            let grads = backward(&model, &cache, y.view(), l2);
            optimizer.apply(&mut model, &grads);
        }

        let penalty = l2_penalty(&model, l2);
        let train_rows = train_x.nrows() as f32;
        let val_predicted = model.predict_batch(val_x);
        let metrics = EpochMetrics {
            epoch,
            loss: loss_sum / train_rows + penalty,
            val_loss: mean_squared_error(val_predicted.view(), val_y) + penalty,
            mae: mae_sum / train_rows,
            val_mae: mean_absolute_error(val_predicted.view(), val_y),
        };
        if !metrics.loss.is_finite() || !metrics.val_loss.is_finite() {
            return Err(TrainingError::Diverged { epoch });
        }
        history.epochs.push(metrics);

        if metrics.val_loss < history.best_val_loss {
            history.best_val_loss = metrics.val_loss;
            epochs_without_improvement = 0;
        } else {
            epochs_without_improvement += 1;
        }

        if epoch % log_every == 0 || epoch + 1 == options.epochs {
            info!(
                "Epoch {epoch}: loss={:.4}, val_loss={:.4}, mae={:.4}",
                metrics.loss, metrics.val_loss, metrics.mae
            );
        } else {
            debug!(
                "Epoch {epoch}: loss={:.4}, val_loss={:.4}",
                metrics.loss, metrics.val_loss
            );
        }

        if epochs_without_improvement >= options.patience {
            info!(
                "Early stopping at epoch {epoch}. Best val_loss: {:.4}",
                history.best_val_loss
            );
            history.stopped_early = true;
            break;
        }
    }

    model.validate()?;
    Ok((model, history))
}

fn l2_penalty(model: &PriorityModel, l2: f32) -> f32 {
    let squares =
        |dense: &Dense| dense.weights.iter().map(|w| w * w).sum::<f32>();
    l2 * (squares(&model.dense1) + squares(&model.dense2))
}

/// Activations kept from the training-mode forward pass for backprop.
struct ForwardCache {
    input: Array2<f32>,
    z1: Array2<f32>,
    normalized: Array2<f32>,
    inv_std: Array1<f32>,
    mask1: Array2<f32>,
    h1: Array2<f32>,
    z2: Array2<f32>,
    mask2: Array2<f32>,
    h2: Array2<f32>,
    z3: Array2<f32>,
    mask3: Array2<f32>,
    h3: Array2<f32>,
    output: Array2<f32>,
}

fn forward_train(model: &mut PriorityModel, input: Array2<f32>, rng: &mut StdRng) -> ForwardCache {
    let rows = input.nrows();
    let z1 = model.dense1.affine(input.view());
    let a1 = relu(&z1);

    let (mean, variance) = batch_moments(&a1);
    let epsilon = model.norm1.epsilon;
    let inv_std = variance.mapv(|v| 1.0 / (v + epsilon).sqrt());
    let normalized = (&a1 - &mean) * &inv_std;
    let scaled = &normalized * &model.norm1.gamma + &model.norm1.beta;
    model.norm1.update_moving(&mean, &variance);

    let mask1 = dropout_mask(rows, scaled.ncols(), DROPOUT_RATES[0], rng);
    let h1 = &scaled * &mask1;

    let z2 = model.dense2.affine(h1.view());
    let mask2 = dropout_mask(rows, z2.ncols(), DROPOUT_RATES[1], rng);
    let h2 = relu(&z2) * &mask2;

    let z3 = model.dense3.affine(h2.view());
    let mask3 = dropout_mask(rows, z3.ncols(), DROPOUT_RATES[2], rng);
    let h3 = relu(&z3) * &mask3;

    let output = model.output.affine(h3.view()).mapv(sigmoid);

    ForwardCache {
        input,
        z1,
        normalized,
        inv_std,
        mask1,
        h1,
        z2,
        mask2,
        h2,
        z3,
        mask3,
        h3,
        output,
    }
}

struct DenseGrads {
    weights: Array2<f32>,
    bias: Array1<f32>,
}

impl DenseGrads {
    fn from_delta(input: &Array2<f32>, delta: &Array2<f32>) -> Self {
        Self {
            weights: input.t().dot(delta),
            bias: delta.sum_axis(Axis(0)),
        }
    }
}

struct Gradients {
    dense1: DenseGrads,
    gamma: Array1<f32>,
    beta: Array1<f32>,
    dense2: DenseGrads,
    dense3: DenseGrads,
    output: DenseGrads,
}

fn backward(
    model: &PriorityModel,
    cache: &ForwardCache,
    targets: ArrayView1<f32>,
    l2: f32,
) -> Gradients {
    let rows = targets.len().max(1) as f32;

    // d(MSE)/d(z4) through the sigmoid.
    let d_out = Zip::from(cache.output.column(0))
        .and(targets)
        .map_collect(|&o, &t| 2.0 * (o - t) / rows * o * (1.0 - o));
    let dz4 = d_out.insert_axis(Axis(1));
    let output = DenseGrads::from_delta(&cache.h3, &dz4);

    let dz3 = dz4.dot(&model.output.weights.t()) * &cache.mask3 * relu_grad(&cache.z3);
    let dense3 = DenseGrads::from_delta(&cache.h2, &dz3);

    let dz2 = dz3.dot(&model.dense3.weights.t()) * &cache.mask2 * relu_grad(&cache.z2);
    let mut dense2 = DenseGrads::from_delta(&cache.h1, &dz2);
    dense2.weights.scaled_add(2.0 * l2, &model.dense2.weights);

    let d_scaled = dz2.dot(&model.dense2.weights.t()) * &cache.mask1;
    let gamma = (&d_scaled * &cache.normalized).sum_axis(Axis(0));
    let beta = d_scaled.sum_axis(Axis(0));
    let d_normalized = &d_scaled * &model.norm1.gamma;
    let sum_d = d_normalized.sum_axis(Axis(0));
    let sum_d_norm = (&d_normalized * &cache.normalized).sum_axis(Axis(0));
    let da1 = (&d_normalized * rows - &sum_d - &cache.normalized * &sum_d_norm) * &cache.inv_std
        / rows;
    let dz1 = da1 * relu_grad(&cache.z1);
    let mut dense1 = DenseGrads::from_delta(&cache.input, &dz1);
    dense1.weights.scaled_add(2.0 * l2, &model.dense1.weights);

    Gradients {
        dense1,
        gamma,
        beta,
        dense2,
        dense3,
        output,
    }
}

struct DenseMoments {
    weights: Moments<Ix2>,
    bias: Moments<Ix1>,
}

impl DenseMoments {
    fn new(dense: &Dense) -> Self {
        Self {
            weights: Moments::zeros_like(&dense.weights),
            bias: Moments::zeros_like(&dense.bias),
        }
    }

    fn apply(&mut self, adam: &Adam, dense: &mut Dense, grads: &DenseGrads) {
        adam.update(&mut dense.weights, &grads.weights, &mut self.weights);
        adam.update(&mut dense.bias, &grads.bias, &mut self.bias);
    }
}

struct Optimizer {
    adam: Adam,
    dense1: DenseMoments,
    gamma: Moments<Ix1>,
    beta: Moments<Ix1>,
    dense2: DenseMoments,
    dense3: DenseMoments,
    output: DenseMoments,
}

impl Optimizer {
    fn new(model: &PriorityModel, learning_rate: f32) -> Self {
        Self {
            adam: Adam::new(learning_rate),
            dense1: DenseMoments::new(&model.dense1),
            gamma: Moments::zeros_like(&model.norm1.gamma),
            beta: Moments::zeros_like(&model.norm1.beta),
            dense2: DenseMoments::new(&model.dense2),
            dense3: DenseMoments::new(&model.dense3),
            output: DenseMoments::new(&model.output),
        }
    }

    fn apply(&mut self, model: &mut PriorityModel, grads: &Gradients) {
        self.adam.begin_step();
        let adam = &self.adam;
        self.dense1.apply(adam, &mut model.dense1, &grads.dense1);
        adam.update(&mut model.norm1.gamma, &grads.gamma, &mut self.gamma);
        adam.update(&mut model.norm1.beta, &grads.beta, &mut self.beta);
        self.dense2.apply(adam, &mut model.dense2, &grads.dense2);
        self.dense3.apply(adam, &mut model.dense3, &grads.dense3);
        self.output.apply(adam, &mut model.output, &grads.output);
    }
}
