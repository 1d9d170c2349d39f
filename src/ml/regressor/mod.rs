//! Feed-forward priority regressor.
//!
//! Layout: `Dense(96, relu, l2) -> BatchNorm -> Dropout(0.25) -> Dense(48, relu, l2)
//! -> Dropout(0.2) -> Dense(24, relu) -> Dropout(0.15) -> Dense(1, sigmoid)`.

mod adam;
mod layers;
mod model;
mod train;

pub use layers::{BatchNorm, Dense};
pub use model::{ModelError, PriorityModel};
pub use train::{EpochMetrics, TrainOptions, TrainingError, TrainingHistory, train_regressor};

/// Units in the three hidden dense layers.
pub const HIDDEN_UNITS: [usize; 3] = [96, 48, 24];
/// Dropout rate applied after each hidden block.
pub const DROPOUT_RATES: [f32; 3] = [0.25, 0.2, 0.15];
/// Kernel L2 coefficient on the first two dense layers.
pub const DEFAULT_L2_PENALTY: f32 = 5e-4;
