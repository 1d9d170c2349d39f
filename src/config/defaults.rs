use crate::ml::regressor::TrainOptions;

pub(super) const MAX_EPOCHS: usize = 10_000;
pub(super) const MAX_BATCH_SIZE: usize = 4_096;
pub(super) const MAX_VALIDATION_SPLIT: f32 = 0.5;
pub(super) const MIN_TRAINING_TIMEOUT_SECS: u64 = 1;
pub(super) const MAX_TRAINING_TIMEOUT_SECS: u64 = 86_400;

pub(super) fn default_epochs() -> usize {
    TrainOptions::default().epochs
}

pub(super) fn default_batch_size() -> usize {
    TrainOptions::default().batch_size
}

pub(super) fn default_learning_rate() -> f32 {
    TrainOptions::default().learning_rate
}

pub(super) fn default_validation_split() -> f32 {
    TrainOptions::default().validation_split
}

pub(super) fn default_patience() -> usize {
    TrainOptions::default().patience
}

pub(super) fn default_log_every() -> usize {
    TrainOptions::default().log_every
}

pub(super) fn default_l2_penalty() -> f32 {
    TrainOptions::default().l2_penalty
}

pub(super) fn default_seed() -> u64 {
    TrainOptions::default().seed
}

pub(super) fn default_training_timeout_secs() -> u64 {
    300
}

pub(super) fn clamp_learning_rate(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value.min(1.0)
    } else {
        default_learning_rate()
    }
}

pub(super) fn clamp_fraction(value: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, max)
    } else {
        fallback
    }
}
