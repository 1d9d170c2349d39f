//! Machine learning helpers for training and inference.
//!
//! The priority regressor is small enough to train in-process on the CPU with
//! plain `ndarray` math, so there is no external training runtime.

pub mod metrics;
pub mod regressor;
