//! Training objective.

use candle_core::{Result, Tensor};

/// Mean squared error over both gaze components and the batch.
///
/// # Errors
///
/// Returns an error if the shapes differ.
pub fn gaze_mse(prediction: &Tensor, target: &Tensor) -> Result<Tensor> {
    candle_nn::loss::mse(prediction, target)
}
