//! Named outputs handed back to the training harness.

use std::collections::BTreeMap;

use candle_core::{DType, Tensor};

/// Key of the image tensor in a data-source bundle.
pub const EYE_KEY: &str = "eye";
/// Key of the gaze tensor in a data-source bundle and in the predictions.
pub const GAZE_KEY: &str = "gaze";
/// Key of the mean squared error loss term.
pub const GAZE_MSE_KEY: &str = "gaze_mse";
/// Key of the mean angular error metric.
pub const GAZE_ANGULAR_KEY: &str = "gaze_angular";

/// Predictions, loss terms and metrics of one forward pass.
#[derive(Debug, Clone, Default)]
pub struct ModelOutputs {
    /// Predicted tensors, keyed by target name.
    pub predictions: BTreeMap<String, Tensor>,
    /// Scalar terms to optimize.
    pub loss_terms: BTreeMap<String, Tensor>,
    /// Scalar terms to report.
    pub metrics: BTreeMap<String, Tensor>,
}

impl ModelOutputs {
    /// The predicted gaze tensor, `(batch, 2)`.
    #[must_use]
    pub fn gaze(&self) -> Option<&Tensor> {
        self.predictions.get(GAZE_KEY)
    }

    /// Reads a scalar loss term as `f32`.
    ///
    /// # Errors
    ///
    /// Returns an error if the term is not a scalar.
    pub fn loss_value(&self, key: &str) -> candle_core::Result<Option<f32>> {
        self.loss_terms.get(key).map(scalar_value).transpose()
    }

    /// Reads a scalar metric as `f32`.
    ///
    /// # Errors
    ///
    /// Returns an error if the metric is not a scalar.
    pub fn metric_value(&self, key: &str) -> candle_core::Result<Option<f32>> {
        self.metrics.get(key).map(scalar_value).transpose()
    }
}

fn scalar_value(tensor: &Tensor) -> candle_core::Result<f32> {
    tensor.to_dtype(DType::F32)?.to_scalar::<f32>()
}
