//! Harness-facing model trait.

use crate::ports::DataSource;

use super::{Mode, ModelOutputs, Result, RunIdentifier};

/// A gaze model a training or evaluation harness can drive.
pub trait GazeModel: Send + Sync {
    /// Identifier used to namespace saved artifacts.
    fn identifier(&self) -> &RunIdentifier;

    /// Runs the model on the first of `data_sources`.
    ///
    /// # Errors
    ///
    /// Returns [`GazeNetError::MissingDataSource`](super::GazeNetError::MissingDataSource)
    /// when `data_sources` is empty, `MissingTensor` when the first source lacks
    /// `"eye"` or `"gaze"`, and `ShapeMismatch` for incompatible tensors.
    fn build_model(&self, data_sources: &[&dyn DataSource], mode: Mode) -> Result<ModelOutputs>;
}
