//! Regression head: batch norm, ReLU, global average pooling, linear.

use candle_core::{Module, ModuleT, Result, Tensor};
use candle_nn::{batch_norm, linear, BatchNorm, Linear, VarBuilder};

use super::dense::norm_config;
use super::pooling::global_avg_pool;
use crate::domain::{DataFormat, LayerId, Mode, GAZE_DIMS};

/// Maps the last dense block's features to an unbounded `(pitch, yaw)` pair.
pub struct RegressionHead {
    norm: BatchNorm,
    fc: Linear,
    format: DataFormat,
}

impl RegressionHead {
    /// Creates the head's parameters under the `regression` prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters cannot be created or loaded.
    pub fn new(in_channels: usize, format: DataFormat, vb: &VarBuilder) -> Result<Self> {
        let vb = vb.pp(LayerId::Head.path());
        let norm = batch_norm(in_channels, norm_config(), vb.pp("bnlast"))?;
        let fc = linear(in_channels, GAZE_DIMS, vb.pp("fc4"))?;

        Ok(Self { norm, fc, format })
    }

    /// `(batch, ..)` feature map to `(batch, 2)` gaze.
    ///
    /// # Errors
    ///
    /// Returns an error on shape mismatch.
    pub fn forward(&self, x: &Tensor, mode: Mode) -> Result<Tensor> {
        let x = self.format.to_channels_first(x)?;
        let x = self.norm.forward_t(&x, mode.is_train())?.relu()?;
        let x = global_avg_pool(&x, DataFormat::ChannelsFirst)?;
        self.fc.forward(&x)
    }
}
