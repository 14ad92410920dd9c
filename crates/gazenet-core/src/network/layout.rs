//! Data-format aware tensor helpers.
//!
//! The convolution, normalization and pooling kernels all expect
//! channels-first input. Layers keep their tensors in the configured
//! [`DataFormat`] and go through [`DataFormat::map_channels_first`] around
//! each kernel call.

use candle_core::{Result, Tensor};

use crate::domain::DataFormat;

impl DataFormat {
    /// Number of feature channels of a 4-D tensor in this format.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` is not 4-D.
    pub fn channels(self, x: &Tensor) -> Result<usize> {
        x.dims4()?;
        x.dim(self.channel_axis())
    }

    /// `(height, width)` of a 4-D tensor in this format.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` is not 4-D.
    pub fn spatial_size(self, x: &Tensor) -> Result<(usize, usize)> {
        x.dims4()?;
        let (h, w) = self.spatial_axes();
        Ok((x.dim(h)?, x.dim(w)?))
    }

    /// Rearranges a tensor in this format into channels-first layout.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` is not 4-D.
    pub fn to_channels_first(self, x: &Tensor) -> Result<Tensor> {
        x.dims4()?;
        match self {
            Self::ChannelsFirst => Ok(x.clone()),
            Self::ChannelsLast => x.permute((0, 3, 1, 2))?.contiguous(),
        }
    }

    /// Rearranges a channels-first tensor into this format.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` is not 4-D.
    pub fn from_channels_first(self, x: &Tensor) -> Result<Tensor> {
        x.dims4()?;
        match self {
            Self::ChannelsFirst => Ok(x.clone()),
            Self::ChannelsLast => x.permute((0, 2, 3, 1))?.contiguous(),
        }
    }

    /// Converts a tensor in this format into `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` is not 4-D.
    pub fn convert(self, x: &Tensor, target: Self) -> Result<Tensor> {
        if self == target {
            return Ok(x.clone());
        }
        target.from_channels_first(&self.to_channels_first(x)?)
    }

    /// Applies a channels-first kernel to a tensor held in this format.
    pub(crate) fn map_channels_first<F>(self, x: &Tensor, f: F) -> Result<Tensor>
    where
        F: FnOnce(&Tensor) -> Result<Tensor>,
    {
        let y = f(&self.to_channels_first(x)?)?;
        self.from_channels_first(&y)
    }
}
