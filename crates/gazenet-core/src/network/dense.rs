//! Dense layers, dense blocks and transition layers.
//!
//! A dense layer never replaces its input: it computes `growth_rate` new
//! channels and concatenates them in front of everything it was given, so
//! each later layer in the block sees every earlier layer's output.

use candle_core::{Module, ModuleT, Result, Tensor};
use candle_nn::{batch_norm, conv2d, BatchNorm, BatchNormConfig, Conv2d, Conv2dConfig, VarBuilder};
use tracing::debug;

use super::pooling::avg_pool2d_same;
use crate::domain::{DataFormat, LayerId, Mode};

/// Batch-norm epsilon.
const NORM_EPS: f64 = 1e-3;
/// Weight of the current batch in the running statistics (decay 0.99).
const NORM_MOMENTUM: f64 = 0.01;

/// Batch-norm settings shared by every layer.
pub(crate) fn norm_config() -> BatchNormConfig {
    BatchNormConfig {
        eps: NORM_EPS,
        remove_mean: true,
        affine: true,
        momentum: NORM_MOMENTUM,
    }
}

/// Stride-1 convolution that keeps the spatial size (odd kernels).
pub(crate) fn same_conv(kernel: usize) -> Conv2dConfig {
    Conv2dConfig {
        padding: (kernel - 1) / 2,
        ..Conv2dConfig::default()
    }
}

/// Batch norm, ReLU, 3x3 convolution, then concatenation with the input.
pub struct DenseLayer {
    id: LayerId,
    norm: BatchNorm,
    conv: Conv2d,
    growth_rate: usize,
    format: DataFormat,
}

impl DenseLayer {
    /// Creates the layer's parameters under `id`'s prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters cannot be created or loaded.
    pub fn new(
        id: LayerId,
        in_channels: usize,
        growth_rate: usize,
        format: DataFormat,
        vb: &VarBuilder,
    ) -> Result<Self> {
        let vb = vb.pp(id.path());
        let norm = batch_norm(in_channels, norm_config(), vb.pp("bn1"))?;
        let conv = conv2d(in_channels, growth_rate, 3, same_conv(3), vb.pp("conv1"))?;

        Ok(Self {
            id,
            norm,
            conv,
            growth_rate,
            format,
        })
    }

    /// Layer identifier.
    #[must_use]
    pub const fn id(&self) -> LayerId {
        self.id
    }

    /// Channels this layer adds.
    #[must_use]
    pub const fn growth_rate(&self) -> usize {
        self.growth_rate
    }

    /// Returns `[new channels, x]` concatenated along the channel axis.
    ///
    /// # Errors
    ///
    /// Returns an error on shape mismatch.
    pub fn forward(&self, x: &Tensor, mode: Mode) -> Result<Tensor> {
        let fresh = self.format.map_channels_first(x, |x| {
            let x = self.norm.forward_t(x, mode.is_train())?.relu()?;
            self.conv.forward(&x)
        })?;
        Tensor::cat(&[&fresh, x], self.format.channel_axis())
    }
}

/// Batch norm, ReLU, width-preserving 1x1 convolution, ReLU, 2x2 average pooling.
pub struct Transition {
    id: LayerId,
    norm: BatchNorm,
    conv: Conv2d,
    format: DataFormat,
}

impl Transition {
    /// Creates the transition's parameters under `id`'s prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters cannot be created or loaded.
    pub fn new(id: LayerId, channels: usize, format: DataFormat, vb: &VarBuilder) -> Result<Self> {
        let vb = vb.pp(id.path());
        let norm = batch_norm(channels, norm_config(), vb.pp("bn1"))?;
        let conv = conv2d(channels, channels, 1, same_conv(1), vb.pp("conv1"))?;

        Ok(Self {
            id,
            norm,
            conv,
            format,
        })
    }

    /// Layer identifier.
    #[must_use]
    pub const fn id(&self) -> LayerId {
        self.id
    }

    /// Halves each spatial dimension (rounding up); keeps the channel count.
    ///
    /// # Errors
    ///
    /// Returns an error on shape mismatch.
    pub fn forward(&self, x: &Tensor, mode: Mode) -> Result<Tensor> {
        self.format.map_channels_first(x, |x| {
            let x = self.norm.forward_t(x, mode.is_train())?.relu()?;
            let x = self.conv.forward(&x)?.relu()?;
            avg_pool2d_same(&x, 2, 2)
        })
    }
}

/// A run of dense layers, optionally followed by a transition.
pub struct DenseBlock {
    index: usize,
    layers: Vec<DenseLayer>,
    transition: Option<Transition>,
    out_channels: usize,
}

impl DenseBlock {
    /// Creates block `index` (1-based) with `num_layers` dense layers.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters cannot be created or loaded.
    pub fn new(
        index: usize,
        in_channels: usize,
        num_layers: usize,
        growth_rate: usize,
        with_transition: bool,
        format: DataFormat,
        vb: &VarBuilder,
    ) -> Result<Self> {
        let mut layers = Vec::with_capacity(num_layers);
        let mut channels = in_channels;

        for layer in 0..num_layers {
            let id = LayerId::Dense {
                block: index,
                layer,
            };
            layers.push(DenseLayer::new(id, channels, growth_rate, format, vb)?);
            channels += growth_rate;
        }

        let transition = if with_transition {
            Some(Transition::new(
                LayerId::Transition { block: index },
                channels,
                format,
                vb,
            )?)
        } else {
            None
        };

        debug!(
            "Block {index}: {num_layers} dense layers, {in_channels} -> {channels} channels{}",
            if with_transition { ", with transition" } else { "" }
        );

        Ok(Self {
            index,
            layers,
            transition,
            out_channels: channels,
        })
    }

    /// 1-based block index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Channels leaving the block.
    #[must_use]
    pub const fn out_channels(&self) -> usize {
        self.out_channels
    }

    /// Identifiers of the block's layers, in forward order.
    pub fn layer_ids(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.layers
            .iter()
            .map(DenseLayer::id)
            .chain(self.transition.iter().map(Transition::id))
    }

    /// Runs every dense layer, then the transition if there is one.
    ///
    /// # Errors
    ///
    /// Returns an error on shape mismatch.
    pub fn forward(&self, x: &Tensor, mode: Mode) -> Result<Tensor> {
        let mut x = x.clone();
        for layer in &self.layers {
            x = layer.forward(&x, mode)?;
        }
        match &self.transition {
            Some(transition) => transition.forward(&x, mode),
            None => Ok(x),
        }
    }
}
