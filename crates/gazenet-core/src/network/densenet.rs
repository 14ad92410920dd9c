//! DenseNet gaze regressor.
//!
//! Stem convolution, three dense blocks (transitions after the first two),
//! and a regression head producing `(pitch, yaw)`:
//!
//! ```text
//! eye -> conv0 -> block1 -> transition1 -> block2 -> transition2 -> block3
//!     -> bn -> relu -> global average pool -> fc -> gaze
//! ```

use candle_core::{Module, Tensor};
use candle_nn::{conv2d, Conv2d, VarBuilder};
use tracing::debug;

use super::dense::{same_conv, DenseBlock};
use super::gaze::angular_error_from_pitchyaw;
use super::head::RegressionHead;
use super::loss::gaze_mse;
use crate::domain::{
    ChannelPlan, GazeModel, GazeNetError, LayerId, Mode, ModelOutputs, NetworkConfig, Result,
    RunIdentifier, EYE_KEY, GAZE_ANGULAR_KEY, GAZE_KEY, GAZE_MSE_KEY, STEM_CHANNELS,
};
use crate::ports::DataSource;

/// Name used for run identifiers of this architecture.
pub const MODEL_NAME: &str = "DenseNetFixed";

/// The gaze regression network: parameters plus forward pass.
pub struct GazeRegressionNetwork {
    config: NetworkConfig,
    plan: ChannelPlan,
    input_channels: usize,
    stem: Conv2d,
    blocks: Vec<DenseBlock>,
    head: RegressionHead,
}

impl GazeRegressionNetwork {
    /// Creates every parameter of the network for images with
    /// `input_channels` channels.
    ///
    /// The config is validated before any parameter is created.
    ///
    /// # Errors
    ///
    /// Returns [`GazeNetError::InvalidConfig`] for an invalid depth or growth
    /// rate, and [`GazeNetError::ShapeMismatch`] if the parameters cannot be
    /// created or loaded from `vb`.
    pub fn new(config: NetworkConfig, input_channels: usize, vb: &VarBuilder) -> Result<Self> {
        let plan = config.channel_plan()?;
        let format = config.data_format;

        debug!(
            "Building DenseNet: depth {}, growth rate {}, {} layers per block, {format}",
            config.depth, config.growth_rate, plan.layers_per_block
        );

        let stem = conv2d(
            input_channels,
            STEM_CHANNELS,
            3,
            same_conv(3),
            vb.pp(LayerId::Stem.path()).pp("conv0"),
        )?;

        let blocks = plan
            .blocks
            .iter()
            .map(|block| {
                DenseBlock::new(
                    block.index,
                    block.in_channels,
                    plan.layers_per_block,
                    plan.growth_rate,
                    block.has_transition,
                    format,
                    vb,
                )
            })
            .collect::<candle_core::Result<Vec<_>>>()?;

        let head = RegressionHead::new(plan.head_channels, format, vb)?;

        Ok(Self {
            config,
            plan,
            input_channels,
            stem,
            blocks,
            head,
        })
    }

    /// The configuration the network was built from.
    #[must_use]
    pub const fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Channel widths of every stage.
    #[must_use]
    pub const fn plan(&self) -> &ChannelPlan {
        &self.plan
    }

    /// Channels expected in the input images.
    #[must_use]
    pub const fn input_channels(&self) -> usize {
        self.input_channels
    }

    /// Every parameterized layer, in forward order.
    #[must_use]
    pub fn layer_ids(&self) -> Vec<LayerId> {
        std::iter::once(LayerId::Stem)
            .chain(self.blocks.iter().flat_map(DenseBlock::layer_ids))
            .chain(std::iter::once(LayerId::Head))
            .collect()
    }

    /// Predicts `(batch, 2)` gaze from a batch of eye images.
    ///
    /// # Errors
    ///
    /// Returns [`GazeNetError::ShapeMismatch`] if the images do not match the
    /// configured data format or channel count.
    pub fn forward(&self, eye_images: &Tensor, mode: Mode) -> Result<Tensor> {
        let format = self.config.data_format;
        let mut x = format.map_channels_first(eye_images, |x| self.stem.forward(x))?;
        for block in &self.blocks {
            x = block.forward(&x, mode)?;
        }
        Ok(self.head.forward(&x, mode)?)
    }

    /// Prediction, loss and metric for one batch.
    ///
    /// # Errors
    ///
    /// Returns [`GazeNetError::ShapeMismatch`] for incompatible images or
    /// targets.
    pub fn build(&self, eye_images: &Tensor, gaze_targets: &Tensor, mode: Mode) -> Result<ModelOutputs> {
        let prediction = self.forward(eye_images, mode)?;
        let mse = gaze_mse(&prediction, gaze_targets)?;
        let angular = angular_error_from_pitchyaw(&prediction, gaze_targets)?;

        let mut outputs = ModelOutputs::default();
        outputs.predictions.insert(GAZE_KEY.to_string(), prediction);
        outputs.loss_terms.insert(GAZE_MSE_KEY.to_string(), mse);
        outputs.metrics.insert(GAZE_ANGULAR_KEY.to_string(), angular);
        Ok(outputs)
    }
}

/// [`GazeRegressionNetwork`] bound to a run identifier, driven through
/// [`GazeModel`].
pub struct DenseNetFixed {
    network: GazeRegressionNetwork,
    identifier: RunIdentifier,
}

impl DenseNetFixed {
    /// Builds the network and attaches `identifier`.
    ///
    /// # Errors
    ///
    /// See [`GazeRegressionNetwork::new`].
    pub fn new(
        config: NetworkConfig,
        input_channels: usize,
        identifier: RunIdentifier,
        vb: &VarBuilder,
    ) -> Result<Self> {
        let network = GazeRegressionNetwork::new(config, input_channels, vb)?;
        Ok(Self {
            network,
            identifier,
        })
    }

    /// The underlying network.
    #[must_use]
    pub const fn network(&self) -> &GazeRegressionNetwork {
        &self.network
    }
}

impl GazeModel for DenseNetFixed {
    fn identifier(&self) -> &RunIdentifier {
        &self.identifier
    }

    fn build_model(&self, data_sources: &[&dyn DataSource], mode: Mode) -> Result<ModelOutputs> {
        let source = data_sources
            .first()
            .ok_or(GazeNetError::MissingDataSource)?;
        let tensors = source.output_tensors();

        let lookup = |key: &str| {
            tensors.get(key).ok_or_else(|| GazeNetError::MissingTensor {
                data_source: source.name().to_string(),
                key: key.to_string(),
            })
        };
        let eye = lookup(EYE_KEY)?;
        let gaze = lookup(GAZE_KEY)?;

        debug!(
            "Running {} on '{}': eye {:?}, gaze {:?}",
            self.identifier,
            source.name(),
            eye.dims(),
            gaze.dims()
        );

        self.network.build(eye, gaze, mode)
    }
}
