//! Network configuration and channel bookkeeping.
//!
//! Everything in here is plain arithmetic over the configuration: no tensors
//! are created, so plans can be inspected before any parameter exists.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{GazeNetError, LayerId};

/// Feature channels produced by the stem convolution.
pub const STEM_CHANNELS: usize = 16;

/// Regression outputs per batch item: pitch and yaw.
pub const GAZE_DIMS: usize = 2;

/// Number of dense blocks in the network.
pub const NUM_BLOCKS: usize = 3;

/// Layers that are not part of a dense block: stem, head and one per transition.
const FIXED_DEPTH: usize = 4;

/// Kernel size of the stem and dense-layer convolutions.
const CONV_KERNEL: usize = 3;

/// Memory layout of image and feature-map tensors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    /// `(batch, height, width, channels)`.
    #[default]
    ChannelsLast,
    /// `(batch, channels, height, width)`.
    ChannelsFirst,
}

impl DataFormat {
    /// Axis holding the feature channels.
    #[must_use]
    pub const fn channel_axis(self) -> usize {
        match self {
            Self::ChannelsLast => 3,
            Self::ChannelsFirst => 1,
        }
    }

    /// Axes holding height and width, in that order.
    #[must_use]
    pub const fn spatial_axes(self) -> (usize, usize) {
        match self {
            Self::ChannelsLast => (1, 2),
            Self::ChannelsFirst => (2, 3),
        }
    }

    /// Canonical lowercase name, as used in config files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChannelsLast => "channels_last",
            Self::ChannelsFirst => "channels_first",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "channels_last" => Ok(Self::ChannelsLast),
            "channels_first" => Ok(Self::ChannelsFirst),
            other => Err(format!(
                "unknown data format '{other}', expected 'channels_last' or 'channels_first'"
            )),
        }
    }
}

/// Batch-normalization behaviour for a forward pass.
///
/// `Train` normalizes with the statistics of the current batch (and updates
/// the running averages); `Eval` normalizes with the running averages.
/// `Train` is the default for evaluation runs too.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Batch statistics.
    #[default]
    Train,
    /// Running statistics.
    Eval,
}

impl Mode {
    /// Returns true for [`Mode::Train`].
    #[must_use]
    pub const fn is_train(self) -> bool {
        matches!(self, Self::Train)
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Eval => "eval",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Self::Train),
            "eval" => Ok(Self::Eval),
            other => Err(format!("unknown mode '{other}', expected 'train' or 'eval'")),
        }
    }
}

/// Shape parameters of the DenseNet gaze regressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Total depth. `(depth - 4)` must be divisible by 3.
    pub depth: usize,
    /// Channels added by every dense layer.
    pub growth_rate: usize,
    /// Layout of the input images and all intermediate feature maps.
    pub data_format: DataFormat,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            depth: 40,
            growth_rate: 12,
            data_format: DataFormat::ChannelsLast,
        }
    }
}

impl NetworkConfig {
    /// Creates a config with the default data format.
    #[must_use]
    pub const fn new(depth: usize, growth_rate: usize) -> Self {
        Self {
            depth,
            growth_rate,
            data_format: DataFormat::ChannelsLast,
        }
    }

    /// Sets the data format.
    #[must_use]
    pub const fn with_data_format(mut self, data_format: DataFormat) -> Self {
        self.data_format = data_format;
        self
    }

    /// Checks the depth arithmetic and the growth rate.
    ///
    /// # Errors
    ///
    /// Returns [`GazeNetError::InvalidConfig`] if `depth < 4`,
    /// `(depth - 4) % 3 != 0`, `growth_rate == 0`, or the channel widths do
    /// not fit in a `usize`.
    pub fn validate(&self) -> Result<(), GazeNetError> {
        self.channel_plan().map(|_| ())
    }

    /// Dense layers per block, `N = (depth - 4) / 3`.
    ///
    /// # Errors
    ///
    /// Returns [`GazeNetError::InvalidConfig`] if the config is invalid.
    pub fn layers_per_block(&self) -> Result<usize, GazeNetError> {
        if self.growth_rate == 0 {
            return Err(GazeNetError::InvalidConfig(
                "growth_rate must be at least 1".to_string(),
            ));
        }
        let Some(block_depth) = self.depth.checked_sub(FIXED_DEPTH) else {
            return Err(GazeNetError::InvalidConfig(format!(
                "depth must be at least {FIXED_DEPTH}, got {}",
                self.depth
            )));
        };
        if block_depth % NUM_BLOCKS != 0 {
            return Err(GazeNetError::InvalidConfig(format!(
                "(depth - 4) must be divisible by 3, got depth {}",
                self.depth
            )));
        }
        Ok(block_depth / NUM_BLOCKS)
    }

    /// Channel widths of every stage.
    ///
    /// # Errors
    ///
    /// Returns [`GazeNetError::InvalidConfig`] if the config is invalid or a
    /// channel width overflows.
    pub fn channel_plan(&self) -> Result<ChannelPlan, GazeNetError> {
        let layers_per_block = self.layers_per_block()?;
        let mut blocks = Vec::with_capacity(NUM_BLOCKS);
        let mut channels = STEM_CHANNELS;

        for index in 1..=NUM_BLOCKS {
            let out_channels = layers_per_block
                .checked_mul(self.growth_rate)
                .and_then(|grown| channels.checked_add(grown))
                .ok_or_else(|| {
                    GazeNetError::InvalidConfig(format!(
                        "network too large: depth {} with growth rate {} overflows the channel count",
                        self.depth, self.growth_rate
                    ))
                })?;
            blocks.push(BlockPlan {
                index,
                in_channels: channels,
                out_channels,
                has_transition: index < NUM_BLOCKS,
                input_size: None,
            });
            channels = out_channels;
        }

        Ok(ChannelPlan {
            layers_per_block,
            growth_rate: self.growth_rate,
            stem_channels: STEM_CHANNELS,
            blocks,
            head_channels: channels,
            head_input_size: None,
        })
    }

    /// Channel plan annotated with the spatial size entering every block.
    ///
    /// # Errors
    ///
    /// Returns [`GazeNetError::InvalidConfig`] if the config is invalid.
    pub fn plan_for_input(&self, height: usize, width: usize) -> Result<ChannelPlan, GazeNetError> {
        let mut plan = self.channel_plan()?;
        let mut size = [height, width];

        for block in &mut plan.blocks {
            block.input_size = Some(size);
            if block.has_transition {
                size = [size[0].div_ceil(2), size[1].div_ceil(2)];
            }
        }
        plan.head_input_size = Some(size);

        Ok(plan)
    }
}

/// Channel and spatial bookkeeping for one dense block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockPlan {
    /// 1-based block index.
    pub index: usize,
    /// Channels entering the block.
    pub in_channels: usize,
    /// Channels leaving the block (the transition keeps the width).
    pub out_channels: usize,
    /// Whether a transition layer follows the block.
    pub has_transition: bool,
    /// `[height, width]` entering the block, when the input size is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_size: Option<[usize; 2]>,
}

/// Channel widths of the whole network, derived from a [`NetworkConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelPlan {
    /// Dense layers per block.
    pub layers_per_block: usize,
    /// Channels added per dense layer.
    pub growth_rate: usize,
    /// Channels after the stem convolution.
    pub stem_channels: usize,
    /// The three dense blocks.
    pub blocks: Vec<BlockPlan>,
    /// Channels entering the regression head.
    pub head_channels: usize,
    /// `[height, width]` entering the head, when the input size is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_input_size: Option<[usize; 2]>,
}

impl ChannelPlan {
    /// Every parameterized layer, in forward order.
    #[must_use]
    pub fn layer_ids(&self) -> Vec<LayerId> {
        let mut ids = vec![LayerId::Stem];
        for block in &self.blocks {
            ids.extend((0..self.layers_per_block).map(|layer| LayerId::Dense {
                block: block.index,
                layer,
            }));
            if block.has_transition {
                ids.push(LayerId::Transition { block: block.index });
            }
        }
        ids.push(LayerId::Head);
        ids
    }

    /// Number of trainable parameters for images with `input_channels` channels.
    ///
    /// Counts convolution and linear weights and biases plus batch-norm scale
    /// and shift. Running statistics are buffers and are not counted.
    ///
    /// # Errors
    ///
    /// Returns [`GazeNetError::InvalidConfig`] if the count overflows a `usize`.
    pub fn parameter_count(&self, input_channels: usize) -> Result<usize, GazeNetError> {
        self.checked_parameter_count(input_channels).ok_or_else(|| {
            GazeNetError::InvalidConfig(format!(
                "network too large: parameter count overflows for {} layers per block at growth rate {}",
                self.layers_per_block, self.growth_rate
            ))
        })
    }

    fn checked_parameter_count(&self, input_channels: usize) -> Option<usize> {
        let conv = |c_in: usize, c_out: usize, kernel: usize| {
            c_in.checked_mul(c_out)?
                .checked_mul(kernel * kernel)?
                .checked_add(c_out)
        };
        let norm = |c: usize| c.checked_mul(2);

        let mut total = conv(input_channels, self.stem_channels, CONV_KERNEL)?;
        for block in &self.blocks {
            total = total.checked_add(self.dense_block_parameters(block.in_channels)?)?;
            if block.has_transition {
                total = total
                    .checked_add(norm(block.out_channels)?)?
                    .checked_add(conv(block.out_channels, block.out_channels, 1)?)?;
            }
        }
        total
            .checked_add(norm(self.head_channels)?)?
            .checked_add(self.head_channels.checked_mul(GAZE_DIMS)?)?
            .checked_add(GAZE_DIMS)
    }

    /// Parameters of one dense block entered with `in_channels` channels.
    ///
    /// Layer `i` sees `c + i * g` channels and holds a batch norm on them plus
    /// a `k x k` convolution to `g` channels, so the block totals
    /// `(2 + k*k*g) * (N*c + g*N*(N-1)/2) + N*g`.
    fn dense_block_parameters(&self, in_channels: usize) -> Option<usize> {
        let layers = self.layers_per_block;
        let growth = self.growth_rate;
        let per_channel = (CONV_KERNEL * CONV_KERNEL).checked_mul(growth)?.checked_add(2)?;
        let triangle = layers.checked_mul(layers.saturating_sub(1))? / 2;
        let channels_seen = layers
            .checked_mul(in_channels)?
            .checked_add(growth.checked_mul(triangle)?)?;
        per_channel
            .checked_mul(channels_seen)?
            .checked_add(layers.checked_mul(growth)?)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NetworkConfig::default();
        assert_eq!(config.depth, 40);
        assert_eq!(config.growth_rate, 12);
        assert_eq!(config.data_format, DataFormat::ChannelsLast);
        assert_eq!(config.layers_per_block().unwrap(), 12);
    }

    #[test]
    fn test_depth_41_rejected() {
        let err = NetworkConfig::new(41, 12).validate().unwrap_err();
        assert!(matches!(err, GazeNetError::InvalidConfig(_)));
        assert!(err.to_string().contains("divisible by 3"));
    }

    #[test]
    fn test_depth_below_fixed_layers_rejected() {
        let err = NetworkConfig::new(3, 12).validate().unwrap_err();
        assert!(err.to_string().contains("at least 4"));
    }

    #[test]
    fn test_depth_4_has_empty_blocks() {
        let plan = NetworkConfig::new(4, 12).channel_plan().unwrap();
        assert_eq!(plan.layers_per_block, 0);
        assert_eq!(plan.head_channels, STEM_CHANNELS);
    }

    #[test]
    fn test_zero_growth_rate_rejected() {
        let err = NetworkConfig::new(40, 0).validate().unwrap_err();
        assert!(err.to_string().contains("growth_rate"));
    }

    #[test]
    fn test_valid_depths() {
        for depth in [4, 7, 10, 13, 40, 100] {
            let n = NetworkConfig::new(depth, 12).layers_per_block().unwrap();
            assert_eq!(n * 3 + 4, depth);
        }
    }

    #[test]
    fn test_channel_plan_depth_40() {
        let plan = NetworkConfig::default().channel_plan().unwrap();
        let widths: Vec<_> = plan
            .blocks
            .iter()
            .map(|b| (b.in_channels, b.out_channels))
            .collect();
        assert_eq!(widths, vec![(16, 160), (160, 304), (304, 448)]);
        assert_eq!(plan.head_channels, 448);
        assert!(plan.blocks[0].has_transition);
        assert!(plan.blocks[1].has_transition);
        assert!(!plan.blocks[2].has_transition);
    }

    #[test]
    fn test_plan_for_input_halves_with_ceiling() {
        let plan = NetworkConfig::default().plan_for_input(36, 60).unwrap();
        let sizes: Vec<_> = plan.blocks.iter().map(|b| b.input_size.unwrap()).collect();
        assert_eq!(sizes, vec![[36, 60], [18, 30], [9, 15]]);
        assert_eq!(plan.head_input_size, Some([9, 15]));

        let odd = NetworkConfig::default().plan_for_input(35, 59).unwrap();
        assert_eq!(odd.blocks[1].input_size, Some([18, 30]));
        assert_eq!(odd.head_input_size, Some([9, 15]));
    }

    #[test]
    fn test_layer_ids_in_forward_order() {
        let plan = NetworkConfig::new(10, 4).channel_plan().unwrap();
        let ids: Vec<String> = plan.layer_ids().iter().map(ToString::to_string).collect();
        assert_eq!(
            ids,
            vec![
                "block_initial",
                "block1.dense_layer.0",
                "block1.dense_layer.1",
                "block1.transition1",
                "block2.dense_layer.0",
                "block2.dense_layer.1",
                "block2.transition2",
                "block3.dense_layer.0",
                "block3.dense_layer.1",
                "regression",
            ]
        );
    }

    #[test]
    fn test_parameter_count_depth_4() {
        // stem 1->16, two transitions on 16 channels, head on 16 channels
        let plan = NetworkConfig::new(4, 12).channel_plan().unwrap();
        let stem = 16 * 9 + 16;
        let transition = 2 * 16 + 16 * 16 + 16;
        let head = 2 * 16 + 16 * 2 + 2;
        assert_eq!(plan.parameter_count(1).unwrap(), stem + 2 * transition + head);
    }

    #[test]
    fn test_parameter_count_depth_7() {
        // one dense layer per block, growth 4: blocks of 16->20, 20->24, 24->28
        let plan = NetworkConfig::new(7, 4).channel_plan().unwrap();
        let dense = |c: usize| 2 * c + c * 4 * 9 + 4;
        let transition = |c: usize| 2 * c + c * c + c;
        let expected = (16 * 9 + 16)
            + dense(16)
            + transition(20)
            + dense(20)
            + transition(24)
            + dense(24)
            + (2 * 28 + 28 * 2 + 2);
        assert_eq!(plan.parameter_count(1).unwrap(), expected);
    }

    #[test]
    fn test_huge_depth_is_rejected_not_overflowed() {
        let config = NetworkConfig::new(usize::MAX - 2, 12);
        assert_eq!((config.depth - 4) % 3, 0);

        let err = config.validate().unwrap_err();
        assert!(matches!(err, GazeNetError::InvalidConfig(_)));
        assert!(err.to_string().contains("network too large"));
        assert!(config.channel_plan().is_err());
        assert!(config.plan_for_input(36, 60).is_err());
    }

    #[test]
    fn test_parameter_count_overflow_is_an_error() {
        // widths fit in a usize but the quadratic parameter count does not
        let config = NetworkConfig::new(3 * (1 << 40) + 4, 1);
        let plan = config.channel_plan().unwrap();
        let err = plan.parameter_count(1).unwrap_err();
        assert!(err.to_string().contains("network too large"));
    }

    #[test]
    fn test_data_format_parse_and_display() {
        assert_eq!("channels_last".parse(), Ok(DataFormat::ChannelsLast));
        assert_eq!("channels_first".parse(), Ok(DataFormat::ChannelsFirst));
        assert!("nhwc".parse::<DataFormat>().is_err());
        assert_eq!(DataFormat::ChannelsFirst.to_string(), "channels_first");
        assert_eq!(DataFormat::ChannelsLast.channel_axis(), 3);
        assert_eq!(DataFormat::ChannelsFirst.spatial_axes(), (2, 3));
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("train".parse(), Ok(Mode::Train));
        assert_eq!("eval".parse(), Ok(Mode::Eval));
        assert!("test".parse::<Mode>().is_err());
        assert!(Mode::default().is_train());
    }

    #[test]
    fn test_config_serializes_snake_case() {
        let json = serde_json::to_string(&NetworkConfig::default()).unwrap();
        assert!(json.contains("\"data_format\":\"channels_last\""));
    }
}
