//! Describe command - print the network's channel and spatial plan.

use anyhow::Result;
use clap::Args;
use gazenet_core::{ChannelPlan, LayerId, NetworkConfig};
use serde::Serialize;
use tracing::info;

use super::{InputArgs, NetworkArgs, OutputArgs};
use crate::config::AppConfig;
use crate::output::{JsonOutput, OutputFormat};

/// Arguments for the describe command
#[derive(Args, Clone)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub network: NetworkArgs,

    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Everything `describe` reports.
#[derive(Debug, Serialize)]
pub struct Description {
    pub network: NetworkConfig,
    /// `[height, width, channels]` of the input images.
    pub input: [usize; 3],
    pub plan: ChannelPlan,
    pub layers: Vec<LayerId>,
    pub parameters: usize,
}

impl Description {
    /// Plans the network without creating any parameters.
    pub fn new(network: NetworkConfig, input: [usize; 3]) -> Result<Self> {
        let [height, width, channels] = input;
        let plan = network.plan_for_input(height, width)?;
        let parameters = plan.parameter_count(channels)?;
        let layers = plan.layer_ids();

        Ok(Self {
            network,
            input,
            plan,
            layers,
            parameters,
        })
    }

    fn print_text(&self) {
        let [height, width, channels] = self.input;
        println!(
            "DenseNet depth {} growth rate {} ({})",
            self.network.depth, self.network.growth_rate, self.network.data_format
        );
        println!("  input      {height}x{width}x{channels}");
        println!("  stem       {} channels", self.plan.stem_channels);
        for block in &self.plan.blocks {
            let size = block
                .input_size
                .map_or_else(String::new, |[h, w]| format!(" at {h}x{w}"));
            println!(
                "  block{}     {} -> {} channels{size}, {} layers{}",
                block.index,
                block.in_channels,
                block.out_channels,
                self.plan.layers_per_block,
                if block.has_transition { ", transition" } else { "" }
            );
        }
        let size = self
            .plan
            .head_input_size
            .map_or_else(String::new, |[h, w]| format!(" at {h}x{w}"));
        println!("  regression {} channels{size} -> 2", self.plan.head_channels);
        println!("{} layers, {} parameters", self.layers.len(), self.parameters);
    }
}

/// Run the describe command.
pub fn run(args: &DescribeArgs, config: &AppConfig) -> Result<()> {
    let network = args.network.resolve(config)?;
    let shape = args.input.resolve(None, config);
    info!("Describing depth {} growth rate {}", network.depth, network.growth_rate);

    let description = Description::new(network, [shape.height, shape.width, shape.channels])?;

    match args.output.resolve(config) {
        (OutputFormat::Json, pretty) => JsonOutput::stdout().write(&description, pretty)?,
        (OutputFormat::Text, _) => description.print_text(),
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_description_default_network() {
        let description = Description::new(NetworkConfig::default(), [36, 60, 1]).unwrap();

        assert_eq!(description.layers.len(), 40);
        assert_eq!(description.plan.head_channels, 16 + 3 * 12 * 12);
        assert_eq!(description.plan.head_input_size, Some([9, 15]));
        assert!(description.parameters > 0);
    }

    #[test]
    fn test_description_rejects_bad_depth() {
        let err = Description::new(NetworkConfig::new(41, 12), [36, 60, 1]).unwrap_err();
        assert!(err.to_string().starts_with("invalid network config"));
    }

    #[test]
    fn test_description_rejects_overflowing_network() {
        let wide = NetworkConfig::new(3 * (1 << 40) + 4, 1);
        let err = Description::new(wide, [36, 60, 1]).unwrap_err();
        assert!(err.to_string().contains("network too large"));
    }

    #[test]
    fn test_description_serializes_layer_paths() {
        let description = Description::new(NetworkConfig::new(7, 4), [36, 60, 1]).unwrap();
        let json = serde_json::to_value(&description).unwrap();

        assert_eq!(json["layers"][0], "block_initial");
        assert_eq!(json["layers"][1], "block1.dense_layer.0");
        assert_eq!(json["layers"][2], "block1.transition1");
        assert_eq!(json["network"]["data_format"], "channels_last");
    }
}
