//! CLI command definitions and handlers.

pub mod check;
pub mod describe;
pub mod weights;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gazenet_adapters::BatchShape;
use gazenet_core::{DataFormat, NetworkConfig};

use crate::config::AppConfig;
use crate::output::OutputFormat;

/// Default synthetic input: a batch of four 36x60 grayscale eye crops.
mod defaults {
    pub const BATCH_SIZE: usize = 4;
    pub const HEIGHT: usize = 36;
    pub const WIDTH: usize = 60;
    pub const CHANNELS: usize = 1;
}

/// `GazeNet` - DenseNet gaze regression
#[derive(Parser)]
#[command(name = "gazenet")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Print the channel plan, layer identifiers and parameter count
    Describe(describe::DescribeArgs),
    /// Run a synthetic batch through the network and report loss and metric
    Check(check::CheckArgs),
    /// Inspect the local weights directory
    Weights(weights::WeightsArgs),
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}

/// Network shape flags shared by `describe` and `check`.
#[derive(Args, Clone, Default)]
pub struct NetworkArgs {
    /// Network depth; (depth - 4) must be divisible by 3
    #[arg(long)]
    pub depth: Option<usize>,

    /// Channels added by every dense layer
    #[arg(long)]
    pub growth_rate: Option<usize>,

    /// Image layout: `channels_last` or `channels_first`
    #[arg(long, value_name = "FORMAT")]
    pub data_format: Option<DataFormat>,
}

impl NetworkArgs {
    /// CLI flags over config file values over defaults.
    ///
    /// The result is not validated; building the network does that.
    pub fn resolve(&self, config: &AppConfig) -> Result<NetworkConfig> {
        let defaults = NetworkConfig::default();
        let data_format = match (self.data_format, &config.network.data_format) {
            (Some(format), _) => format,
            (None, Some(name)) => name
                .parse()
                .map_err(anyhow::Error::msg)
                .context("Invalid network.data_format in config")?,
            (None, None) => defaults.data_format,
        };

        Ok(NetworkConfig {
            depth: self.depth.or(config.network.depth).unwrap_or(defaults.depth),
            growth_rate: self
                .growth_rate
                .or(config.network.growth_rate)
                .unwrap_or(defaults.growth_rate),
            data_format,
        })
    }
}

/// Input size flags shared by `describe` and `check`.
#[derive(Args, Clone, Default)]
pub struct InputArgs {
    /// Image height in pixels
    #[arg(long, value_parser = parse_positive)]
    pub height: Option<usize>,

    /// Image width in pixels
    #[arg(long, value_parser = parse_positive)]
    pub width: Option<usize>,

    /// Image channels
    #[arg(long, value_parser = parse_positive)]
    pub channels: Option<usize>,
}

impl InputArgs {
    /// Batch shape with CLI flags over config file values over defaults.
    pub fn resolve(&self, batch_size: Option<usize>, config: &AppConfig) -> BatchShape {
        BatchShape {
            batch_size: batch_size
                .or(config.input.batch_size)
                .unwrap_or(defaults::BATCH_SIZE),
            height: self.height.or(config.input.height).unwrap_or(defaults::HEIGHT),
            width: self.width.or(config.input.width).unwrap_or(defaults::WIDTH),
            channels: self
                .channels
                .or(config.input.channels)
                .unwrap_or(defaults::CHANNELS),
        }
    }
}

/// Output flags shared by `describe` and `check`.
#[derive(Args, Clone, Default)]
pub struct OutputArgs {
    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,
}

impl OutputArgs {
    /// Output format and pretty flag, CLI over config.
    pub fn resolve(&self, config: &AppConfig) -> (OutputFormat, bool) {
        let format = self.format.unwrap_or_else(|| {
            match config.output.format.as_deref() {
                Some("json") => OutputFormat::Json,
                _ => OutputFormat::Text,
            }
        });
        (format, self.pretty || config.output.pretty.unwrap_or(false))
    }
}

/// Parse a size that must be at least 1.
fn parse_positive(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid size"))?;
    if value == 0 {
        Err("must be at least 1".to_string())
    } else {
        Ok(value)
    }
}
