//! Check command - run a synthetic batch through the network.

use anyhow::{Context, Result};
use candle_core::DType;
use candle_nn::{VarBuilder, VarMap};
use clap::Args;
use gazenet_adapters::{resolve_weights, weights_dir, SyntheticEyeSource};
use gazenet_core::domain::{GAZE_ANGULAR_KEY, GAZE_MSE_KEY};
use gazenet_core::network::{load_safetensors, select_device, DevicePreference, MODEL_NAME};
use gazenet_core::{DataFormat, DenseNetFixed, GazeModel, Mode, RunIdentifier};
use serde::Serialize;
use tracing::{debug, info};

use super::{InputArgs, NetworkArgs, OutputArgs};
use crate::config::AppConfig;
use crate::output::{JsonOutput, OutputFormat};

/// Arguments for the check command
#[derive(Args, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub network: NetworkArgs,

    #[command(flatten)]
    pub input: InputArgs,

    /// Images per batch
    #[arg(long, value_parser = super::parse_positive)]
    pub batch_size: Option<usize>,

    /// Batch-norm statistics: train (batch) or eval (running)
    #[arg(long)]
    pub mode: Option<Mode>,

    /// Weights file, or a name in the weights directory
    #[arg(long, value_name = "FILE")]
    pub weights: Option<String>,

    /// Run identifier (default: DenseNetFixed_<unix seconds>)
    #[arg(long)]
    pub run_id: Option<String>,

    /// Run on the CPU even when an accelerator is available
    #[arg(long)]
    pub cpu: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Result of one synthetic forward pass.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub run_id: RunIdentifier,
    pub depth: usize,
    pub growth_rate: usize,
    pub data_format: DataFormat,
    pub mode: Mode,
    /// Weights file, or `None` for fresh parameters.
    pub weights: Option<String>,
    pub prediction_shape: Vec<usize>,
    pub gaze_mse: f32,
    pub gaze_angular: f32,
}

impl CheckReport {
    fn print_text(&self) {
        println!("run        {}", self.run_id);
        println!(
            "network    depth {} growth rate {} ({})",
            self.depth, self.growth_rate, self.data_format
        );
        println!("mode       {}", self.mode);
        println!(
            "weights    {}",
            self.weights.as_deref().unwrap_or("fresh initialization")
        );
        println!("prediction {:?}", self.prediction_shape);
        println!("gaze_mse     {:.6}", self.gaze_mse);
        println!("gaze_angular {:.4} deg", self.gaze_angular);
    }
}

/// Run the check command and print its report.
pub fn run(args: &CheckArgs, config: &AppConfig) -> Result<()> {
    let report = check(args, config)?;
    match args.output.resolve(config) {
        (OutputFormat::Json, pretty) => JsonOutput::stdout().write(&report, pretty)?,
        (OutputFormat::Text, _) => report.print_text(),
    }
    Ok(())
}

/// Build the network, feed it the synthetic batch and collect loss and metric.
pub fn check(args: &CheckArgs, config: &AppConfig) -> Result<CheckReport> {
    let network = args.network.resolve(config)?;
    let shape = args.input.resolve(args.batch_size, config);
    let mode = match (args.mode, &config.network.normalization) {
        (Some(mode), _) => mode,
        (None, Some(name)) => name
            .parse()
            .map_err(anyhow::Error::msg)
            .context("Invalid network.normalization in config")?,
        (None, None) => Mode::default(),
    };
    let identifier = args
        .run_id
        .clone()
        .map_or_else(|| RunIdentifier::now(MODEL_NAME), RunIdentifier::custom);

    info!("Checking {identifier} in {mode} mode");

    let device = select_device(if args.cpu {
        DevicePreference::Cpu
    } else {
        DevicePreference::Accelerator
    });
    let varmap = VarMap::new();
    let weights = args
        .weights
        .clone()
        .or_else(|| {
            config
                .weights
                .path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned())
        })
        .map(|name| resolve_weights(&name, &weights_dir()))
        .transpose()?;

    let vb = match &weights {
        Some(path) => load_safetensors(path, &device)?,
        None => {
            debug!("Using fresh parameters");
            VarBuilder::from_varmap(&varmap, DType::F32, &device)
        }
    };

    let model = DenseNetFixed::new(network, shape.channels, identifier, &vb)?;
    let source = SyntheticEyeSource::new(shape, network.data_format, &device)?;
    let outputs = model.build_model(&[&source], mode)?;

    let prediction_shape = outputs
        .gaze()
        .map(|t| t.dims().to_vec())
        .context("Model produced no gaze prediction")?;
    let gaze_mse = outputs
        .loss_value(GAZE_MSE_KEY)?
        .context("Model produced no gaze_mse loss")?;
    let gaze_angular = outputs
        .metric_value(GAZE_ANGULAR_KEY)?
        .context("Model produced no gaze_angular metric")?;

    Ok(CheckReport {
        run_id: model.identifier().clone(),
        depth: network.depth,
        growth_rate: network.growth_rate,
        data_format: network.data_format,
        mode,
        weights: weights.map(|p| p.display().to_string()),
        prediction_shape,
        gaze_mse,
        gaze_angular,
    })
}
