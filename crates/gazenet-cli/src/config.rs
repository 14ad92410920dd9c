//! Configuration file support for gazenet.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/gazenet/config.toml` (lowest priority)
//! - Project-local: `.gazenet.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use gazenet_core::{DataFormat, Mode, NetworkConfig};
use serde::Deserialize;
use tracing::{debug, info};

/// File name of the project-local config.
pub const PROJECT_CONFIG: &str = ".gazenet.toml";

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Network shape.
    pub network: NetworkSection,
    /// Synthetic input batch.
    pub input: InputSection,
    /// Trained weights.
    pub weights: WeightsSection,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// Network configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkSection {
    /// Total depth, `(depth - 4)` divisible by 3.
    pub depth: Option<usize>,
    /// Channels added per dense layer.
    pub growth_rate: Option<usize>,
    /// "`channels_last`" or "`channels_first`".
    pub data_format: Option<String>,
    /// Batch-norm mode: "train" or "eval".
    pub normalization: Option<String>,
}

/// Input batch configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct InputSection {
    pub batch_size: Option<usize>,
    pub height: Option<usize>,
    pub width: Option<usize>,
    pub channels: Option<usize>,
}

/// Weights configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct WeightsSection {
    /// Weights file path, or a name in the weights directory.
    pub path: Option<PathBuf>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "text" or "json".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/gazenet/config.toml`
    /// 2. Project-local: `.gazenet.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are logged as warnings.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        if let Err(e) = config.validate() {
            eprintln!("warning: {e}");
        }

        config
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), String> {
        if let Some(depth) = self.network.depth {
            let growth_rate = self
                .network
                .growth_rate
                .unwrap_or(NetworkConfig::default().growth_rate);
            NetworkConfig::new(depth, growth_rate)
                .validate()
                .map_err(|e| format!("network: {e}"))?;
        }
        if self.network.growth_rate == Some(0) {
            return Err("network.growth_rate must be at least 1".to_string());
        }
        if let Some(ref f) = self.network.data_format {
            f.parse::<DataFormat>()
                .map_err(|e| format!("network.data_format: {e}"))?;
        }
        if let Some(ref m) = self.network.normalization {
            m.parse::<Mode>()
                .map_err(|e| format!("network.normalization: {e}"))?;
        }

        for (key, value) in [
            ("input.batch_size", self.input.batch_size),
            ("input.height", self.input.height),
            ("input.width", self.input.width),
            ("input.channels", self.input.channels),
        ] {
            if value == Some(0) {
                return Err(format!("{key} must be at least 1"));
            }
        }

        if let Some(ref f) = self.output.format {
            if f != "text" && f != "json" {
                return Err(format!("output.format must be 'text' or 'json', got '{f}'"));
            }
        }

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        self.network.depth = other.network.depth.or(self.network.depth);
        self.network.growth_rate = other.network.growth_rate.or(self.network.growth_rate);
        self.network.data_format = other
            .network
            .data_format
            .or_else(|| self.network.data_format.take());
        self.network.normalization = other
            .network
            .normalization
            .or_else(|| self.network.normalization.take());

        self.input.batch_size = other.input.batch_size.or(self.input.batch_size);
        self.input.height = other.input.height.or(self.input.height);
        self.input.width = other.input.width.or(self.input.width);
        self.input.channels = other.input.channels.or(self.input.channels);

        self.weights.path = other.weights.path.or_else(|| self.weights.path.take());

        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gazenet").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.gazenet.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(PROJECT_CONFIG);
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}
