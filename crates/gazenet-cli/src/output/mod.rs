//! Output formatting for CLI.

mod json;

use clap::ValueEnum;

pub use json::JsonOutput;

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// A single JSON object
    Json,
}
