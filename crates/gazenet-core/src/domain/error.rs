//! Errors raised while constructing or running the gaze network.

use thiserror::Error;

/// Failure while constructing the network or building its outputs.
///
/// Every variant is fatal to construction; nothing is retried and no partial
/// network is returned.
#[derive(Debug, Error)]
pub enum GazeNetError {
    /// The depth / growth-rate arithmetic does not hold.
    #[error("invalid network config: {0}")]
    InvalidConfig(String),

    /// Incompatible tensor ranks or axes, reported by the tensor library.
    #[error(transparent)]
    ShapeMismatch(#[from] candle_core::Error),

    /// No data source was supplied.
    #[error("no data source supplied")]
    MissingDataSource,

    /// The consumed data source lacks a required tensor.
    #[error("data source '{data_source}' has no '{key}' tensor")]
    MissingTensor {
        /// Name of the data source.
        data_source: String,
        /// The missing key.
        key: String,
    },
}

/// Result alias for the network API.
pub type Result<T, E = GazeNetError> = std::result::Result<T, E>;
