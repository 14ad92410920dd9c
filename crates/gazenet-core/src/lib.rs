//! GazeNet Core - Gaze regression network and its domain types
//!
//! This crate contains the network configuration and identifiers, the data
//! source port, and the candle implementation of the DenseNet gaze regressor
//! with its MSE loss and angular error metric.

pub mod domain;
pub mod network;
pub mod ports;

pub use domain::{
    ChannelPlan, DataFormat, GazeModel, GazeNetError, LayerId, Mode, ModelOutputs, NetworkConfig,
    RunIdentifier,
};
pub use network::{DenseNetFixed, GazeRegressionNetwork};
pub use ports::{DataSource, TensorBundle};
