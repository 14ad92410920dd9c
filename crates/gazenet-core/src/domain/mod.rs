//! Core domain types for gaze regression.

mod config;
mod error;
mod gaze_model;
mod identifier;
mod outputs;

pub use config::{
    BlockPlan, ChannelPlan, DataFormat, Mode, NetworkConfig, GAZE_DIMS, NUM_BLOCKS, STEM_CHANNELS,
};
pub use error::{GazeNetError, Result};
pub use gaze_model::GazeModel;
pub use identifier::{LayerId, RunIdentifier};
pub use outputs::{ModelOutputs, EYE_KEY, GAZE_ANGULAR_KEY, GAZE_KEY, GAZE_MSE_KEY};
