//! The DenseNet gaze regressor on candle.
//!
//! Layers are built through a [`candle_nn::VarBuilder`], so the same code
//! path creates fresh parameters from a `VarMap` or loads trained ones from a
//! safetensors file.

mod dense;
mod densenet;
mod device;
mod gaze;
mod head;
mod layout;
mod loader;
mod loss;
mod pooling;

pub use dense::{DenseBlock, DenseLayer, Transition};
pub use densenet::{DenseNetFixed, GazeRegressionNetwork, MODEL_NAME};
pub use device::{select_device, DevicePreference};
pub use gaze::{
    angular_error, angular_error_from_pitchyaw, mean_angular_error, pitchyaw_to_vector,
    vector_to_pitchyaw,
};
pub use head::RegressionHead;
pub use loader::{load_safetensors, save_safetensors};
pub use loss::gaze_mse;
pub use pooling::{avg_pool2d_same, global_avg_pool, same_padding};
