//! GazeNet Adapters - External adapters for gazenet.
//!
//! This crate provides adapters for:
//! - In-memory and synthetic data sources
//! - The local weights directory

#![warn(missing_docs)]

pub mod sources;
pub mod weights;

pub use sources::{BatchShape, InMemorySource, SyntheticEyeSource};
pub use weights::{list_weights, resolve_weights, weights_dir, WeightsFile};
