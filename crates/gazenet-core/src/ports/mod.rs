//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the domain core and external adapters.

mod data_source;

pub use data_source::{DataSource, TensorBundle};
