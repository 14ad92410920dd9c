//! Test support utilities for gazenet.
//!
//! Provides eye-batch builders and mock data sources for testing the
//! network and the commands that drive it.
//!
//! # Example
//!
//! ```
//! use gazenet_test_support::{EyeBatchBuilder, MockDataSource};
//!
//! let bundle = EyeBatchBuilder::new(4).gaze([0.1, 0.2]).bundle().unwrap();
//! let source = MockDataSource::new("train", bundle);
//! ```

mod builders;
mod mocks;

pub use builders::{EyeBatchBuilder, Pattern};
pub use mocks::MockDataSource;
