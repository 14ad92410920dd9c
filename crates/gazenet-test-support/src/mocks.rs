//! Mock implementations of core port traits.

use std::sync::{Arc, Mutex, PoisonError};

use gazenet_core::ports::{DataSource, TensorBundle};

/// Mock implementation of `DataSource` for testing.
///
/// Serves a fixed bundle and counts how often it was read.
pub struct MockDataSource {
    name: String,
    tensors: TensorBundle,
    access_count: Arc<Mutex<usize>>,
}

impl MockDataSource {
    /// Creates a mock source serving `tensors`.
    #[must_use]
    pub fn new(name: impl Into<String>, tensors: TensorBundle) -> Self {
        Self {
            name: name.into(),
            tensors,
            access_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Creates a source with no tensors.
    #[must_use]
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, TensorBundle::new())
    }

    /// Returns the number of times the tensors were read.
    #[must_use]
    pub fn access_count(&self) -> usize {
        *self
            .access_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl DataSource for MockDataSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_tensors(&self) -> &TensorBundle {
        if let Ok(mut c) = self.access_count.lock() {
            *c += 1;
        }
        &self.tensors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_data_source_empty() {
        let source = MockDataSource::empty("validation");
        assert_eq!(source.name(), "validation");
        assert_eq!(source.access_count(), 0);
        assert!(source.output_tensors().is_empty());
        assert_eq!(source.access_count(), 1);
    }
}
