//! Data source port: named tensor bundles fed to the model.

use std::collections::BTreeMap;

use candle_core::Tensor;

/// Named tensors produced by a data source for one batch.
#[derive(Debug, Clone, Default)]
pub struct TensorBundle {
    tensors: BTreeMap<String, Tensor>,
}

impl TensorBundle {
    /// Creates an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tensor, consuming and returning the bundle.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, tensor: Tensor) -> Self {
        self.insert(key, tensor);
        self
    }

    /// Adds or replaces a tensor.
    pub fn insert(&mut self, key: impl Into<String>, tensor: Tensor) -> Option<Tensor> {
        self.tensors.insert(key.into(), tensor)
    }

    /// Looks up a tensor by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Tensor> {
        self.tensors.get(key)
    }

    /// Returns true if the bundle holds `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.tensors.contains_key(key)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    /// Number of tensors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Returns true if the bundle is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }
}

/// Port for supplying batches to a model.
///
/// Implementations expose at least `"eye"` (images) and `"gaze"` (targets).
pub trait DataSource: Send + Sync {
    /// Name of the source, used in error messages.
    fn name(&self) -> &str;

    /// Tensors of the current batch.
    fn output_tensors(&self) -> &TensorBundle;
}
