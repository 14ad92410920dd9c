//! Stable identifiers for runs and layers.

use std::fmt;

use serde::Serialize;
use time::OffsetDateTime;

/// Identifier of one model run, used by a harness to namespace artifacts.
///
/// Created once when the run starts and handed to the model; it never
/// changes for the lifetime of the model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RunIdentifier(String);

impl RunIdentifier {
    /// `"{model_name}_{unix_seconds}"` for the given start time.
    #[must_use]
    pub fn new(model_name: &str, started_at: OffsetDateTime) -> Self {
        Self(format!("{model_name}_{}", started_at.unix_timestamp()))
    }

    /// Identifier for a run starting now.
    #[must_use]
    pub fn now(model_name: &str) -> Self {
        Self::new(model_name, OffsetDateTime::now_utc())
    }

    /// Uses a caller-chosen identifier verbatim.
    #[must_use]
    pub fn custom(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position of a parameterized layer in the network.
///
/// The [`path`](Self::path) doubles as the parameter prefix, so weights
/// stored under `block2.dense_layer.5.conv1.weight` always land in the same
/// layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerId {
    /// Initial 3x3 convolution.
    Stem,
    /// Dense layer `layer` (0-based) of block `block` (1-based).
    Dense {
        /// 1-based block index.
        block: usize,
        /// 0-based layer index within the block.
        layer: usize,
    },
    /// Transition following block `block`.
    Transition {
        /// 1-based block index.
        block: usize,
    },
    /// Normalization, pooling and linear regression.
    Head,
}

impl LayerId {
    /// Parameter prefix of the layer.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Stem => "block_initial".to_string(),
            Self::Dense { block, layer } => format!("block{block}.dense_layer.{layer}"),
            Self::Transition { block } => format!("block{block}.transition{block}"),
            Self::Head => "regression".to_string(),
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl Serialize for LayerId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
