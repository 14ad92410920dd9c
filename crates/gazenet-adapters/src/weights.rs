//! Local storage of trained network weights.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension of weight files.
pub const WEIGHTS_EXTENSION: &str = "safetensors";

/// A weight file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightsFile {
    /// File stem, usable as a name for [`resolve_weights`].
    pub name: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

/// Returns the weights directory path.
///
/// Uses `XDG_DATA_HOME/gazenet/weights` or `~/.local/share/gazenet/weights`.
#[must_use]
pub fn weights_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gazenet")
        .join("weights")
}

/// Lists the weight files in `dir`, sorted by name.
///
/// A missing directory has no weights.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be read.
pub fn list_weights(dir: &Path) -> Result<Vec<WeightsFile>> {
    if !dir.exists() {
        debug!("Weights directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read weights directory: {}", dir.display()))?;

    let mut files: Vec<WeightsFile> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_weights_file(path))
        .filter_map(|path| {
            let name = path.file_stem()?.to_string_lossy().into_owned();
            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or_default();
            Some(WeightsFile { name, path, size })
        })
        .collect();

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// Resolves a weights argument to a file.
///
/// An existing path is used as is; otherwise `name` is looked up in `dir`,
/// with or without the `.safetensors` extension.
///
/// # Errors
///
/// Returns an error if neither the path nor the named file exists.
pub fn resolve_weights(name: &str, dir: &Path) -> Result<PathBuf> {
    let direct = PathBuf::from(name);
    if direct.is_file() {
        return Ok(direct);
    }

    let file = if is_weights_file(&direct) {
        dir.join(name)
    } else {
        dir.join(format!("{name}.{WEIGHTS_EXTENSION}"))
    };
    if file.is_file() {
        debug!("Resolved weights '{name}' to {}", file.display());
        return Ok(file);
    }

    anyhow::bail!(
        "Weights '{name}' not found (looked for {} and {})",
        direct.display(),
        file.display()
    )
}

fn is_weights_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(WEIGHTS_EXTENSION))
}
