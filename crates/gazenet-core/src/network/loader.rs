//! Reading and writing network parameters in safetensors format.

use anyhow::{ensure, Context, Result};
use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use std::path::Path;
use tracing::{debug, info};

/// Loads saved network parameters into a `VarBuilder`.
///
/// Tensor names are the dotted parameter paths the network creates, e.g.
/// `block1.dense_layer.0.conv1.weight`. Half and double precision tensors
/// are converted to `f32` when the network reads them.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if any tensor
/// is not floating point.
pub fn load_safetensors(path: impl AsRef<Path>, device: &Device) -> Result<VarBuilder<'static>> {
    let path = path.as_ref();
    debug!("Loading weights from {}", path.display());

    let tensors = candle_core::safetensors::load(path, device)
        .with_context(|| format!("Failed to load weights file: {}", path.display()))?;

    let mut values = 0;
    for (name, tensor) in &tensors {
        ensure!(
            tensor.dtype().is_float(),
            "Parameter '{name}' in {} has dtype {:?}, expected floating point",
            path.display(),
            tensor.dtype()
        );
        values += tensor.elem_count();
    }

    info!(
        "Loaded {} parameter tensors ({values} values) from {}",
        tensors.len(),
        path.display()
    );
    Ok(VarBuilder::from_tensors(tensors, DType::F32, device))
}

/// Writes every variable in `varmap`, running statistics included.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_safetensors(varmap: &VarMap, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    varmap
        .save(path)
        .with_context(|| format!("Failed to write weights file: {}", path.display()))?;
    info!("Saved weights to {}", path.display());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use safetensors::tensor::TensorView;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn weights_file(dtype: safetensors::Dtype, bytes: &[u8]) -> NamedTempFile {
        let tensor = TensorView::new(dtype, vec![2, 2], bytes).expect("valid tensor view");
        let tensors = HashMap::from([("regression.fc4.weight".to_string(), tensor)]);
        let serialized = safetensors::serialize(&tensors, &None).expect("serialize");

        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(&serialized).expect("write");
        file
    }

    #[test]
    fn test_load_safetensors() {
        let data = [1.0f32, 2.0, 3.0, 4.0];
        let file = weights_file(safetensors::Dtype::F32, bytemuck::cast_slice(&data));
        let vb = load_safetensors(file.path(), &Device::Cpu).unwrap();

        let weight = vb.pp("regression").pp("fc4").get((2, 2), "weight").unwrap();
        assert_eq!(weight.to_vec2::<f32>().unwrap(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert!(!vb.contains_tensor("regression.fc4.bias"));
    }

    #[test]
    fn test_half_precision_weights_read_as_f32() {
        // 1.0, 2.0, 3.0, 4.0 as IEEE half floats
        let data = [0x3C00u16, 0x4000, 0x4200, 0x4400];
        let file = weights_file(safetensors::Dtype::F16, bytemuck::cast_slice(&data));
        let vb = load_safetensors(file.path(), &Device::Cpu).unwrap();

        let weight = vb.get((2, 2), "regression.fc4.weight").unwrap();
        assert_eq!(weight.dtype(), DType::F32);
        assert_eq!(weight.to_vec2::<f32>().unwrap(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_load_safetensors_missing_file() {
        let err = load_safetensors("/nonexistent/path.safetensors", &Device::Cpu).err().unwrap();
        assert!(err.to_string().contains("Failed to load weights file"));
    }

    #[test]
    fn test_integer_tensor_rejected() {
        let data = [1i32, 2, 3, 4];
        let file = weights_file(safetensors::Dtype::I32, bytemuck::cast_slice(&data));
        let err = load_safetensors(file.path(), &Device::Cpu).err().unwrap();
        let message = err.to_string();
        assert!(message.contains("regression.fc4.weight"));
        assert!(message.contains("expected floating point"));
    }
}
