//! Saved parameters reload into an identical network.

#![allow(clippy::unwrap_used)]

use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use gazenet_core::network::{load_safetensors, save_safetensors};
use gazenet_core::{DataFormat, GazeNetError, GazeRegressionNetwork, Mode, NetworkConfig};
use tempfile::TempDir;

fn eye_batch() -> Tensor {
    Tensor::randn(0f32, 1f32, (2, 18, 30, 1), &Device::Cpu).unwrap()
}

#[test]
fn test_eval_predictions_survive_save_and_load() {
    let config = NetworkConfig::new(7, 4);
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    let trained = GazeRegressionNetwork::new(config, 1, &vb).unwrap();

    // move the running statistics off their 0/1 initial values
    let shifted = (eye_batch() + 5.0).unwrap();
    trained.forward(&shifted, Mode::Train).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gaze.safetensors");
    save_safetensors(&varmap, &path).unwrap();

    let loaded_vb = load_safetensors(&path, &Device::Cpu).unwrap();
    let running_mean = loaded_vb
        .get(16, "block1.dense_layer.0.bn1.running_mean")
        .unwrap()
        .to_vec1::<f32>()
        .unwrap();
    assert!(running_mean.iter().any(|&m| m.abs() > 0.0));
    let loaded = GazeRegressionNetwork::new(config, 1, &loaded_vb).unwrap();

    let eye = eye_batch();
    let expected = trained.forward(&eye, Mode::Eval).unwrap().to_vec2::<f32>().unwrap();
    let actual = loaded.forward(&eye, Mode::Eval).unwrap().to_vec2::<f32>().unwrap();
    assert_eq!(expected, actual);
}

#[test]
fn test_weights_for_smaller_network_are_rejected() {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    GazeRegressionNetwork::new(NetworkConfig::new(7, 4), 1, &vb).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("small.safetensors");
    save_safetensors(&varmap, &path).unwrap();

    let loaded_vb = load_safetensors(&path, &Device::Cpu).unwrap();
    let result = GazeRegressionNetwork::new(NetworkConfig::new(10, 4), 1, &loaded_vb);
    assert!(matches!(result, Err(GazeNetError::ShapeMismatch(_))));
}

#[test]
fn test_parameter_names_follow_layer_paths() {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    let config = NetworkConfig::new(7, 4).with_data_format(DataFormat::ChannelsFirst);
    GazeRegressionNetwork::new(config, 1, &vb).unwrap();

    let data = varmap.data().lock().unwrap();
    for name in [
        "block_initial.conv0.weight",
        "block1.dense_layer.0.bn1.weight",
        "block1.dense_layer.0.conv1.weight",
        "block1.transition1.conv1.weight",
        "block2.transition2.bn1.running_mean",
        "block3.dense_layer.0.conv1.bias",
        "regression.bnlast.bias",
        "regression.fc4.weight",
    ] {
        assert!(data.contains_key(name), "missing {name}");
    }
    assert!(!data.keys().any(|name| name.starts_with("block3.transition")));
}
