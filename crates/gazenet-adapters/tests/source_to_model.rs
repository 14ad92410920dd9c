//! Data sources feeding the gaze model end to end.

#![allow(clippy::unwrap_used)]

use candle_core::{DType, Device};
use candle_nn::{Optimizer, VarBuilder, VarMap, SGD};
use gazenet_adapters::{BatchShape, InMemorySource, SyntheticEyeSource};
use gazenet_core::domain::{EYE_KEY, GAZE_ANGULAR_KEY, GAZE_KEY, GAZE_MSE_KEY};
use gazenet_core::network::MODEL_NAME;
use gazenet_core::ports::DataSource;
use gazenet_core::{DataFormat, DenseNetFixed, GazeModel, Mode, NetworkConfig, RunIdentifier};
use gazenet_test_support::{EyeBatchBuilder, MockDataSource};

const SHAPE: BatchShape = BatchShape {
    batch_size: 4,
    height: 36,
    width: 60,
    channels: 1,
};

fn model(varmap: &VarMap, format: DataFormat) -> DenseNetFixed {
    let vb = VarBuilder::from_varmap(varmap, DType::F32, &Device::Cpu);
    DenseNetFixed::new(
        NetworkConfig::new(7, 4).with_data_format(format),
        SHAPE.channels,
        RunIdentifier::now(MODEL_NAME),
        &vb,
    )
    .unwrap()
}

#[test]
fn test_synthetic_source_through_model() {
    let varmap = VarMap::new();
    let model = model(&varmap, DataFormat::ChannelsLast);
    let source = SyntheticEyeSource::new(SHAPE, DataFormat::ChannelsLast, &Device::Cpu).unwrap();

    let outputs = model.build_model(&[&source], Mode::Train).unwrap();

    assert_eq!(outputs.gaze().unwrap().dims(), &[4, 2]);
    assert!(outputs.loss_value(GAZE_MSE_KEY).unwrap().unwrap() >= 0.0);
    assert!(outputs.metric_value(GAZE_ANGULAR_KEY).unwrap().unwrap() >= 0.0);
    assert!(model.identifier().as_str().starts_with("DenseNetFixed_"));
}

#[test]
fn test_only_first_source_is_read() {
    let varmap = VarMap::new();
    let model = model(&varmap, DataFormat::ChannelsLast);
    let first = MockDataSource::new("train", EyeBatchBuilder::new(2).bundle().unwrap());
    let second = MockDataSource::new("validation", EyeBatchBuilder::new(2).bundle().unwrap());

    model.build_model(&[&first, &second], Mode::Eval).unwrap();

    assert!(first.access_count() >= 1);
    assert_eq!(second.access_count(), 0);
}

#[test]
fn test_channels_first_source() {
    let varmap = VarMap::new();
    let model = model(&varmap, DataFormat::ChannelsFirst);
    let source = SyntheticEyeSource::new(SHAPE, DataFormat::ChannelsFirst, &Device::Cpu).unwrap();

    let outputs = model.build_model(&[&source], Mode::Eval).unwrap();
    assert_eq!(outputs.gaze().unwrap().dims(), &[4, 2]);
}

#[test]
fn test_perfect_prediction_has_zero_loss() {
    let varmap = VarMap::new();
    let model = model(&varmap, DataFormat::ChannelsLast);
    let eye = EyeBatchBuilder::new(3).images().unwrap();

    let prediction = model.network().forward(&eye, Mode::Eval).unwrap();
    let source = InMemorySource::from_batch("echo", eye, prediction);
    let outputs = model.build_model(&[&source], Mode::Eval).unwrap();

    assert!(outputs.loss_value(GAZE_MSE_KEY).unwrap().unwrap().abs() < 1e-10);
    assert!(outputs.metric_value(GAZE_ANGULAR_KEY).unwrap().unwrap() < 0.1);
}

#[test]
fn test_sgd_steps_reduce_loss() {
    let varmap = VarMap::new();
    let model = model(&varmap, DataFormat::ChannelsLast);
    let source = SyntheticEyeSource::new(SHAPE, DataFormat::ChannelsLast, &Device::Cpu).unwrap();
    let mut optimizer = SGD::new(varmap.all_vars(), 0.01).unwrap();

    let loss = |model: &DenseNetFixed| {
        let outputs = model.build_model(&[&source], Mode::Train).unwrap();
        outputs.loss_terms.get(GAZE_MSE_KEY).unwrap().clone()
    };

    let initial = loss(&model).to_scalar::<f32>().unwrap();
    for _ in 0..5 {
        optimizer.backward_step(&loss(&model)).unwrap();
    }
    let trained = loss(&model).to_scalar::<f32>().unwrap();

    assert!(trained < initial, "{trained} >= {initial}");
}

#[test]
fn test_source_keys() {
    let source = SyntheticEyeSource::new(SHAPE, DataFormat::ChannelsLast, &Device::Cpu).unwrap();
    let keys: Vec<&str> = source.output_tensors().keys().collect();
    assert_eq!(keys, [EYE_KEY, GAZE_KEY]);
}
