//! Data sources that serve eye/gaze batches from memory.

use std::f32::consts::PI;

use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use gazenet_core::domain::{DataFormat, EYE_KEY, GAZE_KEY};
use gazenet_core::ports::{DataSource, TensorBundle};
use tracing::debug;

/// Largest |pitch| and |yaw| produced by [`SyntheticEyeSource`], in radians.
const MAX_ANGLE: f32 = 0.35;
const SCLERA: f32 = 0.85;
const IRIS: f32 = 0.35;
const PUPIL: f32 = 0.05;

/// A data source over tensors already in memory.
pub struct InMemorySource {
    name: String,
    tensors: TensorBundle,
}

impl InMemorySource {
    /// Wraps an arbitrary bundle.
    #[must_use]
    pub fn new(name: impl Into<String>, tensors: TensorBundle) -> Self {
        Self {
            name: name.into(),
            tensors,
        }
    }

    /// Wraps one batch of eye images and gaze targets.
    #[must_use]
    pub fn from_batch(name: impl Into<String>, eye: Tensor, gaze: Tensor) -> Self {
        Self::new(name, TensorBundle::new().with(EYE_KEY, eye).with(GAZE_KEY, gaze))
    }
}

impl DataSource for InMemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_tensors(&self) -> &TensorBundle {
        &self.tensors
    }
}

/// Shape of the batch a [`SyntheticEyeSource`] renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchShape {
    /// Images in the batch.
    pub batch_size: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Image width in pixels.
    pub width: usize,
    /// Channels per pixel. Every channel carries the same grey value.
    pub channels: usize,
}

/// A deterministic batch of rendered eyes.
///
/// Each item is a bright sclera with a dark iris and pupil displaced in the
/// direction of its gaze target. Targets are spread over a fixed range so the
/// same shape always renders the same batch.
pub struct SyntheticEyeSource {
    inner: InMemorySource,
    shape: BatchShape,
}

impl SyntheticEyeSource {
    /// Renders a batch of `shape` in `format` on `device`.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape has a zero dimension or the tensors
    /// cannot be created on `device`.
    pub fn new(shape: BatchShape, format: DataFormat, device: &Device) -> Result<Self> {
        let BatchShape {
            batch_size,
            height,
            width,
            channels,
        } = shape;
        if batch_size == 0 || height == 0 || width == 0 || channels == 0 {
            anyhow::bail!(
                "synthetic batch needs non-zero dimensions, got {batch_size}x{height}x{width}x{channels}"
            );
        }

        let targets: Vec<[f32; 2]> = (0..batch_size).map(|i| gaze_for(i, batch_size)).collect();

        let mut pixels = Vec::with_capacity(batch_size * height * width * channels);
        for &gaze in &targets {
            render_eye(gaze, height, width, channels, &mut pixels);
        }

        let nhwc = Tensor::from_vec(pixels, (batch_size, height, width, channels), device)
            .context("Failed to create synthetic eye images")?;
        let eye = DataFormat::ChannelsLast
            .convert(&nhwc, format)
            .context("Failed to lay out synthetic eye images")?;
        let gaze = Tensor::from_vec(targets.concat(), (batch_size, 2), device)
            .context("Failed to create synthetic gaze targets")?;

        debug!("Rendered synthetic eye batch {:?} ({format})", eye.dims());

        Ok(Self {
            inner: InMemorySource::from_batch("synthetic", eye, gaze),
            shape,
        })
    }

    /// The rendered batch shape.
    #[must_use]
    pub const fn shape(&self) -> BatchShape {
        self.shape
    }
}

impl DataSource for SyntheticEyeSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn output_tensors(&self) -> &TensorBundle {
        self.inner.output_tensors()
    }
}

/// `(pitch, yaw)` for item `index`, walking a circle of radius `MAX_ANGLE`.
#[allow(clippy::cast_precision_loss)]
fn gaze_for(index: usize, batch_size: usize) -> [f32; 2] {
    let turn = 2.0 * PI * index as f32 / batch_size as f32;
    let radius = MAX_ANGLE * (index + 1) as f32 / batch_size as f32;
    [radius * turn.sin(), radius * turn.cos()]
}

#[allow(clippy::cast_precision_loss)]
fn render_eye(
    [pitch, yaw]: [f32; 2],
    height: usize,
    width: usize,
    channels: usize,
    pixels: &mut Vec<f32>,
) {
    let (h, w) = (height as f32, width as f32);
    let iris_radius = h.min(w) / 3.0;
    let pupil_radius = iris_radius / 2.5;
    // Looking up moves the iris towards row 0.
    let cy = h / 2.0 - pitch.sin() * h / 2.0;
    let cx = w / 2.0 + yaw.sin() * w / 2.0;

    for y in 0..height {
        for x in 0..width {
            let dy = y as f32 + 0.5 - cy;
            let dx = x as f32 + 0.5 - cx;
            let distance = dx.hypot(dy);
            let value = if distance < pupil_radius {
                PUPIL
            } else if distance < iris_radius {
                IRIS
            } else {
                SCLERA
            };
            pixels.extend(std::iter::repeat(value).take(channels));
        }
    }
}
