//! Synthetic eye-image batches for testing.

use candle_core::{Device, Result, Tensor};
use gazenet_core::domain::{DataFormat, EYE_KEY, GAZE_KEY};
use gazenet_core::ports::TensorBundle;

/// Pixel pattern of every image in a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pattern {
    /// Every pixel has the same value.
    Uniform(f32),
    /// Alternating 0/1 cells of the given size.
    Checkerboard(usize),
    /// 0 on the left edge rising to 1 on the right.
    HorizontalGradient,
}

impl Pattern {
    #[allow(clippy::cast_precision_loss)]
    fn value(self, y: usize, x: usize, width: usize) -> f32 {
        match self {
            Self::Uniform(v) => v,
            Self::Checkerboard(cell) => {
                let cell = cell.max(1);
                if (x / cell + y / cell) % 2 == 0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::HorizontalGradient => x as f32 / width.saturating_sub(1).max(1) as f32,
        }
    }
}

/// Builder for `(eye, gaze)` batches.
///
/// Images default to 36x60 single-channel `channels_last` checkerboards;
/// gaze targets default to zero.
///
/// ```
/// use gazenet_test_support::{EyeBatchBuilder, Pattern};
///
/// let bundle = EyeBatchBuilder::new(4)
///     .size(18, 30)
///     .pattern(Pattern::HorizontalGradient)
///     .gaze([0.1, -0.2])
///     .bundle()
///     .unwrap();
/// assert_eq!(bundle.get("eye").unwrap().dims(), &[4, 18, 30, 1]);
/// ```
#[derive(Debug, Clone)]
pub struct EyeBatchBuilder {
    batch: usize,
    height: usize,
    width: usize,
    channels: usize,
    format: DataFormat,
    pattern: Pattern,
    gaze: [f32; 2],
}

impl EyeBatchBuilder {
    /// Starts a batch of `batch` images.
    #[must_use]
    pub const fn new(batch: usize) -> Self {
        Self {
            batch,
            height: 36,
            width: 60,
            channels: 1,
            format: DataFormat::ChannelsLast,
            pattern: Pattern::Checkerboard(6),
            gaze: [0.0, 0.0],
        }
    }

    /// Sets the image height and width.
    #[must_use]
    pub const fn size(mut self, height: usize, width: usize) -> Self {
        self.height = height;
        self.width = width;
        self
    }

    /// Sets the channel count; every channel repeats the pattern.
    #[must_use]
    pub const fn channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    /// Sets the memory layout of the images.
    #[must_use]
    pub const fn format(mut self, format: DataFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the pixel pattern.
    #[must_use]
    pub const fn pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Sets the `(pitch, yaw)` target shared by every item.
    #[must_use]
    pub const fn gaze(mut self, gaze: [f32; 2]) -> Self {
        self.gaze = gaze;
        self
    }

    /// The image tensor in the configured layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the tensor cannot be created.
    pub fn images(&self) -> Result<Tensor> {
        let mut pixels = Vec::with_capacity(self.batch * self.height * self.width * self.channels);
        for _ in 0..self.batch {
            for y in 0..self.height {
                for x in 0..self.width {
                    let v = self.pattern.value(y, x, self.width);
                    pixels.extend(std::iter::repeat(v).take(self.channels));
                }
            }
        }
        let nhwc = Tensor::from_vec(
            pixels,
            (self.batch, self.height, self.width, self.channels),
            &Device::Cpu,
        )?;
        DataFormat::ChannelsLast.convert(&nhwc, self.format)
    }

    /// The `(batch, 2)` gaze targets.
    ///
    /// # Errors
    ///
    /// Returns an error if the tensor cannot be created.
    pub fn targets(&self) -> Result<Tensor> {
        let rows: Vec<f32> = (0..self.batch).flat_map(|_| self.gaze).collect();
        Tensor::from_vec(rows, (self.batch, 2), &Device::Cpu)
    }

    /// Images and targets under the `eye` and `gaze` keys.
    ///
    /// # Errors
    ///
    /// Returns an error if either tensor cannot be created.
    pub fn bundle(&self) -> Result<TensorBundle> {
        Ok(TensorBundle::new()
            .with(EYE_KEY, self.images()?)
            .with(GAZE_KEY, self.targets()?))
    }
}
