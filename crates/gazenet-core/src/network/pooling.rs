//! Average pooling with same padding, and global average pooling.

use candle_core::{Result, Tensor};

use crate::domain::DataFormat;

/// `(before, after)` padding that keeps `ceil(size / stride)` outputs.
///
/// Odd totals put the extra cell after the input.
#[must_use]
pub const fn same_padding(size: usize, kernel: usize, stride: usize) -> (usize, usize) {
    let out = size.div_ceil(stride);
    let needed = out.saturating_sub(1) * stride + kernel;
    let total = needed.saturating_sub(size);
    (total / 2, total - total / 2)
}

/// Average pooling over a channels-first tensor with same padding.
///
/// Output spatial dims are `ceil(d / stride)`. Padded cells are left out of
/// the average, so a window that hangs over the border averages only the
/// cells it covers.
///
/// # Errors
///
/// Returns an error if `x` is not 4-D.
pub fn avg_pool2d_same(x: &Tensor, kernel: usize, stride: usize) -> Result<Tensor> {
    let (_, _, height, width) = x.dims4()?;
    let (top, bottom) = same_padding(height, kernel, stride);
    let (left, right) = same_padding(width, kernel, stride);

    if top + bottom + left + right == 0 {
        return x.avg_pool2d_with_stride(kernel, stride);
    }

    let pad = |t: &Tensor| -> Result<Tensor> {
        t.pad_with_zeros(2, top, bottom)?
            .pad_with_zeros(3, left, right)
    };

    let pooled = pad(x)?.avg_pool2d_with_stride(kernel, stride)?;
    // Fraction of every window that lies inside the input.
    let coverage = pad(&Tensor::ones((1, 1, height, width), x.dtype(), x.device())?)?
        .avg_pool2d_with_stride(kernel, stride)?;

    pooled.broadcast_div(&coverage)
}

/// Mean over the spatial axes, `(batch, ..)` to `(batch, channels)`.
///
/// # Errors
///
/// Returns an error if `x` is not 4-D.
pub fn global_avg_pool(x: &Tensor, format: DataFormat) -> Result<Tensor> {
    x.dims4()?;
    let (h_axis, w_axis) = format.spatial_axes();
    x.mean(w_axis)?.mean(h_axis)
}
