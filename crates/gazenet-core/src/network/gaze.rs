//! Gaze direction geometry and the angular error metric.
//!
//! A gaze direction is a `(pitch, yaw)` pair in radians. It maps to the 3-D
//! direction `(cos p * sin y, sin p, cos p * cos y)`.

use candle_core::{DType, Result, Tensor};

const RADIANS_TO_DEGREES: f32 = 180.0 / std::f32::consts::PI;

/// Cosine similarity is kept this far away from +-1 before `acos`.
const SIMILARITY_MARGIN: f32 = 1e-6;

/// Lower bound for vector norms.
const NORM_FLOOR: f32 = 1e-7;

/// Converts `(pitch, yaw)` to a 3-D unit vector.
#[must_use]
pub fn pitchyaw_to_vector([pitch, yaw]: [f32; 2]) -> [f32; 3] {
    let (sin_p, cos_p) = pitch.sin_cos();
    let (sin_y, cos_y) = yaw.sin_cos();
    [cos_p * sin_y, sin_p, cos_p * cos_y]
}

/// Converts a 3-D direction (any length) to `(pitch, yaw)`.
#[must_use]
pub fn vector_to_pitchyaw(v: [f32; 3]) -> [f32; 2] {
    let norm = norm(v).max(NORM_FLOOR);
    let [x, y, z] = v.map(|c| c / norm);
    [y.clamp(-1.0, 1.0).asin(), x.atan2(z)]
}

/// Angle in degrees between two `(pitch, yaw)` directions.
#[must_use]
pub fn angular_error(a: [f32; 2], b: [f32; 2]) -> f32 {
    let a = pitchyaw_to_vector(a);
    let b = pitchyaw_to_vector(b);
    let dot: f32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
    let similarity = dot / (norm(a).max(NORM_FLOOR) * norm(b).max(NORM_FLOOR));
    degrees_from_similarity(similarity)
}

/// Mean of [`angular_error`] over paired slices. Zero for empty input.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_angular_error(a: &[[f32; 2]], b: &[[f32; 2]]) -> f32 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    a.iter()
        .zip(b)
        .map(|(a, b)| angular_error(*a, *b))
        .sum::<f32>()
        / n as f32
}

/// Mean angular error in degrees between `(batch, 2)` pitch/yaw tensors.
///
/// The similarity is computed on the tensors; the final `acos` and mean run
/// on the host, so the result carries no gradient.
///
/// # Errors
///
/// Returns an error if either tensor is not `(batch, 2)` or the batch sizes
/// differ.
#[allow(clippy::cast_precision_loss)]
pub fn angular_error_from_pitchyaw(prediction: &Tensor, target: &Tensor) -> Result<Tensor> {
    let v_pred = pitchyaw_vectors(prediction)?;
    let v_true = pitchyaw_vectors(target)?;

    let dot = v_pred.mul(&v_true)?.sum(1)?;
    let norms = v_pred.sqr()?.sum(1)?.sqrt()?.mul(&v_true.sqr()?.sum(1)?.sqrt()?)?;
    let similarity = dot.div(&norms)?.to_dtype(DType::F32)?.to_vec1::<f32>()?;

    let mean = if similarity.is_empty() {
        0.0
    } else {
        similarity
            .iter()
            .map(|s| degrees_from_similarity(*s))
            .sum::<f32>()
            / similarity.len() as f32
    };

    Tensor::new(mean, prediction.device())?.to_dtype(prediction.dtype())
}

/// `(batch, 2)` pitch/yaw to `(batch, 3)` directions.
fn pitchyaw_vectors(angles: &Tensor) -> Result<Tensor> {
    let (_, dims) = angles.dims2()?;
    if dims != 2 {
        candle_core::bail!("expected (batch, 2) pitch/yaw, got {:?}", angles.dims());
    }
    let pitch = angles.narrow(1, 0, 1)?;
    let yaw = angles.narrow(1, 1, 1)?;
    let (sin_p, cos_p) = (pitch.sin()?, pitch.cos()?);
    let (sin_y, cos_y) = (yaw.sin()?, yaw.cos()?);

    Tensor::cat(&[&cos_p.mul(&sin_y)?, &sin_p, &cos_p.mul(&cos_y)?], 1)
}

fn norm(v: [f32; 3]) -> f32 {
    v.iter().map(|c| c * c).sum::<f32>().sqrt()
}

fn degrees_from_similarity(similarity: f32) -> f32 {
    similarity
        .clamp(-1.0 + SIMILARITY_MARGIN, 1.0 - SIMILARITY_MARGIN)
        .acos()
        * RADIANS_TO_DEGREES
}
