//! Individual enhancement stages
//!
//! Every stage reads an RGB buffer and returns a new one of the same size.
//! Arithmetic happens in `f32`; results are rounded and clamped back to 8 bits
//! before the next stage sees them.

pub mod brightness;
pub mod color;
pub mod contrast;
pub mod denoise;
pub mod saturation;
pub mod sharpen;

use crate::error::EnhanceError;
use image::{Rgb32FImage, RgbImage};

/// Round and clamp a working value into the 8-bit channel range
pub(crate) fn quantize(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Reject buffers that no stage can safely operate on
pub(crate) fn ensure_well_formed(stage: &'static str, image: &RgbImage) -> Result<(), EnhanceError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(EnhanceError::Stage {
            stage,
            reason: format!("empty image ({}x{})", width, height),
        });
    }

    let expected = width as usize * height as usize * 3;
    if image.as_raw().len() != expected {
        return Err(EnhanceError::Stage {
            stage,
            reason: format!(
                "buffer holds {} samples, expected {}",
                image.as_raw().len(),
                expected
            ),
        });
    }

    Ok(())
}

/// Apply `f` to every channel sample independently
pub(crate) fn map_samples<F>(
    stage: &'static str,
    image: &RgbImage,
    f: F,
) -> Result<RgbImage, EnhanceError>
where
    F: Fn(f32) -> f32,
{
    ensure_well_formed(stage, image)?;
    let samples = image
        .as_raw()
        .iter()
        .map(|&sample| quantize(f(sample as f32)))
        .collect();
    from_samples(stage, image, samples)
}

/// Gaussian-blurred copy of `image` as unquantized samples on the 0-255 scale
///
/// Blurring in `f32` keeps stages built on it exact no-ops for flat regions.
pub(crate) fn blurred_samples(
    stage: &'static str,
    image: &RgbImage,
    sigma: f32,
) -> Result<Vec<f32>, EnhanceError> {
    let (width, height) = image.dimensions();
    let normalized = image.as_raw().iter().map(|&s| s as f32 / 255.0).collect();
    let working = Rgb32FImage::from_raw(width, height, normalized).ok_or_else(|| {
        EnhanceError::Stage {
            stage,
            reason: "blur buffer does not match image dimensions".to_string(),
        }
    })?;

    let blurred = imageproc::filter::gaussian_blur_f32(&working, sigma);
    Ok(blurred.into_raw().into_iter().map(|s| s * 255.0).collect())
}

/// Rebuild an image with the same dimensions as `like` from raw samples
pub(crate) fn from_samples(
    stage: &'static str,
    like: &RgbImage,
    samples: Vec<u8>,
) -> Result<RgbImage, EnhanceError> {
    let (width, height) = like.dimensions();
    RgbImage::from_raw(width, height, samples).ok_or_else(|| EnhanceError::Stage {
        stage,
        reason: "output buffer does not match image dimensions".to_string(),
    })
}
