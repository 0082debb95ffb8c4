use crate::error::EnhanceError;
use image::{DynamicImage, RgbImage};

pub const NAME: &str = "color";

/// Normalize any decoded layout (gray, gray+alpha, RGBA, 16-bit, float) to 8-bit RGB
/// Alpha is dropped here; the codec keeps its own copy for re-attachment
pub fn apply(image: &DynamicImage) -> Result<RgbImage, EnhanceError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(EnhanceError::Stage {
            stage: NAME,
            reason: format!("empty image ({}x{})", image.width(), image.height()),
        });
    }
    Ok(image.to_rgb8())
}
