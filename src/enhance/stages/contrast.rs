use crate::error::EnhanceError;
use image::RgbImage;

pub const NAME: &str = "contrast";

const MIDPOINT: f32 = 128.0;
const GAIN: f32 = 1.05;

/// Stretch every channel away from mid-gray by a fixed 5%
pub fn apply(image: &RgbImage) -> Result<RgbImage, EnhanceError> {
    super::map_samples(NAME, image, |sample| MIDPOINT + (sample - MIDPOINT) * GAIN)
}
