use crate::error::EnhanceError;
use image::RgbImage;

pub const NAME: &str = "denoise";

/// Narrow enough to only touch pixel-level noise
const BLUR_SIGMA: f32 = 0.3;
const ORIGINAL_WEIGHT: f32 = 0.85;
const BLURRED_WEIGHT: f32 = 0.15;

/// Suppress high-frequency noise by mixing in a lightly blurred copy
pub fn apply(image: &RgbImage) -> Result<RgbImage, EnhanceError> {
    super::ensure_well_formed(NAME, image)?;

    let blurred = super::blurred_samples(NAME, image, BLUR_SIGMA)?;
    let samples = image
        .as_raw()
        .iter()
        .zip(&blurred)
        .map(|(&original, &smooth)| {
            super::quantize(original as f32 * ORIGINAL_WEIGHT + smooth * BLURRED_WEIGHT)
        })
        .collect();

    super::from_samples(NAME, image, samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_uniform_image_is_unchanged() {
        let img = RgbImage::from_pixel(9, 6, Rgb([37, 143, 251]));
        let result = apply(&img).unwrap();
        assert_eq!(result, img);
    }

    #[test]
    fn test_pixel_checkerboard_loses_amplitude() {
        let img = RgbImage::from_fn(10, 10, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });

        let result = apply(&img).unwrap();
        let bright = result.get_pixel(5, 5).0[0];
        let dark = result.get_pixel(5, 6).0[0];

        assert!(bright < 255, "bright cell should be pulled down, got {}", bright);
        assert!(dark > 0, "dark cell should be lifted, got {}", dark);
        // Only a light touch: structure survives
        assert!(bright > 250);
        assert!(dark < 5);
    }

    #[test]
    fn test_preserves_dimensions() {
        let img = RgbImage::from_fn(31, 17, |x, y| Rgb([x as u8 * 8, y as u8 * 15, 90]));
        let result = apply(&img).unwrap();
        assert_eq!(result.dimensions(), (31, 17));
    }
}
