use crate::error::EnhanceError;
use image::RgbImage;

pub const NAME: &str = "saturation";

const GAIN: f32 = 1.08;

/// Rec. 601 luma weights
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// Boost color saturation by 8%
///
/// Each pixel is split into luma and a chroma offset (`channel - luma`); the
/// offset is scaled and luma is left as is, so gray pixels never change.
pub fn apply(image: &RgbImage) -> Result<RgbImage, EnhanceError> {
    super::ensure_well_formed(NAME, image)?;

    let mut samples = Vec::with_capacity(image.as_raw().len());
    for pixel in image.as_raw().chunks_exact(3) {
        let (r, g, b) = (pixel[0] as f32, pixel[1] as f32, pixel[2] as f32);
        let luma = LUMA_R * r + LUMA_G * g + LUMA_B * b;
        for channel in [r, g, b] {
            samples.push(super::quantize(luma + (channel - luma) * GAIN));
        }
    }

    super::from_samples(NAME, image, samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_pure_red_stays_in_range() {
        let img = RgbImage::from_pixel(4, 4, Rgb([255, 0, 0]));
        let result = apply(&img).unwrap();
        // Red overshoots to ~269 and the others undershoot to ~-6; both clamp
        for pixel in result.pixels() {
            assert_eq!(pixel.0, [255, 0, 0]);
        }
    }

    #[test]
    fn test_gray_is_unchanged() {
        for value in [0u8, 1, 64, 128, 200, 255] {
            let img = RgbImage::from_pixel(2, 2, Rgb([value, value, value]));
            let result = apply(&img).unwrap();
            assert_eq!(result, img, "gray {} should not change", value);
        }
    }

    #[test]
    fn test_muted_color_moves_away_from_gray() {
        let img = RgbImage::from_pixel(1, 1, Rgb([150, 100, 100]));
        let result = apply(&img).unwrap();
        let [r, g, b] = result.get_pixel(0, 0).0;
        assert!(r > 150);
        assert!(g < 100);
        assert!(b < 100);
    }

    #[test]
    fn test_preserves_dimensions() {
        let img = RgbImage::new(13, 7);
        let result = apply(&img).unwrap();
        assert_eq!(result.dimensions(), (13, 7));
    }
}
