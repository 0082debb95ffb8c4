use crate::error::EnhanceError;
use image::RgbImage;

pub const NAME: &str = "sharpen";

const BLUR_SIGMA: f32 = 0.8;
/// Kept low so photographic wallpapers do not halo
const STRENGTH: f32 = 0.25;

/// Unsharp mask: add back a fraction of the detail lost to a wider blur
pub fn apply(image: &RgbImage) -> Result<RgbImage, EnhanceError> {
    super::ensure_well_formed(NAME, image)?;

    let blurred = super::blurred_samples(NAME, image, BLUR_SIGMA)?;
    let samples = image
        .as_raw()
        .iter()
        .zip(&blurred)
        .map(|(&original, &smooth)| {
            let original = original as f32;
            let detail = original - smooth;
            super::quantize(original + detail * STRENGTH)
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
        let img = RgbImage::from_pixel(12, 8, Rgb([5, 128, 250]));
        let result = apply(&img).unwrap();
        assert_eq!(result, img);
    }

    #[test]
    fn test_sharpen_enhances_edges() {
        // Left half dark, right half light
        let img = RgbImage::from_fn(20, 10, |x, _| {
            if x < 10 {
                Rgb([50, 50, 50])
            } else {
                Rgb([200, 200, 200])
            }
        });

        let result = apply(&img).unwrap();

        let edge_left = result.get_pixel(9, 5).0[0];
        let edge_right = result.get_pixel(10, 5).0[0];
        let original_diff = 200i32 - 50;
        let result_diff = (edge_right as i32 - edge_left as i32).abs();

        assert!(
            result_diff > original_diff,
            "Edge should be enhanced: {} > {}",
            result_diff,
            original_diff
        );
        // Far from the edge nothing changes
        assert_eq!(result.get_pixel(2, 5).0, [50, 50, 50]);
        assert_eq!(result.get_pixel(17, 5).0, [200, 200, 200]);
    }

    #[test]
    fn test_overshoot_is_clamped() {
        let img = RgbImage::from_fn(6, 6, |x, _| {
            if x < 3 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let result = apply(&img).unwrap();
        assert_eq!(result.get_pixel(2, 0).0, [0, 0, 0]);
        assert_eq!(result.get_pixel(3, 0).0, [255, 255, 255]);
    }
}
