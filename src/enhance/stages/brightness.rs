use crate::error::EnhanceError;
use image::RgbImage;
use serde::Serialize;

pub const NAME: &str = "brightness";

/// Coarse exposure class derived from mean luminance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BrightnessClass {
    /// mean < 100
    VeryDark,
    /// 100 <= mean < 120
    Dark,
    /// 120 <= mean <= 220
    Normal,
    /// mean > 220
    Bright,
}

impl BrightnessClass {
    pub fn from_mean(mean: f64) -> Self {
        if mean < 100.0 {
            Self::VeryDark
        } else if mean < 120.0 {
            Self::Dark
        } else if mean <= 220.0 {
            Self::Normal
        } else {
            Self::Bright
        }
    }

    /// Multiplicative gain applied to every channel sample
    pub fn factor(&self) -> f32 {
        match self {
            Self::VeryDark => 1.15,
            Self::Dark => 1.08,
            Self::Normal => 1.0,
            Self::Bright => 0.95,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryDark => "very_dark",
            Self::Dark => "dark",
            Self::Normal => "normal",
            Self::Bright => "bright",
        }
    }
}

/// Mean of every channel sample of every pixel
pub fn mean_luminance(image: &RgbImage) -> f64 {
    let samples = image.as_raw();
    if samples.is_empty() {
        return 0.0;
    }
    let sum: u64 = samples.iter().map(|&s| s as u64).sum();
    sum as f64 / samples.len() as f64
}

/// Scale the image towards a comfortable exposure
pub fn apply(image: &RgbImage) -> Result<RgbImage, EnhanceError> {
    super::ensure_well_formed(NAME, image)?;

    let mean = mean_luminance(image);
    let class = BrightnessClass::from_mean(mean);
    let factor = class.factor();
    tracing::debug!(mean, class = class.as_str(), factor, "Brightness classified");

    if class == BrightnessClass::Normal {
        return Ok(image.clone());
    }

    super::map_samples(NAME, image, |sample| sample * factor)
}
