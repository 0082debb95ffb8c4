//! Adaptive post-processing for freshly generated wallpapers
//!
//! Brightness, contrast, saturation, noise and sharpness corrections applied
//! in a fixed order. See [`Pipeline`] for the failure model.

pub mod pipeline;
pub mod stages;

pub use pipeline::{Enhancement, Pipeline, Stage};

use crate::codec::{self, OutputFormat};
use crate::error::EnhanceError;

/// Encoded output of a successful enhancement
#[derive(Debug)]
pub struct EnhancedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub enhancement: Enhancement,
}

/// What the caller should do with the result
#[derive(Debug)]
pub enum Outcome {
    /// Use the enhanced bytes
    Enhanced(EnhancedImage),
    /// Nothing could be applied; keep the original bytes
    PassThrough(Enhancement),
}

impl Outcome {
    pub fn applied(&self) -> bool {
        matches!(self, Outcome::Enhanced(_))
    }
}

/// Decode, enhance and re-encode an image
///
/// Errors only when the input cannot be decoded or the result cannot be
/// encoded; in both cases the caller keeps the original bytes.
pub fn enhance_bytes(data: &[u8], format: OutputFormat) -> Result<Outcome, EnhanceError> {
    let decoded = codec::decode(data)?;
    let enhancement = Pipeline::new().process(decoded.image);

    if !enhancement.applied() {
        tracing::warn!(
            skipped = %enhancement.skip_summary(),
            "No enhancement stage could be applied, keeping original"
        );
        return Ok(Outcome::PassThrough(enhancement));
    }

    let bytes = codec::encode(&enhancement.image, decoded.alpha.as_ref(), format)?;
    tracing::info!(
        width = enhancement.image.width(),
        height = enhancement.image.height(),
        format = format.as_str(),
        bytes = bytes.len(),
        time_ms = enhancement.total_time_ms,
        "Image enhanced"
    );

    Ok(Outcome::Enhanced(EnhancedImage {
        bytes,
        format,
        enhancement,
    }))
}
