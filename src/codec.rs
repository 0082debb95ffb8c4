//! Decoding, encoding and persisting wallpaper images

use crate::error::EnhanceError;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage, RgbImage};
use jpeg_encoder::{ColorType, Encoder as JpegEncoder};
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// Quality used for every JPEG we write
pub const JPEG_QUALITY: u8 = 95;

/// Output container for enhanced images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 2] = [OutputFormat::Jpeg, OutputFormat::Png];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Pick the format from a file extension, if it is one we write
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            other => Err(format!("unsupported output format '{}'", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded image plus the alpha plane it arrived with, if any
pub struct Decoded {
    pub image: DynamicImage,
    pub alpha: Option<GrayImage>,
}

/// Decode raw bytes in any format the `image` crate recognizes
pub fn decode(data: &[u8]) -> Result<Decoded, EnhanceError> {
    if data.is_empty() {
        return Err(EnhanceError::Decode("input is empty".to_string()));
    }

    let image = image::load_from_memory(data)
        .map_err(|e| EnhanceError::Decode(format!("Failed to decode image: {}", e)))?;

    if image.width() == 0 || image.height() == 0 {
        return Err(EnhanceError::Decode(format!(
            "image has no pixels ({}x{})",
            image.width(),
            image.height()
        )));
    }

    tracing::debug!(
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "Image decoded"
    );

    let alpha = extract_alpha(&image);
    Ok(Decoded { image, alpha })
}

fn extract_alpha(image: &DynamicImage) -> Option<GrayImage> {
    if !image.color().has_alpha() {
        return None;
    }
    let rgba = image.to_rgba8();
    Some(GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        Luma([rgba.get_pixel(x, y).0[3]])
    }))
}

/// Encode an RGB image
///
/// JPEG has no alpha channel, so `alpha` is only re-attached for PNG output.
pub fn encode(
    image: &RgbImage,
    alpha: Option<&GrayImage>,
    format: OutputFormat,
) -> Result<Vec<u8>, EnhanceError> {
    let mut buf = Vec::new();

    match format {
        OutputFormat::Jpeg => encode_jpeg(image, &mut buf)?,
        OutputFormat::Png => {
            let encoder = PngEncoder::new(&mut buf);
            let result = match alpha.filter(|a| a.dimensions() == image.dimensions()) {
                Some(alpha) => with_alpha(image, alpha).write_with_encoder(encoder),
                None => image.write_with_encoder(encoder),
            };
            result.map_err(|e| EnhanceError::Encode(format!("PNG encoding failed: {}", e)))?;
        }
    }

    Ok(buf)
}

/// Progressive JPEG at [`JPEG_QUALITY`] with per-image Huffman tables
fn encode_jpeg(image: &RgbImage, buf: &mut Vec<u8>) -> Result<(), EnhanceError> {
    let (width, height) = image.dimensions();
    let too_large = || {
        EnhanceError::Encode(format!(
            "{}x{} exceeds the JPEG dimension limit of {}",
            width,
            height,
            u16::MAX
        ))
    };
    let width = u16::try_from(width).map_err(|_| too_large())?;
    let height = u16::try_from(height).map_err(|_| too_large())?;

    let mut encoder = JpegEncoder::new(buf, JPEG_QUALITY);
    encoder.set_progressive(true);
    encoder.set_optimized_huffman_tables(true);
    encoder
        .encode(image.as_raw(), width, height, ColorType::Rgb)
        .map_err(|e| EnhanceError::Encode(format!("JPEG encoding failed: {}", e)))
}

fn with_alpha(image: &RgbImage, alpha: &GrayImage) -> RgbaImage {
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        Rgba([r, g, b, alpha.get_pixel(x, y).0[0]])
    })
}

/// Write `bytes` to `path` without ever exposing a partial file
///
/// Data goes to a temporary file in the destination directory first and is
/// renamed into place once fully flushed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), EnhanceError> {
    if bytes.is_empty() {
        return Err(EnhanceError::Encode(format!(
            "refusing to write empty output to {}",
            path.display()
        )));
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp_file = tempfile::Builder::new()
        .prefix(".enhance-")
        .tempfile_in(dir)
        .map_err(|e| EnhanceError::io(dir, e))?;

    temp_file
        .write_all(bytes)
        .map_err(|e| EnhanceError::io(temp_file.path(), e))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| EnhanceError::io(temp_file.path(), e))?;

    temp_file
        .persist(path)
        .map_err(|e| EnhanceError::io(path, e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_format_parsing() {
        assert_eq!("JPG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("jpeg".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("png".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert!("gif".parse::<OutputFormat>().is_err());
        assert_eq!(
            OutputFormat::from_path(Path::new("/tmp/wall.PNG")),
            Some(OutputFormat::Png)
        );
        assert_eq!(OutputFormat::from_path(Path::new("/tmp/wall")), None);
    }

    #[test]
    fn test_decode_rejects_empty_and_garbage() {
        assert!(matches!(decode(&[]), Err(EnhanceError::Decode(_))));
        assert!(matches!(
            decode(&[0x89, b'P', b'N', b'G', 0, 0]),
            Err(EnhanceError::Decode(_))
        ));
    }

    #[test]
    fn test_alpha_survives_png_round_trip() {
        let rgba = RgbaImage::from_fn(4, 4, |x, _| Rgba([200, 100, 50, (x * 60) as u8]));
        let mut png = Vec::new();
        rgba.write_with_encoder(PngEncoder::new(&mut png)).unwrap();

        let decoded = decode(&png).unwrap();
        let alpha = decoded.alpha.expect("alpha plane should be kept");
        let rgb = decoded.image.to_rgb8();

        let out = encode(&rgb, Some(&alpha), OutputFormat::Png).unwrap();
        let back = image::load_from_memory(&out).unwrap().to_rgba8();
        assert_eq!(back.get_pixel(3, 0).0[3], 180);
        assert_eq!(back.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn test_jpeg_output_drops_alpha() {
        let rgb = RgbImage::from_pixel(8, 8, Rgb([10, 20, 30]));
        let alpha = GrayImage::from_pixel(8, 8, Luma([0]));
        let out = encode(&rgb, Some(&alpha), OutputFormat::Jpeg).unwrap();
        let back = image::load_from_memory(&out).unwrap();
        assert!(!back.color().has_alpha());
        assert_eq!((back.width(), back.height()), (8, 8));
    }

    #[test]
    fn test_jpeg_output_is_progressive() {
        let rgb = RgbImage::from_fn(32, 24, |x, y| Rgb([x as u8 * 8, y as u8 * 10, 120]));
        let out = encode(&rgb, None, OutputFormat::Jpeg).unwrap();

        // SOF2 marks a progressive DCT frame; SOF0 would be baseline
        assert!(out.windows(2).any(|w| w == [0xFF, 0xC2]));
        assert!(!out.windows(2).any(|w| w == [0xFF, 0xC0]));

        let back = image::load_from_memory(&out).unwrap().to_rgb8();
        assert_eq!(back.dimensions(), (32, 24));
        let [r, g, b] = back.get_pixel(16, 12).0;
        let [er, eg, eb] = rgb.get_pixel(16, 12).0;
        // Quality 95 stays close to the source
        assert!((r as i32 - er as i32).abs() <= 8);
        assert!((g as i32 - eg as i32).abs() <= 8);
        assert!((b as i32 - eb as i32).abs() <= 8);
    }

    #[test]
    fn test_write_atomic_leaves_only_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("wallpaper.jpg");

        write_atomic(&target, b"payload").unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"payload");
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_write_atomic_refuses_empty_payload() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("wallpaper.jpg");

        assert!(write_atomic(&target, &[]).is_err());
        assert!(!target.exists());
    }
}
