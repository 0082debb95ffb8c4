//! `enhance` subcommand: enhance wallpaper files on disk

use crate::codec::{self, OutputFormat};
use crate::enhance::{self, Outcome};
use crate::error::EnhanceError;
use std::path::{Path, PathBuf};

#[derive(clap::Args, Debug)]
pub struct EnhanceArgs {
    /// Images to enhance (typically one per display)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output path (only with a single input; defaults to <stem>_enhanced.<ext>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format: jpeg or png (defaults to the output extension, else jpeg)
    #[arg(long)]
    pub format: Option<OutputFormat>,
}

/// What happened to one input file
#[derive(Debug, PartialEq, Eq)]
pub enum FileOutcome {
    Enhanced(PathBuf),
    /// Nothing was written; carries why each stage was skipped
    KeptOriginal(String),
}

/// Enhance every input concurrently; fails if any input was left unenhanced
pub async fn run(args: EnhanceArgs) -> anyhow::Result<()> {
    if args.output.is_some() && args.inputs.len() > 1 {
        anyhow::bail!("--output can only be used with a single input");
    }

    let total = args.inputs.len();
    let jobs = args.inputs.into_iter().map(|input| {
        let format = resolve_format(args.format, args.output.as_deref());
        let output = args
            .output
            .clone()
            .unwrap_or_else(|| default_output(&input, format));

        tokio::task::spawn_blocking(move || {
            let result = enhance_file(&input, &output, format);
            (input, result)
        })
    });

    let mut failed = 0;
    for joined in futures::future::join_all(jobs).await {
        match joined {
            Ok((input, Ok(FileOutcome::Enhanced(output)))) => {
                tracing::info!(
                    "Enhanced {} -> {}",
                    input.display(),
                    output.display()
                );
            }
            Ok((input, Ok(FileOutcome::KeptOriginal(reasons)))) => {
                failed += 1;
                tracing::warn!("Kept original for {} ({})", input.display(), reasons);
            }
            Ok((input, Err(err))) => {
                failed += 1;
                tracing::error!("Could not enhance {}: {}", input.display(), err);
            }
            Err(err) => {
                failed += 1;
                tracing::error!("Enhancement task failed: {}", err);
            }
        }
    }

    tracing::info!("Enhanced {}/{} images", total - failed, total);

    if failed > 0 {
        anyhow::bail!("{} of {} images could not be enhanced", failed, total);
    }
    Ok(())
}

/// Enhance one file; nothing is written unless enhancement succeeded
pub fn enhance_file(
    input: &Path,
    output: &Path,
    format: OutputFormat,
) -> Result<FileOutcome, EnhanceError> {
    let data = std::fs::read(input).map_err(|e| EnhanceError::io(input, e))?;

    match enhance::enhance_bytes(&data, format)? {
        Outcome::Enhanced(enhanced) => {
            codec::write_atomic(output, &enhanced.bytes)?;
            Ok(FileOutcome::Enhanced(output.to_path_buf()))
        }
        Outcome::PassThrough(enhancement) => {
            Ok(FileOutcome::KeptOriginal(enhancement.skip_summary()))
        }
    }
}

fn resolve_format(explicit: Option<OutputFormat>, output: Option<&Path>) -> OutputFormat {
    explicit
        .or_else(|| output.and_then(OutputFormat::from_path))
        .unwrap_or_default()
}

/// `/queue/wallpaper_display_1.png` -> `/queue/wallpaper_display_1_enhanced.jpg`
fn default_output(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("wallpaper");
    input.with_file_name(format!("{}_enhanced.{}", stem, format.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_default_output_sits_next_to_input() {
        let out = default_output(
            Path::new("/queue/wallpaper_display_1.png"),
            OutputFormat::Jpeg,
        );
        assert_eq!(out, PathBuf::from("/queue/wallpaper_display_1_enhanced.jpg"));
    }

    #[test]
    fn test_format_resolution_order() {
        assert_eq!(
            resolve_format(Some(OutputFormat::Png), Some(Path::new("a.jpg"))),
            OutputFormat::Png
        );
        assert_eq!(
            resolve_format(None, Some(Path::new("a.png"))),
            OutputFormat::Png
        );
        assert_eq!(resolve_format(None, None), OutputFormat::Jpeg);
    }

    #[test]
    fn test_enhance_file_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("display_1.png");
        let output = dir.path().join("display_1_enhanced.jpg");
        RgbImage::from_fn(32, 18, |x, y| Rgb([x as u8 * 7, y as u8 * 13, 100]))
            .save(&input)
            .unwrap();

        let outcome = enhance_file(&input, &output, OutputFormat::Jpeg).unwrap();

        assert_eq!(outcome, FileOutcome::Enhanced(output.clone()));
        let written = image::open(&output).unwrap();
        assert_eq!((written.width(), written.height()), (32, 18));
    }

    #[test]
    fn test_corrupt_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.png");
        let output = dir.path().join("broken_enhanced.jpg");
        std::fs::write(&input, b"\x89PNG truncated").unwrap();

        let err = enhance_file(&input, &output, OutputFormat::Jpeg).unwrap_err();

        assert!(matches!(err, EnhanceError::Decode(_)));
        assert!(!output.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = enhance_file(
            &dir.path().join("nope.png"),
            &dir.path().join("out.jpg"),
            OutputFormat::Jpeg,
        )
        .unwrap_err();
        assert!(matches!(err, EnhanceError::Io { .. }));
    }
}
