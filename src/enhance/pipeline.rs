use crate::error::EnhanceError;
use image::{DynamicImage, RgbImage};
use serde::Serialize;
use std::time::Instant;

use super::stages;

/// Enhancement stages in the order they always run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Color,
    Brightness,
    Contrast,
    Saturation,
    Denoise,
    Sharpen,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Color,
        Stage::Brightness,
        Stage::Contrast,
        Stage::Saturation,
        Stage::Denoise,
        Stage::Sharpen,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Color => stages::color::NAME,
            Self::Brightness => stages::brightness::NAME,
            Self::Contrast => stages::contrast::NAME,
            Self::Saturation => stages::saturation::NAME,
            Self::Denoise => stages::denoise::NAME,
            Self::Sharpen => stages::sharpen::NAME,
        }
    }

    /// Run one of the RGB stages (everything after color normalization)
    fn apply_rgb(&self, image: &RgbImage) -> Result<RgbImage, EnhanceError> {
        match self {
            Self::Color => Ok(image.clone()),
            Self::Brightness => stages::brightness::apply(image),
            Self::Contrast => stages::contrast::apply(image),
            Self::Saturation => stages::saturation::apply(image),
            Self::Denoise => stages::denoise::apply(image),
            Self::Sharpen => stages::sharpen::apply(image),
        }
    }
}

/// Whether a stage changed the image or was bypassed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
    Applied,
    Skipped { reason: String },
}

/// Timing and outcome of a single stage
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub name: &'static str,
    pub time_ms: u64,
    #[serde(flatten)]
    pub status: StageStatus,
}

/// Result of a pipeline run including per-stage stats
#[derive(Debug, Clone, Serialize)]
pub struct Enhancement {
    /// Enhanced image (not serialized)
    #[serde(skip)]
    pub image: RgbImage,
    /// Total pipeline time in milliseconds
    pub total_time_ms: u64,
    pub stages: Vec<StageReport>,
}

impl Enhancement {
    /// True when at least one stage ran successfully
    ///
    /// When false, `image` is just the color-normalized input and callers
    /// should keep the original bytes instead.
    pub fn applied(&self) -> bool {
        self.stages
            .iter()
            .any(|s| s.status == StageStatus::Applied && s.name != stages::color::NAME)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &StageReport> {
        self.stages
            .iter()
            .filter(|s| matches!(s.status, StageStatus::Skipped { .. }))
    }

    /// `stage: reason` for every skipped stage, joined with `; `
    pub fn skip_summary(&self) -> String {
        self.skipped()
            .filter_map(|s| match &s.status {
                StageStatus::Skipped { reason } => Some(format!("{}: {}", s.name, reason)),
                StageStatus::Applied => None,
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Fixed-order wallpaper enhancement pipeline
///
/// Stateless: one instance can serve any number of images, from any thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pipeline;

impl Pipeline {
    pub fn new() -> Self {
        Self
    }

    /// Run every stage over `image`
    ///
    /// A stage that fails is skipped and the image from before it moves on to
    /// the next stage, so this never returns an error.
    pub fn process(&self, image: DynamicImage) -> Enhancement {
        let start = Instant::now();
        let mut reports = Vec::with_capacity(Stage::ALL.len());

        let step_start = Instant::now();
        let mut img = match stages::color::apply(&image) {
            Ok(rgb) => {
                reports.push(report(Stage::Color, step_start, StageStatus::Applied));
                rgb
            }
            Err(err) => {
                let rgb = image.to_rgb8();
                reports.push(skip(Stage::Color, step_start, &err));
                rgb
            }
        };
        drop(image);

        for stage in Stage::ALL.into_iter().skip(1) {
            img = self.run_stage(stage, img, &mut reports);
        }

        let enhancement = Enhancement {
            image: img,
            total_time_ms: start.elapsed().as_millis() as u64,
            stages: reports,
        };

        tracing::debug!(
            total_time_ms = enhancement.total_time_ms,
            skipped = enhancement.skipped().count(),
            "Enhancement pipeline finished"
        );

        enhancement
    }

    fn run_stage(&self, stage: Stage, img: RgbImage, reports: &mut Vec<StageReport>) -> RgbImage {
        let step_start = Instant::now();
        match stage.apply_rgb(&img) {
            Ok(next) => {
                reports.push(report(stage, step_start, StageStatus::Applied));
                next
            }
            Err(err) => {
                reports.push(skip(stage, step_start, &err));
                img
            }
        }
    }
}

fn report(stage: Stage, started: Instant, status: StageStatus) -> StageReport {
    StageReport {
        name: stage.name(),
        time_ms: started.elapsed().as_millis() as u64,
        status,
    }
}

fn skip(stage: Stage, started: Instant, err: &EnhanceError) -> StageReport {
    tracing::warn!(stage = stage.name(), error = %err, "Skipping enhancement stage");
    report(
        stage,
        started,
        StageStatus::Skipped {
            reason: err.to_string(),
        },
    )
}
