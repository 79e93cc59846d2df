//! High-level scan API.
//!
//! [`Scanner`] is the primary entry point for reading marked sheets. It wraps
//! a validated [`ScanConfig`]. Create once, scan many sheets.
//!
//! Per sheet the stages are: load registry and image (blocking) → fill ratios
//! per question group (parallel) → resolution → output assembly.
//!
//! # Examples
//!
//! ```no_run
//! use omrgrid::{BubbleRegistry, ScanConfig, Scanner, SheetMetadata};
//! use std::path::Path;
//!
//! let registry = BubbleRegistry::from_json_file(Path::new("bubbles.json")).unwrap();
//! let scanner = Scanner::new(ScanConfig::default()).unwrap();
//! let scan = scanner
//!     .scan_path(Path::new("scan.png"), &registry, SheetMetadata::new())
//!     .unwrap();
//! println!("{} answers", scan.output.answers.len());
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use image::{DynamicImage, GrayImage, ImageReader};
use rayon::prelude::*;

use crate::assemble::{assemble, ScanOutput, SheetMetadata};
use crate::config::ScanConfig;
use crate::error::{ScanError, SheetWarning};
use crate::fill::bubble_fill_ratio;
use crate::highlight::{highlights, Highlight};
use crate::registry::{BubbleRegistry, QuestionGroup};
use crate::report::SheetReport;
use crate::resolve::{resolve_sheet, ScoredBubble};

/// Result of one successfully scanned sheet.
#[derive(Debug, Clone)]
pub struct SheetScan {
    pub output: ScanOutput,
    /// Non-fatal conditions (structural mismatches).
    pub warnings: Vec<SheetWarning>,
    /// Winning bubble regions; empty unless `collect_highlights` is set.
    pub highlights: Vec<Highlight>,
}

/// One sheet of a batch.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SheetJob {
    /// Name used in the batch report.
    pub name: String,
    pub image: PathBuf,
    pub registry: PathBuf,
    #[serde(default)]
    pub metadata: SheetMetadata,
}

/// Cooperative wall-clock budget of one sheet.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    start: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    fn start(budget_ms: Option<u64>) -> Self {
        Self {
            start: Instant::now(),
            budget: budget_ms.map(Duration::from_millis),
        }
    }

    fn check(&self, stage: &'static str) -> Result<(), ScanError> {
        match self.budget {
            Some(budget) if self.start.elapsed() > budget => Err(ScanError::Timeout {
                budget_ms: budget.as_millis() as u64,
                stage,
            }),
            _ => Ok(()),
        }
    }
}

/// Primary scan interface.
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    /// Create a scanner; fails when the configuration is invalid.
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan an already decoded, layout-aligned grayscale raster.
    pub fn scan(
        &self,
        gray: &GrayImage,
        registry: &BubbleRegistry,
        metadata: SheetMetadata,
    ) -> Result<SheetScan, ScanError> {
        self.scan_with_deadline(gray, registry, metadata, Deadline::start(self.config.time_budget_ms))
    }

    /// Decode the image at `image_path` and scan it.
    pub fn scan_path(
        &self,
        image_path: &Path,
        registry: &BubbleRegistry,
        metadata: SheetMetadata,
    ) -> Result<SheetScan, ScanError> {
        let deadline = Deadline::start(self.config.time_budget_ms);
        let gray = load_gray(image_path)?;
        deadline.check("image decode")?;
        self.scan_with_deadline(&gray, registry, metadata, deadline)
    }

    /// Scan one batch job: load its registry and image, then scan.
    pub fn scan_job(&self, job: &SheetJob) -> Result<SheetScan, ScanError> {
        let deadline = Deadline::start(self.config.time_budget_ms);
        let registry = BubbleRegistry::from_json_file(&job.registry)?;
        let gray = load_gray(&job.image)?;
        deadline.check("load")?;
        self.scan_with_deadline(&gray, &registry, job.metadata.clone(), deadline)
    }

    /// Scan sheets in parallel. Every job yields exactly one report, in job
    /// order; a failing sheet never affects the others.
    pub fn scan_batch(&self, jobs: &[SheetJob]) -> Vec<SheetReport> {
        tracing::info!("Scanning {} sheets", jobs.len());
        jobs.par_iter()
            .map(|job| {
                let result = self.scan_job(job);
                if let Err(e) = &result {
                    tracing::warn!("Sheet {} failed: {}", job.name, e);
                }
                SheetReport::from_result(&job.name, result)
            })
            .collect()
    }

    fn scan_with_deadline(
        &self,
        gray: &GrayImage,
        registry: &BubbleRegistry,
        metadata: SheetMetadata,
        deadline: Deadline,
    ) -> Result<SheetScan, ScanError> {
        let (w, h) = gray.dimensions();
        tracing::debug!(
            "Scanning {}x{} raster against {} bubbles",
            w,
            h,
            registry.bubble_count()
        );

        let groups: Vec<QuestionGroup<'_>> = registry.groups().collect();
        let fill = self.config.fill;

        // Each group is its own barrier: a question is resolved only after
        // all of its bubbles are measured.
        let scored = groups
            .par_iter()
            .map(|group| {
                deadline.check("fill detection")?;
                let bubbles: Vec<ScoredBubble<'_>> = group
                    .iter()
                    .map(|bubble| ScoredBubble {
                        bubble,
                        filled_ratio: bubble_fill_ratio(gray, &bubble.bbox, &fill),
                    })
                    .collect();
                Ok((group.question_num(), bubbles))
            })
            .collect::<Result<Vec<_>, ScanError>>()?;
        deadline.check("fill detection")?;

        let resolution = resolve_sheet(scored, &self.config.resolve_params());
        deadline.check("resolution")?;

        let highlights = if self.config.collect_highlights {
            highlights(&resolution.questions)
        } else {
            Vec::new()
        };
        let answers = resolution.answers();
        let n_answered = resolution
            .questions
            .iter()
            .filter(|q| q.record.bubble_id.is_some())
            .count();

        tracing::info!(
            "Resolved {} of {} questions ({} answered, {} skipped)",
            answers.len(),
            registry.question_count(),
            n_answered,
            resolution.warnings.len()
        );

        Ok(SheetScan {
            output: assemble(answers, registry.question_count(), metadata),
            warnings: resolution.warnings,
            highlights,
        })
    }
}

/// Decode an image file, keeping its native colour type.
pub fn load_image(path: &Path) -> Result<DynamicImage, ScanError> {
    let to_err = |source: image::ImageError| ScanError::ImageLoad {
        path: path.to_path_buf(),
        source,
    };
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| to_err(image::ImageError::IoError(e)))?;
    reader.decode().map_err(to_err)
}

/// Decode an image file into 8-bit grayscale.
pub fn load_gray(path: &Path) -> Result<GrayImage, ScanError> {
    Ok(load_image(path)?.to_luma8())
}
