use std::path::Path;

use crate::bubble::MAX_OPTIONS;
use crate::error::ScanError;
use crate::fill::FillConfig;
use crate::resolve::{ResolveParams, DEFAULT_MARK_THRESHOLD};

const DEFAULT_OPTIONS_PER_QUESTION: usize = 4;

/// Scan-time configuration, fixed for the whole run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Configured option count K; groups of any other size are skipped.
    pub options_per_question: usize,
    /// Darkness measurement.
    pub fill: FillConfig,
    /// Minimum winning fill ratio in `(0, 1]` for a marked answer.
    pub mark_threshold: f32,
    /// Optional wall-clock budget per sheet (milliseconds).
    ///
    /// When exceeded the sheet fails; no partial answers are reported.
    pub time_budget_ms: Option<u64>,
    /// Collect highlight regions for answered questions.
    pub collect_highlights: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            options_per_question: DEFAULT_OPTIONS_PER_QUESTION,
            fill: FillConfig::default(),
            mark_threshold: DEFAULT_MARK_THRESHOLD,
            time_budget_ms: None,
            collect_highlights: false,
        }
    }
}

impl ScanConfig {
    /// Load from a JSON file; missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if !(1..=MAX_OPTIONS).contains(&self.options_per_question) {
            return Err(ScanError::Config(format!(
                "options_per_question must be in 1..={MAX_OPTIONS}, got {}",
                self.options_per_question
            )));
        }
        if !self.mark_threshold.is_finite()
            || self.mark_threshold <= 0.0
            || self.mark_threshold > 1.0
        {
            return Err(ScanError::Config(format!(
                "mark_threshold must be in (0, 1], got {}",
                self.mark_threshold
            )));
        }
        if self.fill.dark_threshold == 0 {
            return Err(ScanError::Config(
                "fill.dark_threshold must be > 0 (nothing is darker than 0)".to_string(),
            ));
        }
        Ok(())
    }

    pub fn resolve_params(&self) -> ResolveParams {
        ResolveParams {
            expected_options: self.options_per_question,
            mark_threshold: self.mark_threshold,
        }
    }
}
