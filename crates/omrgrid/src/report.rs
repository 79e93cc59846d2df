//! Per-sheet pass/fail reports for batch runs.

use crate::assemble::ScanOutput;
use crate::error::{ScanError, SheetWarning};
use crate::scanner::SheetScan;

/// Outcome class of one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetStatus {
    Pass,
    PassWithWarnings,
    Failed,
}

/// Report of one sheet of a batch.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SheetReport {
    pub sheet: String,
    pub status: SheetStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<SheetWarning>,
    /// Stable error code of a failed sheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    /// Human-readable error message of a failed sheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<ScanOutput>,
}

impl SheetReport {
    pub fn from_result(sheet: &str, result: Result<SheetScan, ScanError>) -> Self {
        match result {
            Ok(scan) => Self {
                sheet: sheet.to_string(),
                status: if scan.warnings.is_empty() {
                    SheetStatus::Pass
                } else {
                    SheetStatus::PassWithWarnings
                },
                warnings: scan.warnings,
                error_kind: None,
                error: None,
                output: Some(scan.output),
            },
            Err(e) => Self {
                sheet: sheet.to_string(),
                status: SheetStatus::Failed,
                warnings: Vec::new(),
                error_kind: Some(e.code().to_string()),
                error: Some(e.to_string()),
                output: None,
            },
        }
    }
}

/// Batch summary: counts plus one report per sheet.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BatchSummary {
    pub passed: usize,
    pub passed_with_warnings: usize,
    pub failed: usize,
    pub sheets: Vec<SheetReport>,
}

impl BatchSummary {
    pub fn new(sheets: Vec<SheetReport>) -> Self {
        let count = |status: SheetStatus| sheets.iter().filter(|r| r.status == status).count();
        Self {
            passed: count(SheetStatus::Pass),
            passed_with_warnings: count(SheetStatus::PassWithWarnings),
            failed: count(SheetStatus::Failed),
            sheets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{assemble, SheetMetadata};

    fn scan(warnings: Vec<SheetWarning>) -> SheetScan {
        SheetScan {
            output: assemble(Vec::new(), 0, SheetMetadata::new()),
            warnings,
            highlights: Vec::new(),
        }
    }

    #[test]
    fn status_reflects_warnings_and_errors() {
        let ok = SheetReport::from_result("a", Ok(scan(Vec::new())));
        assert_eq!(ok.status, SheetStatus::Pass);

        let warned = SheetReport::from_result(
            "b",
            Ok(scan(vec![SheetWarning::StructuralMismatch {
                question_num: 1,
                observed: 2,
                expected: 4,
            }])),
        );
        assert_eq!(warned.status, SheetStatus::PassWithWarnings);

        let failed = SheetReport::from_result(
            "c",
            Err(ScanError::Timeout {
                budget_ms: 10,
                stage: "fill detection",
            }),
        );
        assert_eq!(failed.status, SheetStatus::Failed);
        assert_eq!(failed.error_kind.as_deref(), Some("timeout"));
        assert!(failed.output.is_none());

        let summary = BatchSummary::new(vec![ok, warned, failed]);
        assert_eq!(
            (summary.passed, summary.passed_with_warnings, summary.failed),
            (1, 1, 1)
        );
        let json = serde_json::to_value(&summary).expect("serialize");
        assert_eq!(json["sheets"][1]["status"], "pass_with_warnings");
        assert_eq!(json["sheets"][2]["error_kind"], "timeout");
    }
}
