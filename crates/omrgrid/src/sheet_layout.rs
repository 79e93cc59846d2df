//! Answer-sheet layout engine.
//!
//! Sheet JSON follows a parametric schema (`omrgrid.sheet.v1`): bubble
//! positions are generated from the grid parameters and are never listed in
//! the layout file itself. The generated [`BubbleRecord`]s are what the
//! registry persists.
//!
//! Questions fill column 0 top to bottom, then column 1, and so on. Within a
//! row the K options run left to right in alphabet order.

use std::path::Path;

use crate::bubble::{option_letter, BBox, BubbleRecord, MAX_OPTIONS};
use crate::error::{LayoutError, SheetWarning};
use crate::registry::BubbleRegistry;

const SHEET_SCHEMA_V1: &str = "omrgrid.sheet.v1";

// A4 at 150 dpi.
const DEFAULT_PAGE_WIDTH: i32 = 1240;
const DEFAULT_PAGE_HEIGHT: i32 = 1754;
const DEFAULT_MARGIN: i32 = 70;
const DEFAULT_CONTENT_TOP: i32 = 320;
const DEFAULT_HEADER_HEIGHT: i32 = 85;
const DEFAULT_COLUMNS: usize = 3;
const DEFAULT_ROWS_PER_COLUMN: usize = 20;
const DEFAULT_OPTIONS: usize = 4;
const DEFAULT_BUBBLE_RADIUS: i32 = 20;
const DEFAULT_BUBBLE_SPACING: i32 = 15;
const DEFAULT_ROW_GAP: i32 = 5;
const DEFAULT_LABEL_WIDTH: i32 = 80;
const DEFAULT_COLUMN_PADDING: i32 = 10;

/// Layout parameters of one answer sheet.
///
/// All lengths are in output-raster pixels.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetLayoutSpec {
    pub schema: String,
    /// Total number of questions N requested for the sheet.
    pub question_count: usize,
    /// Options per question K (at most 8).
    pub options_per_question: usize,
    /// Column count C.
    pub columns: usize,
    /// Row capacity R of each column.
    pub rows_per_column: usize,
    pub page_width: i32,
    pub page_height: i32,
    /// Margin kept free on every page edge.
    pub margin: i32,
    /// Top of the bubble block; everything above belongs to the page header.
    pub content_top: i32,
    /// Room between `content_top` and the first row, used for option labels.
    pub header_height: i32,
    /// Room left of the bubbles for the question number.
    pub label_width: i32,
    /// Inset of the content inside each column.
    pub column_padding: i32,
    pub bubble_radius: i32,
    /// Horizontal gap between neighbouring bubbles of one question.
    pub bubble_spacing: i32,
    /// Vertical gap between neighbouring rows.
    pub row_gap: i32,
}

impl Default for SheetLayoutSpec {
    fn default() -> Self {
        Self {
            schema: SHEET_SCHEMA_V1.to_string(),
            question_count: 0,
            options_per_question: DEFAULT_OPTIONS,
            columns: DEFAULT_COLUMNS,
            rows_per_column: DEFAULT_ROWS_PER_COLUMN,
            page_width: DEFAULT_PAGE_WIDTH,
            page_height: DEFAULT_PAGE_HEIGHT,
            margin: DEFAULT_MARGIN,
            content_top: DEFAULT_CONTENT_TOP,
            header_height: DEFAULT_HEADER_HEIGHT,
            label_width: DEFAULT_LABEL_WIDTH,
            column_padding: DEFAULT_COLUMN_PADDING,
            bubble_radius: DEFAULT_BUBBLE_RADIUS,
            bubble_spacing: DEFAULT_BUBBLE_SPACING,
            row_gap: DEFAULT_ROW_GAP,
        }
    }
}

impl SheetLayoutSpec {
    /// Default geometry for `question_count` questions.
    pub fn with_questions(question_count: usize) -> Self {
        Self {
            question_count,
            ..Self::default()
        }
    }

    /// Load layout parameters from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, LayoutError> {
        let data = std::fs::read_to_string(path).map_err(|source| LayoutError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let spec: Self = serde_json::from_str(&data)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Maximum number of questions the grid can hold (`C * R`).
    pub fn capacity(&self) -> usize {
        self.columns.saturating_mul(self.rows_per_column)
    }

    /// Width of one column.
    pub fn column_width(&self) -> i64 {
        let columns = i64::try_from(self.columns).unwrap_or(i64::MAX).max(1);
        (self.page_width as i64 - 2 * self.margin as i64) / columns
    }

    /// Center-to-center distance between options of one question.
    pub fn option_pitch(&self) -> i64 {
        2 * self.bubble_radius as i64 + self.bubble_spacing as i64
    }

    /// Center-to-center distance between rows.
    pub fn row_pitch(&self) -> i64 {
        2 * self.bubble_radius as i64 + self.row_gap as i64
    }

    /// Page area inside the margins; every generated bbox lies in it.
    pub fn content_bounds(&self) -> BBox {
        BBox::new(
            self.margin,
            self.margin,
            self.page_width.saturating_sub(self.margin),
            self.page_height.saturating_sub(self.margin),
        )
    }

    /// Number of rows per column that end above the bottom margin.
    pub fn rows_that_fit(&self) -> usize {
        let first_top = self.content_top as i64 + self.header_height as i64;
        let limit = self.page_height as i64 - self.margin as i64;
        let diameter = 2 * self.bubble_radius as i64;
        let pitch = self.row_pitch();
        if diameter <= 0 || pitch <= 0 || first_top + diameter > limit {
            return 0;
        }
        usize::try_from((limit - first_top - diameter) / pitch + 1).unwrap_or(usize::MAX)
    }

    /// Number of the highest question that receives bubbles (0 when none).
    fn last_placed_question(&self) -> usize {
        let placed = self.question_count.min(self.capacity());
        if placed == 0 || self.rows_per_column == 0 {
            return 0;
        }
        let first_q = (placed - 1) / self.rows_per_column * self.rows_per_column;
        first_q + (placed - first_q).min(self.rows_that_fit())
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.schema != SHEET_SCHEMA_V1 {
            return Err(LayoutError::Schema {
                found: self.schema.clone(),
                expected: SHEET_SCHEMA_V1,
            });
        }
        let invalid = |msg: String| Err(LayoutError::Invalid(msg));

        if self.page_width <= 0 || self.page_height <= 0 {
            return invalid("page_width and page_height must be > 0".to_string());
        }
        if self.margin < 0
            || 2 * self.margin as i64 >= self.page_width.min(self.page_height) as i64
        {
            return invalid("margin must be >= 0 and leave a non-empty content area".to_string());
        }
        if self.bubble_radius <= 0 {
            return invalid("bubble_radius must be > 0".to_string());
        }
        if self.bubble_spacing < 0 || self.row_gap < 0 {
            return invalid("bubble_spacing and row_gap must be >= 0".to_string());
        }
        if self.label_width < 0 || self.column_padding < 0 || self.header_height < 0 {
            return invalid(
                "label_width, column_padding and header_height must be >= 0".to_string(),
            );
        }
        if !(1..=MAX_OPTIONS).contains(&self.options_per_question) {
            return invalid(format!(
                "options_per_question must be in 1..={MAX_OPTIONS}, got {}",
                self.options_per_question
            ));
        }
        if self.columns == 0 || self.rows_per_column == 0 {
            return invalid("columns and rows_per_column must be >= 1".to_string());
        }
        if i32::try_from(self.columns).is_err() {
            return invalid(format!("columns must be <= {}, got {}", i32::MAX, self.columns));
        }
        if self.content_top < self.margin {
            return invalid(format!(
                "content_top ({}) must not start inside the top margin ({})",
                self.content_top, self.margin
            ));
        }

        let k = self.options_per_question as i64;
        let row_width = self.column_padding as i64
            + self.label_width as i64
            + k * 2 * self.bubble_radius as i64
            + (k - 1) * self.bubble_spacing as i64;
        if row_width > self.column_width() {
            return invalid(format!(
                "a row of {} bubbles needs {}px but a column is only {}px wide",
                self.options_per_question,
                row_width,
                self.column_width()
            ));
        }
        if self.rows_that_fit() == 0 {
            return invalid(format!(
                "first bubble row does not fit above the bottom margin (content_top={}, header_height={})",
                self.content_top, self.header_height
            ));
        }
        if self.last_placed_question() >= u32::MAX as usize {
            return invalid(format!(
                "question numbers up to {} do not fit the registry's u32 question_num",
                self.last_placed_question()
            ));
        }
        Ok(())
    }

    /// Center of option `option_idx` of the question at (`column`, `row`).
    ///
    /// Only called on validated specs, where every center lies on the page.
    fn bubble_center(&self, column: usize, row: usize, option_idx: usize) -> [i32; 2] {
        let col_start = self.margin as i64 + self.column_width() * column as i64;
        let first_x = col_start
            + self.column_padding as i64
            + self.label_width as i64
            + self.bubble_radius as i64;
        let first_y =
            self.content_top as i64 + self.header_height as i64 + self.bubble_radius as i64;
        [
            (first_x + option_idx as i64 * self.option_pitch()) as i32,
            (first_y + row as i64 * self.row_pitch()) as i32,
        ]
    }
}

/// Generated sheet: bubble records plus any non-fatal layout warnings.
#[derive(Debug, Clone)]
pub struct SheetLayout {
    pub spec: SheetLayoutSpec,
    /// Bubble records in generation order (column, row, option).
    pub bubbles: Vec<BubbleRecord>,
    pub warnings: Vec<SheetWarning>,
    /// Number of questions that received bubbles.
    pub questions_placed: usize,
}

impl SheetLayout {
    /// Validate `spec` and lay out its bubbles.
    ///
    /// Questions beyond `C * R` are omitted with a
    /// [`SheetWarning::CapacityExceeded`]; rows that would cross the bottom
    /// margin are omitted with a [`SheetWarning::PageOverflow`] per column.
    pub fn generate(spec: &SheetLayoutSpec) -> Result<Self, LayoutError> {
        spec.validate()?;

        let capacity = spec.capacity();
        let placed_target = spec.question_count.min(capacity);
        let rows_fit = spec.rows_that_fit().min(spec.rows_per_column);
        let mut warnings = Vec::new();

        if spec.question_count > capacity {
            let omitted = spec.question_count - capacity;
            tracing::warn!(
                "Sheet holds {} questions; {} of {} requested are omitted",
                capacity,
                omitted,
                spec.question_count
            );
            warnings.push(SheetWarning::CapacityExceeded {
                requested: spec.question_count,
                capacity,
                omitted,
            });
        }

        let reserve = placed_target.min(spec.columns.saturating_mul(rows_fit));
        let mut bubbles = Vec::with_capacity(reserve.saturating_mul(spec.options_per_question));
        let mut questions_placed = 0;

        for column in 0..spec.columns {
            let first_q = match column.checked_mul(spec.rows_per_column) {
                Some(q) if q < placed_target => q,
                _ => break,
            };
            let last_q = first_q
                .saturating_add(spec.rows_per_column)
                .min(placed_target);

            for (row, q_idx) in (first_q..last_q).enumerate() {
                if row >= rows_fit {
                    let omitted = last_q - q_idx;
                    tracing::warn!(
                        "Column {} overflows the page: {} questions from Q{} omitted",
                        column,
                        omitted,
                        q_idx + 1
                    );
                    warnings.push(SheetWarning::PageOverflow {
                        column,
                        first_omitted_question: (q_idx + 1) as u32,
                        omitted,
                    });
                    break;
                }

                // validate() keeps every placed question number below u32::MAX.
                let question_num = (q_idx + 1) as u32;
                for option_idx in 0..spec.options_per_question {
                    let Some(letter) = option_letter(option_idx) else {
                        break;
                    };
                    let center = spec.bubble_center(column, row, option_idx);
                    bubbles.push(BubbleRecord::new(
                        question_num,
                        letter,
                        center,
                        spec.bubble_radius,
                    ));
                }
                questions_placed += 1;
            }
        }

        tracing::info!(
            "Laid out {} questions ({} bubbles) in {} columns",
            questions_placed,
            bubbles.len(),
            spec.columns
        );

        Ok(Self {
            spec: spec.clone(),
            bubbles,
            warnings,
            questions_placed,
        })
    }

    /// Registry view of the generated bubbles.
    pub fn registry(&self) -> BubbleRegistry {
        BubbleRegistry::from_records(self.bubbles.clone())
    }
}
