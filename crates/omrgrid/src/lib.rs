//! omrgrid: fixed-layout answer bubble sheets and mark reading.
//!
//! The crate covers both ends of the bubble-coordinate contract:
//!
//! 1. **Layout** – deterministic bubble grid geometry; every bubble gets a
//!    sheet-unique id and a pixel bbox ([`SheetLayout`]).
//! 2. **Registry** – the bubble records as a JSON document, grouped and
//!    ordered by question on load ([`BubbleRegistry`]).
//! 3. **Fill** – per-bubble darkness ratio inside the recorded bbox.
//! 4. **Resolve** – one answer (or `"Unanswered"`) per question, with an
//!    explicit earliest-option tie-break.
//! 5. **Assemble** – the scan output record.
//!
//! The scan raster must already share the layout's pixel coordinate space;
//! no alignment, deskew or rescaling is performed here.
//!
//! # Public API
//! - [`SheetLayoutSpec`] / [`SheetLayout`] for generation
//! - [`Scanner`] and [`ScanConfig`] for reading sheets, one at a time or in
//!   parallel batches
//! - the component functions ([`bubble_fill_ratio`], [`resolve_question`],
//!   [`assemble`]) for callers wiring their own pipeline

mod assemble;
mod bubble;
mod config;
mod error;
mod fill;
mod highlight;
mod registry;
mod render;
mod report;
mod resolve;
mod scanner;
mod sheet_layout;

#[cfg(test)]
mod test_utils;

pub use assemble::{assemble, ScanOutput, SheetMetadata, SCAN_SCHEMA_V1};
pub use bubble::{
    bubble_id, option_letter, option_rank, BBox, BubbleRecord, MAX_OPTIONS, OPTION_LETTERS,
};
pub use config::ScanConfig;
pub use error::{LayoutError, ParseError, ScanError, SheetWarning};
pub use fill::{
    bubble_fill_ratio, clip_bbox, region_fill_ratio, FillConfig, PixelRect,
    DEFAULT_DARK_THRESHOLD,
};
pub use highlight::{
    draw_highlights, highlights, Highlight, HIGHLIGHT_COLOR, HIGHLIGHT_THICKNESS,
};
pub use registry::{BubbleRegistry, QuestionGroup};
pub use render::{mark_bbox, render_bubble_sheet, INK, OUTLINE_THICKNESS, PAPER};
pub use report::{BatchSummary, SheetReport, SheetStatus};
pub use resolve::{
    resolve_question, resolve_sheet, Answer, AnswerRecord, ResolveParams, ResolvedQuestion,
    Resolution, ScoredBubble, DEFAULT_MARK_THRESHOLD, UNANSWERED,
};
pub use scanner::{load_gray, load_image, Scanner, SheetJob, SheetScan};
pub use sheet_layout::{SheetLayout, SheetLayoutSpec};
