//! Shared helpers for raster-based unit tests.

use image::GrayImage;

use crate::render::{mark_bbox, PAPER};
use crate::sheet_layout::SheetLayout;

/// Blank white page with the layout's page size.
pub(crate) fn light_page(layout: &SheetLayout) -> GrayImage {
    GrayImage::from_pixel(
        layout.spec.page_width as u32,
        layout.spec.page_height as u32,
        PAPER,
    )
}

/// Synthetic aligned scan: every bubble region is paper white (255) except
/// the bubbles named in `marked`, which are painted fully dark (0).
pub(crate) fn synthetic_scan(layout: &SheetLayout, marked: &[&str]) -> GrayImage {
    let mut page = light_page(layout);
    for bubble in layout.bubbles.iter().filter(|b| marked.contains(&b.id.as_str())) {
        mark_bbox(&mut page, &bubble.bbox, 0);
    }
    page
}
