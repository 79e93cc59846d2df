//! Bubble-only sheet rendering.
//!
//! Draws the bubble outlines of a layout onto a white page. Question text,
//! headers and instructions belong to the external page renderer; this output
//! serves as a print proof and as the base for synthetic scans.

use image::{GrayImage, Luma};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_circle_mut};
use imageproc::rect::Rect;

use crate::bubble::{BBox, BubbleRecord};
use crate::sheet_layout::SheetLayout;

pub const PAPER: Luma<u8> = Luma([255]);
pub const INK: Luma<u8> = Luma([0]);
/// Bubble outline thickness in pixels, drawn inward from the radius.
pub const OUTLINE_THICKNESS: i32 = 3;

/// Render the bubble outlines of `layout` on a blank page.
pub fn render_bubble_sheet(layout: &SheetLayout) -> GrayImage {
    let spec = &layout.spec;
    let mut page = GrayImage::from_pixel(
        spec.page_width.max(0) as u32,
        spec.page_height.max(0) as u32,
        PAPER,
    );
    for bubble in &layout.bubbles {
        draw_bubble_outline(&mut page, bubble, spec.bubble_radius);
    }
    page
}

fn draw_bubble_outline(page: &mut GrayImage, bubble: &BubbleRecord, radius: i32) {
    let center = (bubble.center[0], bubble.center[1]);
    for t in 0..OUTLINE_THICKNESS.min(radius) {
        draw_hollow_circle_mut(page, center, radius - t, INK);
    }
}

/// Paint the half-open bbox area of a bubble with `intensity`.
pub fn mark_bbox(page: &mut GrayImage, bbox: &BBox, intensity: u8) {
    if bbox.is_degenerate() {
        return;
    }
    let rect = Rect::at(bbox.xmin, bbox.ymin).of_size(bbox.width() as u32, bbox.height() as u32);
    draw_filled_rect_mut(page, rect, Luma([intensity]));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fill::{bubble_fill_ratio, FillConfig};
    use crate::sheet_layout::SheetLayoutSpec;

    #[test]
    fn outlines_alone_stay_below_default_mark_threshold() {
        let layout = SheetLayout::generate(&SheetLayoutSpec::with_questions(4)).expect("layout");
        let page = render_bubble_sheet(&layout);
        assert_eq!(page.dimensions(), (1240, 1754));
        for b in &layout.bubbles {
            let ratio = bubble_fill_ratio(&page, &b.bbox, &FillConfig::default());
            assert!(ratio > 0.05 && ratio < 0.45, "{}: {ratio}", b.id);
        }
    }

    #[test]
    fn marked_bbox_is_fully_dark() {
        let mut page = GrayImage::from_pixel(60, 60, PAPER);
        let bbox = BBox::new(10, 10, 30, 30);
        mark_bbox(&mut page, &bbox, 0);
        assert_eq!(bubble_fill_ratio(&page, &bbox, &FillConfig::default()), 1.0);
        assert_eq!(*page.get_pixel(30, 30), PAPER);
    }

    #[test]
    fn blank_sheet_uses_paper_and_ink() {
        let layout = SheetLayout::generate(&SheetLayoutSpec::with_questions(1)).expect("layout");
        let page = render_bubble_sheet(&layout);
        assert_eq!(*page.get_pixel(0, 0), crate::PAPER);
        let b = &layout.bubbles[0];
        let top = (b.center[1] - layout.spec.bubble_radius) as u32;
        assert_eq!(*page.get_pixel(b.center[0] as u32, top), crate::INK);
        let inner = (b.center[1] - layout.spec.bubble_radius + crate::OUTLINE_THICKNESS) as u32;
        assert_eq!(*page.get_pixel(b.center[0] as u32, inner), crate::PAPER);
    }
}
