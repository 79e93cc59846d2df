//! Per-bubble darkness measurement.
//!
//! The fill ratio of a bubble is the fraction of pixels inside its bbox whose
//! intensity is below the darkness threshold. Each bubble is measured on its
//! own; there is no normalization against sibling bubbles or the page.

use image::GrayImage;

use crate::bubble::BBox;

/// Default intensity cutoff: pixels at or below 100 count as ink.
pub const DEFAULT_DARK_THRESHOLD: u8 = 101;

/// Fill measurement parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FillConfig {
    /// Pixels with intensity strictly below this value count as ink.
    pub dark_threshold: u8,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            dark_threshold: DEFAULT_DARK_THRESHOLD,
        }
    }
}

/// Non-empty pixel rectangle inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Clip `bbox` (half-open `[xmin, xmax) x [ymin, ymax)`) to an image of
/// `width x height`.
///
/// Returns `None` when nothing of the box is left.
pub fn clip_bbox(bbox: &BBox, width: u32, height: u32) -> Option<PixelRect> {
    let x0 = (bbox.xmin as i64).max(0);
    let y0 = (bbox.ymin as i64).max(0);
    let x1 = (bbox.xmax as i64).min(width as i64);
    let y1 = (bbox.ymax as i64).min(height as i64);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(PixelRect {
        x: x0 as u32,
        y: y0 as u32,
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
    })
}

/// Fraction of pixels in `rect` darker than `dark_threshold`.
///
/// `rect` is clipped to the image again, so a rectangle that does not fit
/// yields the ratio of its visible part, and an invisible one yields 0.0.
pub fn region_fill_ratio(gray: &GrayImage, rect: PixelRect, dark_threshold: u8) -> f32 {
    let (w, h) = gray.dimensions();
    let x1 = rect.x.saturating_add(rect.width).min(w);
    let y1 = rect.y.saturating_add(rect.height).min(h);
    if x1 <= rect.x || y1 <= rect.y {
        return 0.0;
    }

    let stride = w as usize;
    let raw = gray.as_raw();
    let (x0, x1) = (rect.x as usize, x1 as usize);
    let mut dark = 0u64;
    for y in rect.y as usize..y1 as usize {
        let row = &raw[y * stride + x0..y * stride + x1];
        dark += row.iter().filter(|&&v| v < dark_threshold).count() as u64;
    }
    let total = (x1 - x0) as u64 * (y1 as u64 - rect.y as u64);
    dark as f32 / total as f32
}

/// Fill ratio of one bubble's bbox in `gray`.
///
/// A bbox that clips to nothing (outside the frame, or degenerate) is an
/// unmarked bubble: the result is 0.0.
pub fn bubble_fill_ratio(gray: &GrayImage, bbox: &BBox, config: &FillConfig) -> f32 {
    let (w, h) = gray.dimensions();
    match clip_bbox(bbox, w, h) {
        Some(rect) => region_fill_ratio(gray, rect, config.dark_threshold),
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use image::Luma;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn page(w: u32, h: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(w, h, Luma([value]))
    }

    #[test]
    fn clip_keeps_inside_part() {
        assert_eq!(
            clip_bbox(&BBox::new(-5, -5, 10, 4), 8, 8),
            Some(PixelRect {
                x: 0,
                y: 0,
                width: 8,
                height: 4
            })
        );
        assert_eq!(clip_bbox(&BBox::new(20, 0, 30, 5), 8, 8), None);
        assert_eq!(clip_bbox(&BBox::new(3, 3, 3, 6), 8, 8), None);
        assert_eq!(clip_bbox(&BBox::new(6, 6, 2, 2), 8, 8), None);
    }

    #[test]
    fn fully_dark_and_fully_light_regions() {
        let cfg = FillConfig::default();
        let dark = page(50, 50, 0);
        let light = page(50, 50, 255);
        let bbox = BBox::new(10, 10, 30, 30);
        assert_eq!(bubble_fill_ratio(&dark, &bbox, &cfg), 1.0);
        assert_eq!(bubble_fill_ratio(&light, &bbox, &cfg), 0.0);
    }

    #[test]
    fn threshold_is_strict() {
        let img = page(4, 4, 100);
        let bbox = BBox::new(0, 0, 4, 4);
        assert_eq!(
            bubble_fill_ratio(&img, &bbox, &FillConfig { dark_threshold: 100 }),
            0.0
        );
        assert_eq!(
            bubble_fill_ratio(&img, &bbox, &FillConfig { dark_threshold: 101 }),
            1.0
        );
    }

    #[test]
    fn partial_fill_counts_pixels() {
        let mut img = page(10, 10, 255);
        for x in 0..10 {
            for y in 0..3 {
                img.put_pixel(x, y, Luma([20]));
            }
        }
        let ratio = bubble_fill_ratio(&img, &BBox::new(0, 0, 10, 10), &FillConfig::default());
        assert_abs_diff_eq!(ratio, 0.3, epsilon = 1e-6);
    }

    #[test]
    fn out_of_frame_and_degenerate_boxes_are_unmarked() {
        let img = page(20, 20, 0);
        let cfg = FillConfig::default();
        assert_eq!(bubble_fill_ratio(&img, &BBox::new(30, 30, 40, 40), &cfg), 0.0);
        assert_eq!(bubble_fill_ratio(&img, &BBox::new(-10, 0, -1, 5), &cfg), 0.0);
        assert_eq!(bubble_fill_ratio(&img, &BBox::new(5, 5, 5, 15), &cfg), 0.0);
        assert_eq!(bubble_fill_ratio(&img, &BBox::new(9, 9, 3, 3), &cfg), 0.0);
        assert_eq!(bubble_fill_ratio(&GrayImage::new(0, 0), &BBox::new(0, 0, 4, 4), &cfg), 0.0);
    }

    #[test]
    fn half_visible_box_measures_visible_part() {
        let mut img = page(10, 10, 255);
        for y in 0..10 {
            img.put_pixel(9, y, Luma([0]));
        }
        // Visible columns 8..10, one of them dark.
        let ratio = bubble_fill_ratio(&img, &BBox::new(8, 0, 14, 10), &FillConfig::default());
        assert_abs_diff_eq!(ratio, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn ratio_stays_in_unit_interval_on_random_images() {
        let mut rng = StdRng::seed_from_u64(0x0b0b);
        let cfg = FillConfig::default();
        for _ in 0..50 {
            let w = rng.gen_range(1..40);
            let h = rng.gen_range(1..40);
            let mut img = GrayImage::new(w, h);
            for p in img.pixels_mut() {
                *p = Luma([rng.gen()]);
            }
            let x0 = rng.gen_range(-20..50);
            let y0 = rng.gen_range(-20..50);
            let bbox = BBox::new(x0, y0, x0 + rng.gen_range(-5..30), y0 + rng.gen_range(-5..30));
            let ratio = bubble_fill_ratio(&img, &bbox, &cfg);
            assert!((0.0..=1.0).contains(&ratio), "ratio {ratio} for {bbox:?}");
            if clip_bbox(&bbox, w, h).is_none() {
                assert_eq!(ratio, 0.0);
            }
        }
    }
}
