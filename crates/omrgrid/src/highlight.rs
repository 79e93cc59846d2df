//! Advisory highlight regions for answered questions.
//!
//! Highlights never feed back into resolution; they only tell a renderer
//! which bubble won each answered question.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::bubble::BBox;
use crate::resolve::ResolvedQuestion;

pub const HIGHLIGHT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
/// Outline thickness in pixels, centered on the bbox edge.
pub const HIGHLIGHT_THICKNESS: i32 = 3;

/// Winning bubble region of one answered question.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Highlight {
    pub question_num: u32,
    pub bubble_id: String,
    pub bbox: BBox,
}

/// Highlights for every answered question, in question order.
pub fn highlights(questions: &[ResolvedQuestion]) -> Vec<Highlight> {
    questions
        .iter()
        .filter_map(|q| {
            let bbox = q.winner_bbox?;
            let bubble_id = q.record.bubble_id.clone()?;
            Some(Highlight {
                question_num: q.record.id,
                bubble_id,
                bbox,
            })
        })
        .collect()
}

/// Draw highlight outlines onto `canvas`. Parts outside the image are clipped.
pub fn draw_highlights(canvas: &mut RgbImage, highlights: &[Highlight]) {
    let half = HIGHLIGHT_THICKNESS / 2;
    for h in highlights {
        if h.bbox.is_degenerate() {
            continue;
        }
        for offset in -half..=(HIGHLIGHT_THICKNESS - 1 - half) {
            let w = h.bbox.width() + 2 * offset;
            let hgt = h.bbox.height() + 2 * offset;
            if w <= 0 || hgt <= 0 {
                continue;
            }
            let rect =
                Rect::at(h.bbox.xmin - offset, h.bbox.ymin - offset).of_size(w as u32, hgt as u32);
            draw_hollow_rect_mut(canvas, rect, HIGHLIGHT_COLOR);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{Answer, AnswerRecord};

    fn resolved(id: u32, winner: Option<(&str, BBox)>) -> ResolvedQuestion {
        ResolvedQuestion {
            record: AnswerRecord {
                id,
                answer: if winner.is_some() {
                    Answer::Option('A')
                } else {
                    Answer::Unanswered
                },
                bubble_id: winner.map(|(bid, _)| bid.to_string()),
            },
            max_ratio: 0.0,
            winner_bbox: winner.map(|(_, b)| b),
        }
    }

    #[test]
    fn only_answered_questions_are_highlighted() {
        let qs = vec![
            resolved(1, None),
            resolved(2, Some(("Q2-A", BBox::new(10, 10, 30, 30)))),
        ];
        let hs = highlights(&qs);
        assert_eq!(hs.len(), 1);
        assert_eq!(hs[0].question_num, 2);
        assert_eq!(hs[0].bubble_id, "Q2-A");
    }

    #[test]
    fn outline_is_drawn_on_bbox_edge() {
        let mut canvas = RgbImage::from_pixel(40, 40, Rgb([255, 255, 255]));
        let h = Highlight {
            question_num: 1,
            bubble_id: "Q1-A".to_string(),
            bbox: BBox::new(10, 10, 30, 30),
        };
        draw_highlights(&mut canvas, &[h]);
        assert_eq!(*canvas.get_pixel(10, 20), HIGHLIGHT_COLOR);
        assert_eq!(*canvas.get_pixel(9, 20), HIGHLIGHT_COLOR);
        assert_eq!(*canvas.get_pixel(20, 20), Rgb([255, 255, 255]));
    }

    #[test]
    fn offscreen_highlight_does_not_panic() {
        let mut canvas = RgbImage::new(10, 10);
        let h = Highlight {
            question_num: 1,
            bubble_id: "Q1-A".to_string(),
            bbox: BBox::new(-50, -50, -20, -20),
        };
        draw_highlights(&mut canvas, &[h]);
        assert!(canvas.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn outline_band_matches_configured_thickness() {
        let mut canvas = RgbImage::from_pixel(40, 40, Rgb([255, 255, 255]));
        let h = Highlight {
            question_num: 1,
            bubble_id: "Q1-A".to_string(),
            bbox: BBox::new(10, 10, 30, 30),
        };
        draw_highlights(&mut canvas, &[h]);
        let green = (0..40)
            .filter(|&x| *canvas.get_pixel(x, 20) == crate::HIGHLIGHT_COLOR)
            .count();
        assert_eq!(green as i32, 2 * crate::HIGHLIGHT_THICKNESS);
    }
}
