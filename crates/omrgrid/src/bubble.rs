//! Bubble records: identity and pixel geometry of one printed option bubble.
//!
//! A [`BubbleRecord`] is created once by the layout engine, written to the
//! registry document and never mutated afterwards. The scan phase only reads
//! loaded copies.

use serde::{Deserialize, Serialize};

/// Ordered option alphabet. The position of a letter in this table defines
/// the canonical option order inside a question group.
pub const OPTION_LETTERS: [char; 8] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

/// Maximum number of options per question supported by the alphabet.
pub const MAX_OPTIONS: usize = OPTION_LETTERS.len();

/// Letter for the option at `index`, if the alphabet has one.
pub fn option_letter(index: usize) -> Option<char> {
    OPTION_LETTERS.get(index).copied()
}

/// Position of `letter` in the option alphabet.
pub fn option_rank(letter: char) -> Option<usize> {
    OPTION_LETTERS.iter().position(|&l| l == letter)
}

/// Conventional bubble id: `Q<question_num>-<option_letter>`.
pub fn bubble_id(question_num: u32, letter: char) -> String {
    format!("Q{question_num}-{letter}")
}

/// Axis-aligned pixel box, serialized as `[xmin, ymin, xmax, ymax]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BBox {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

impl BBox {
    pub const fn new(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Box enclosing a circle of `radius` around `center`.
    pub const fn around(center: [i32; 2], radius: i32) -> Self {
        Self::new(
            center[0] - radius,
            center[1] - radius,
            center[0] + radius,
            center[1] + radius,
        )
    }

    pub const fn width(&self) -> i32 {
        self.xmax - self.xmin
    }

    pub const fn height(&self) -> i32 {
        self.ymax - self.ymin
    }

    /// `true` when the box encloses no area.
    pub const fn is_degenerate(&self) -> bool {
        self.xmax <= self.xmin || self.ymax <= self.ymin
    }

    /// Closed-interval overlap test (touching edges count as overlap).
    pub const fn overlaps(&self, other: &BBox) -> bool {
        self.xmin <= other.xmax
            && other.xmin <= self.xmax
            && self.ymin <= other.ymax
            && other.ymin <= self.ymax
    }

    /// `true` when the box lies inside `bounds` (edges inclusive).
    pub const fn is_within(&self, bounds: &BBox) -> bool {
        self.xmin >= bounds.xmin
            && self.ymin >= bounds.ymin
            && self.xmax <= bounds.xmax
            && self.ymax <= bounds.ymax
    }
}

impl From<[i32; 4]> for BBox {
    fn from(v: [i32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [i32; 4] {
    fn from(b: BBox) -> Self {
        [b.xmin, b.ymin, b.xmax, b.ymax]
    }
}

/// One printed option bubble.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "BubbleEntry", into = "BubbleEntry")]
pub struct BubbleRecord {
    /// Sheet-unique id, conventionally `Q<question_num>-<option_letter>`.
    pub id: String,
    /// Question number, starting at 1.
    pub question_num: u32,
    pub option_letter: char,
    /// Bubble center in image pixels.
    pub center: [i32; 2],
    pub bbox: BBox,
}

impl BubbleRecord {
    /// Create a record with the conventional id and a bbox of `radius`
    /// around `center`.
    pub fn new(question_num: u32, option_letter: char, center: [i32; 2], radius: i32) -> Self {
        Self {
            id: bubble_id(question_num, option_letter),
            question_num,
            option_letter,
            center,
            bbox: BBox::around(center, radius),
        }
    }

    /// Rank used for canonical ordering: alphabet position, unrecognized
    /// letters after every known one.
    pub(crate) fn sort_key(&self) -> (usize, char) {
        (
            option_rank(self.option_letter).unwrap_or(MAX_OPTIONS),
            self.option_letter,
        )
    }
}

/// Registry document entry (wire form of [`BubbleRecord`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct BubbleEntry {
    id: String,
    question_num: u32,
    option_letter: String,
    center_x: i32,
    center_y: i32,
    bbox: [i32; 4],
}

impl TryFrom<BubbleEntry> for BubbleRecord {
    type Error = String;

    fn try_from(e: BubbleEntry) -> Result<Self, Self::Error> {
        if e.question_num == 0 {
            return Err(format!("bubble '{}': question_num must be >= 1", e.id));
        }
        let mut chars = e.option_letter.chars();
        let option_letter = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(format!(
                    "bubble '{}': option_letter must be a single character, got '{}'",
                    e.id, e.option_letter
                ))
            }
        };
        Ok(Self {
            id: e.id,
            question_num: e.question_num,
            option_letter,
            center: [e.center_x, e.center_y],
            bbox: BBox::from(e.bbox),
        })
    }
}

impl From<BubbleRecord> for BubbleEntry {
    fn from(r: BubbleRecord) -> Self {
        Self {
            id: r.id,
            question_num: r.question_num,
            option_letter: r.option_letter.to_string(),
            center_x: r.center[0],
            center_y: r.center[1],
            bbox: r.bbox.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_uses_conventional_id_and_radius_box() {
        let r = BubbleRecord::new(12, 'C', [100, 200], 20);
        assert_eq!(r.id, "Q12-C");
        assert_eq!(r.bbox, BBox::new(80, 180, 120, 220));
        assert_eq!(r.bbox.width(), 40);
        assert!(!r.bbox.is_degenerate());
    }

    #[test]
    fn entry_wire_format_matches_registry_document() {
        let r = BubbleRecord::new(2, 'C', [215, 445], 20);
        let json = serde_json::to_value(&r).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "id": "Q2-C",
                "question_num": 2,
                "option_letter": "C",
                "center_x": 215,
                "center_y": 445,
                "bbox": [195, 425, 235, 465]
            })
        );
    }

    #[test]
    fn entry_rejects_zero_question_and_long_letters() {
        let zero = r#"{"id":"x","question_num":0,"option_letter":"A","center_x":1,"center_y":1,"bbox":[0,0,2,2]}"#;
        assert!(serde_json::from_str::<BubbleRecord>(zero).is_err());

        let long = r#"{"id":"x","question_num":1,"option_letter":"AB","center_x":1,"center_y":1,"bbox":[0,0,2,2]}"#;
        assert!(serde_json::from_str::<BubbleRecord>(long).is_err());

        let empty = r#"{"id":"x","question_num":1,"option_letter":"","center_x":1,"center_y":1,"bbox":[0,0,2,2]}"#;
        assert!(serde_json::from_str::<BubbleRecord>(empty).is_err());
    }

    #[test]
    fn unknown_letters_rank_after_alphabet() {
        let known = BubbleRecord::new(1, 'H', [0, 0], 1);
        let unknown = BubbleRecord::new(1, 'Z', [0, 0], 1);
        assert!(known.sort_key() < unknown.sort_key());
        assert_eq!(option_rank('D'), Some(3));
        assert_eq!(option_letter(8), None);
    }

    #[test]
    fn overlap_counts_shared_edges() {
        let a = BBox::new(0, 0, 10, 10);
        assert!(a.overlaps(&BBox::new(10, 0, 20, 10)));
        assert!(!a.overlaps(&BBox::new(11, 0, 20, 10)));
        assert!(a.is_within(&BBox::new(0, 0, 10, 10)));
    }
}
