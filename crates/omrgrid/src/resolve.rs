//! Answer resolution: one decision per question from its bubbles' fill
//! ratios.
//!
//! Rules, applied per question group in canonical option order:
//! 1. a group whose size differs from the configured option count is skipped
//!    with a [`SheetWarning::StructuralMismatch`];
//! 2. the option with the highest fill ratio is the candidate, and on a tie
//!    the earliest option wins;
//! 3. a candidate below the mark threshold resolves to
//!    [`Answer::Unanswered`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::bubble::{BBox, BubbleRecord};
use crate::error::SheetWarning;

/// Sentinel answer string for a question without a confident mark.
pub const UNANSWERED: &str = "Unanswered";

/// Default minimum fill ratio for a bubble to count as marked.
pub const DEFAULT_MARK_THRESHOLD: f32 = 0.45;

/// Resolved answer of one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Answer {
    Option(char),
    Unanswered,
}

impl Answer {
    pub fn letter(self) -> Option<char> {
        match self {
            Self::Option(c) => Some(c),
            Self::Unanswered => None,
        }
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Option(c) => write!(f, "{c}"),
            Self::Unanswered => f.write_str(UNANSWERED),
        }
    }
}

impl Serialize for Answer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Answer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == UNANSWERED {
            return Ok(Self::Unanswered);
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Self::Option(c)),
            _ => Err(serde::de::Error::custom(format!(
                "answer must be '{UNANSWERED}' or a single option letter, got '{s}'"
            ))),
        }
    }
}

/// One entry of the scan output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// Question number.
    pub id: u32,
    pub answer: Answer,
    /// Id of the winning bubble; `null` when unanswered.
    pub bubble_id: Option<String>,
}

/// A bubble with its measured fill ratio.
#[derive(Debug, Clone, Copy)]
pub struct ScoredBubble<'a> {
    pub bubble: &'a BubbleRecord,
    pub filled_ratio: f32,
}

/// Resolver parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveParams {
    /// Configured option count K every group must match.
    pub expected_options: usize,
    /// Minimum winning fill ratio for a marked answer.
    pub mark_threshold: f32,
}

/// Resolution of one question, with the data highlight rendering needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuestion {
    pub record: AnswerRecord,
    /// Highest fill ratio in the group (also when below threshold).
    pub max_ratio: f32,
    /// Bbox of the winning bubble when answered.
    pub winner_bbox: Option<BBox>,
}

/// Outcome of resolving every question of a sheet.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Resolved questions in ascending question order.
    pub questions: Vec<ResolvedQuestion>,
    pub warnings: Vec<SheetWarning>,
}

impl Resolution {
    /// Answer records in ascending question order.
    pub fn answers(&self) -> Vec<AnswerRecord> {
        self.questions.iter().map(|q| q.record.clone()).collect()
    }
}

/// Resolve one question from its scored group (canonical option order).
pub fn resolve_question(
    question_num: u32,
    group: &[ScoredBubble<'_>],
    params: &ResolveParams,
) -> Result<ResolvedQuestion, SheetWarning> {
    if group.len() != params.expected_options || group.is_empty() {
        return Err(SheetWarning::StructuralMismatch {
            question_num,
            observed: group.len(),
            expected: params.expected_options,
        });
    }

    let mut best = &group[0];
    for candidate in &group[1..] {
        // Strictly greater: the earliest option keeps a tie.
        if candidate.filled_ratio > best.filled_ratio {
            best = candidate;
        }
    }

    let marked = best.filled_ratio >= params.mark_threshold;
    let record = if marked {
        AnswerRecord {
            id: question_num,
            answer: Answer::Option(best.bubble.option_letter),
            bubble_id: Some(best.bubble.id.clone()),
        }
    } else {
        AnswerRecord {
            id: question_num,
            answer: Answer::Unanswered,
            bubble_id: None,
        }
    };

    tracing::debug!(
        "Q{}: {} (max fill {:.3} at {})",
        question_num,
        record.answer,
        best.filled_ratio,
        best.bubble.id
    );

    Ok(ResolvedQuestion {
        record,
        max_ratio: best.filled_ratio,
        winner_bbox: marked.then_some(best.bubble.bbox),
    })
}

/// Resolve every question group of a sheet.
///
/// Questions are independent; structural mismatches drop only the affected
/// question. The output is sorted by question number.
pub fn resolve_sheet<'a, I>(groups: I, params: &ResolveParams) -> Resolution
where
    I: IntoIterator<Item = (u32, Vec<ScoredBubble<'a>>)>,
{
    let mut resolution = Resolution::default();
    for (question_num, group) in groups {
        match resolve_question(question_num, &group, params) {
            Ok(q) => resolution.questions.push(q),
            Err(warning) => {
                tracing::warn!("{}", warning);
                resolution.warnings.push(warning);
            }
        }
    }
    resolution.questions.sort_by_key(|q| q.record.id);
    resolution
}
