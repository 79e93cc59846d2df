//! Scan output contract.

use std::collections::BTreeMap;

use crate::resolve::AnswerRecord;

pub const SCAN_SCHEMA_V1: &str = "omrgrid.scan.v1";

/// Opaque passthrough identifiers (stage, subject, exam group, ...).
///
/// Values are carried into the output untouched.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SheetMetadata(BTreeMap<String, serde_json::Value>);

impl SheetMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Scan result of one sheet.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScanOutput {
    pub schema: String,
    #[serde(default)]
    pub metadata: SheetMetadata,
    /// Number of questions present in the bubble registry.
    pub question_count: usize,
    /// Answers in ascending question order.
    pub answers: Vec<AnswerRecord>,
}

/// Package resolved answers with run metadata.
pub fn assemble(
    answers: Vec<AnswerRecord>,
    question_count: usize,
    metadata: SheetMetadata,
) -> ScanOutput {
    ScanOutput {
        schema: SCAN_SCHEMA_V1.to_string(),
        metadata,
        question_count,
        answers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::Answer;

    #[test]
    fn output_contract_shape() {
        let meta = SheetMetadata::new()
            .with("stage", "stage 1")
            .with("subject_id", 1);
        let out = assemble(
            vec![
                AnswerRecord {
                    id: 1,
                    answer: Answer::Unanswered,
                    bubble_id: None,
                },
                AnswerRecord {
                    id: 2,
                    answer: Answer::Option('C'),
                    bubble_id: Some("Q2-C".to_string()),
                },
            ],
            2,
            meta,
        );
        let json = serde_json::to_value(&out).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "schema": "omrgrid.scan.v1",
                "metadata": {"stage": "stage 1", "subject_id": 1},
                "question_count": 2,
                "answers": [
                    {"id": 1, "answer": "Unanswered", "bubble_id": null},
                    {"id": 2, "answer": "C", "bubble_id": "Q2-C"}
                ]
            })
        );
        let back: ScanOutput = serde_json::from_value(json).expect("parse");
        assert_eq!(back, out);
    }

    #[test]
    fn metadata_values_pass_through_untouched() {
        let nested = serde_json::json!({"id": 1, "groups": ["A", "B"]});
        let meta = SheetMetadata::new().with("exam_info", nested.clone());
        let out = assemble(Vec::new(), 0, meta);
        assert_eq!(out.metadata.get("exam_info"), Some(&nested));
        assert!(out.answers.is_empty());
    }
}
