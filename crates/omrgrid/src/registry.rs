//! Bubble coordinate registry.
//!
//! The registry document is a JSON array of bubble entries
//! (`id`, `question_num`, `option_letter`, `center_x`, `center_y`, `bbox`).
//! After loading, records are grouped by question and each group is put in
//! canonical option order. Group sizes are reported as observed; a group that
//! does not match the configured option count is left for the resolver to
//! flag.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::bubble::BubbleRecord;
use crate::error::ParseError;

/// Loaded, immutable set of bubble records.
#[derive(Debug, Clone, Default)]
pub struct BubbleRegistry {
    /// Records in document order.
    bubbles: Vec<BubbleRecord>,
    /// question_num -> indices into `bubbles`, in canonical option order.
    groups: BTreeMap<u32, Vec<usize>>,
    /// Fast lookup: bubble id -> index of its first occurrence.
    id_to_idx: HashMap<String, usize>,
}

impl BubbleRegistry {
    /// Build a registry from records (generation order is kept as document
    /// order).
    pub fn from_records(bubbles: Vec<BubbleRecord>) -> Self {
        let mut groups: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (idx, b) in bubbles.iter().enumerate() {
            groups.entry(b.question_num).or_default().push(idx);
        }
        for order in groups.values_mut() {
            // Stable: equal keys keep document order.
            order.sort_by_key(|&idx| bubbles[idx].sort_key());
        }

        let mut id_to_idx = HashMap::with_capacity(bubbles.len());
        let mut duplicates = HashSet::new();
        for (idx, b) in bubbles.iter().enumerate() {
            if id_to_idx.contains_key(&b.id) {
                duplicates.insert(b.id.as_str());
            } else {
                id_to_idx.insert(b.id.clone(), idx);
            }
        }
        if !duplicates.is_empty() {
            let mut ids: Vec<&str> = duplicates.into_iter().collect();
            ids.sort_unstable();
            tracing::warn!("Registry contains duplicate bubble ids: {}", ids.join(", "));
        }

        Self {
            bubbles,
            groups,
            id_to_idx,
        }
    }

    /// Parse a registry document.
    pub fn from_json_str(data: &str) -> Result<Self, ParseError> {
        let bubbles: Vec<BubbleRecord> = serde_json::from_str(data)?;
        Ok(Self::from_records(bubbles))
    }

    /// Load a registry document from disk.
    pub fn from_json_file(path: &Path) -> Result<Self, ParseError> {
        let data = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_json_str(&data)?;
        tracing::debug!(
            "Loaded {} bubbles for {} questions from {}",
            registry.bubble_count(),
            registry.question_count(),
            path.display()
        );
        Ok(registry)
    }

    /// Serialize to a compact registry document.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.bubbles)
    }

    /// Serialize to an indented registry document.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.bubbles)
    }

    /// Write an indented registry document to `path`.
    pub fn write_json_file(&self, path: &Path) -> std::io::Result<()> {
        let mut writer = BufWriter::new(std::fs::File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &self.bubbles)?;
        writer.flush()
    }

    /// All records in document order.
    pub fn bubbles(&self) -> &[BubbleRecord] {
        &self.bubbles
    }

    pub fn bubble_count(&self) -> usize {
        self.bubbles.len()
    }

    /// Number of distinct question numbers.
    pub fn question_count(&self) -> usize {
        self.groups.len()
    }

    /// Question numbers in ascending order.
    pub fn question_nums(&self) -> impl Iterator<Item = u32> + '_ {
        self.groups.keys().copied()
    }

    /// Question groups in ascending question order.
    pub fn groups(&self) -> impl Iterator<Item = QuestionGroup<'_>> + '_ {
        self.groups.iter().map(|(&question_num, order)| QuestionGroup {
            question_num,
            order,
            bubbles: &self.bubbles,
        })
    }

    pub fn group(&self, question_num: u32) -> Option<QuestionGroup<'_>> {
        self.groups.get(&question_num).map(|order| QuestionGroup {
            question_num,
            order,
            bubbles: &self.bubbles,
        })
    }

    /// Observed option count of a question (0 when absent).
    pub fn observed_options(&self, question_num: u32) -> usize {
        self.groups.get(&question_num).map_or(0, Vec::len)
    }

    /// Look up a record by id (first occurrence when ids repeat).
    pub fn find(&self, id: &str) -> Option<&BubbleRecord> {
        self.id_to_idx.get(id).map(|&idx| &self.bubbles[idx])
    }
}

/// Records of one question in canonical option order.
#[derive(Debug, Clone, Copy)]
pub struct QuestionGroup<'a> {
    question_num: u32,
    order: &'a [usize],
    bubbles: &'a [BubbleRecord],
}

impl<'a> QuestionGroup<'a> {
    pub fn question_num(&self) -> u32 {
        self.question_num
    }

    /// Observed option count.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&'a BubbleRecord> {
        let bubbles = self.bubbles;
        self.order.get(i).map(|&idx| &bubbles[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a BubbleRecord> + 'a {
        let (order, bubbles) = (self.order, self.bubbles);
        order.iter().map(move |&idx| &bubbles[idx])
    }
}
