//! Sequences and datasets.

use serde::Serialize;
use std::fmt;

use crate::features::FeatureVector;

/// Binary training label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Label {
    NonFall,
    Fall,
}

impl Label {
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(Label::NonFall),
            1 => Some(Label::Fall),
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        match self {
            Label::NonFall => 0,
            Label::Fall => 1,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Fixed-length run of consecutive frames from one source plus its label.
///
/// `label` is `None` only while a window is pending; the writer refuses to
/// export unlabeled sequences.
#[derive(Clone, Debug, PartialEq)]
pub struct Sequence {
    pub frames: Vec<FeatureVector>,
    pub label: Option<Label>,
}

impl Sequence {
    pub fn new(frames: Vec<FeatureVector>, label: Option<Label>) -> Self {
        Self { frames, label }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Ordered collection of sequences. Carries no provenance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    pub sequences: Vec<Sequence>,
}

impl Dataset {
    pub fn new(sequences: Vec<Sequence>) -> Self {
        Self { sequences }
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn push(&mut self, sequence: Sequence) {
        self.sequences.push(sequence);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sequence> {
        self.sequences.iter()
    }

    /// Dimensions taken from the first sequence, plus per-label counts.
    pub fn summary(&self) -> DatasetSummary {
        let mut summary = DatasetSummary {
            sequences: self.sequences.len(),
            ..DatasetSummary::default()
        };
        if let Some(first) = self.sequences.first() {
            summary.sequence_length = first.len();
            // Python-side consumers count the trailing label as an element.
            summary.elements_per_sequence = first.len() + 1;
            summary.vector_width = first.frames.first().map(|v| v.slots().count()).unwrap_or(0);
        }
        for sequence in &self.sequences {
            match sequence.label {
                Some(Label::NonFall) => summary.non_fall += 1,
                Some(Label::Fall) => summary.fall += 1,
                None => summary.unlabeled += 1,
            }
            if sequence.len() != summary.sequence_length {
                summary.ragged += 1;
            }
        }
        summary
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub sequences: usize,
    pub sequence_length: usize,
    pub elements_per_sequence: usize,
    pub vector_width: usize,
    pub fall: usize,
    pub non_fall: usize,
    pub unlabeled: usize,
    /// Sequences whose length differs from the first one.
    pub ragged: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::COORD_LEN;

    fn sequence(len: usize, label: Option<Label>) -> Sequence {
        Sequence::new(
            vec![FeatureVector::new([0.5; COORD_LEN], Some(1.0)); len],
            label,
        )
    }

    #[test]
    fn label_values_are_binary() {
        assert_eq!(Label::from_value(0), Some(Label::NonFall));
        assert_eq!(Label::from_value(1), Some(Label::Fall));
        assert_eq!(Label::from_value(2), None);
        assert_eq!(Label::Fall.to_string(), "1");
    }

    #[test]
    fn summary_counts_labels_and_shape() {
        let dataset = Dataset::new(vec![
            sequence(4, Some(Label::Fall)),
            sequence(4, Some(Label::NonFall)),
            sequence(3, None),
        ]);
        let summary = dataset.summary();
        assert_eq!(summary.sequences, 3);
        assert_eq!(summary.sequence_length, 4);
        assert_eq!(summary.elements_per_sequence, 5);
        assert_eq!(summary.vector_width, 23);
        assert_eq!((summary.fall, summary.non_fall, summary.unlabeled), (1, 1, 1));
        assert_eq!(summary.ragged, 1);
    }
}
