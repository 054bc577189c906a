//! Labeling policies.
//!
//! A policy may tag each frame as it is recorded and then decides, window by
//! window, whether a candidate becomes a sequence and with which label.
//! Interactive review is just a policy whose decision blocks on a human.

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dataset::Label;
use crate::window::Candidate;

/// Verdict on one candidate window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Emit the window with this label.
    Keep(Label),
    /// Drop the window.
    Discard,
    /// Drop the window and stop reviewing the current source.
    Stop,
}

pub trait LabelPolicy {
    fn name(&self) -> &'static str;

    /// Label attached to a single recorded frame.
    fn frame_label(&mut self, _frame_index: usize) -> Option<Label> {
        None
    }

    /// Decide the fate of a candidate window.
    fn decide(&mut self, candidate: &Candidate<'_>) -> Result<Decision>;
}

/// Uniform random frame labels. Placeholder datasets only.
pub struct SyntheticLabels {
    rng: StdRng,
}

impl SyntheticLabels {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SyntheticLabels {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelPolicy for SyntheticLabels {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn frame_label(&mut self, _frame_index: usize) -> Option<Label> {
        if self.rng.gen_bool(0.5) {
            Some(Label::Fall)
        } else {
            Some(Label::NonFall)
        }
    }

    fn decide(&mut self, candidate: &Candidate<'_>) -> Result<Decision> {
        Ok(match candidate.frame_label {
            Some(label) => Decision::Keep(label),
            None => Decision::Discard,
        })
    }
}

/// Same label for every frame and window of a source.
pub struct ConstantLabel {
    label: Label,
}

impl ConstantLabel {
    pub fn new(label: Label) -> Self {
        Self { label }
    }
}

impl LabelPolicy for ConstantLabel {
    fn name(&self) -> &'static str {
        "constant"
    }

    fn frame_label(&mut self, _frame_index: usize) -> Option<Label> {
        Some(self.label)
    }

    fn decide(&mut self, _candidate: &Candidate<'_>) -> Result<Decision> {
        Ok(Decision::Keep(self.label))
    }
}

/// Defers every decision to a callback, typically a blocking prompt.
///
/// Headless pipelines pass a plain function instead.
pub struct InteractiveReview<F> {
    frame_label: Option<Label>,
    review: F,
}

impl<F> InteractiveReview<F>
where
    F: FnMut(&Candidate<'_>) -> Result<Decision>,
{
    /// `frame_label` is what a plain "accept" keeps when the reviewer gives
    /// no explicit label.
    pub fn new(frame_label: Option<Label>, review: F) -> Self {
        Self {
            frame_label,
            review,
        }
    }
}

impl<F> LabelPolicy for InteractiveReview<F>
where
    F: FnMut(&Candidate<'_>) -> Result<Decision>,
{
    fn name(&self) -> &'static str {
        "interactive"
    }

    fn frame_label(&mut self, _frame_index: usize) -> Option<Label> {
        self.frame_label
    }

    fn decide(&mut self, candidate: &Candidate<'_>) -> Result<Decision> {
        (self.review)(candidate)
    }
}

/// Interpret a reviewer answer.
///
/// `y` keeps the window with its frame label, `0`/`1` keep it with that
/// label, `s` stops the source, anything else discards.
pub fn parse_answer(answer: &str, frame_label: Option<Label>) -> Result<Decision> {
    match answer.trim() {
        "y" => frame_label
            .map(Decision::Keep)
            .ok_or_else(|| anyhow!("window has no frame label; answer 0 or 1 instead")),
        "0" => Ok(Decision::Keep(Label::NonFall)),
        "1" => Ok(Decision::Keep(Label::Fall)),
        "s" => Ok(Decision::Stop),
        _ => Ok(Decision::Discard),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_map_to_decisions() {
        assert_eq!(parse_answer("y\n", Some(Label::Fall)).unwrap(), Decision::Keep(Label::Fall));
        assert!(parse_answer("y", None).is_err());
        assert_eq!(parse_answer(" 0 ", None).unwrap(), Decision::Keep(Label::NonFall));
        assert_eq!(parse_answer("1", None).unwrap(), Decision::Keep(Label::Fall));
        assert_eq!(parse_answer("s", None).unwrap(), Decision::Stop);
        assert_eq!(parse_answer("n", Some(Label::Fall)).unwrap(), Decision::Discard);
        assert_eq!(parse_answer("", Some(Label::Fall)).unwrap(), Decision::Discard);
    }

    #[test]
    fn synthetic_labels_cover_both_classes() {
        let mut policy = SyntheticLabels::seeded(42);
        let labels: Vec<_> = (0..200).filter_map(|i| policy.frame_label(i)).collect();
        assert_eq!(labels.len(), 200);
        assert!(labels.contains(&Label::Fall));
        assert!(labels.contains(&Label::NonFall));
    }

    #[test]
    fn constant_policy_tags_every_frame() {
        let mut policy = ConstantLabel::new(Label::Fall);
        assert_eq!(policy.frame_label(0), Some(Label::Fall));
        assert_eq!(policy.frame_label(999), Some(Label::Fall));
    }
}
