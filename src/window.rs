//! Sliding windows over a finished per-source vector list.
//!
//! Windows start at `0, S, 2S, ...` while `start + L <= N`. A trailing partial
//! window is never emitted. The live-capture and offline paths only differ in
//! the stride they pass in.

use anyhow::{anyhow, Result};
use std::ops::Range;

use crate::dataset::{Label, Sequence};
use crate::error::{DatasetError, DatasetResult};
use crate::features::FeatureVector;
use crate::label::{Decision, LabelPolicy};

/// Window length and stride, both in frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowSpec {
    length: usize,
    stride: usize,
}

impl WindowSpec {
    pub fn new(length: usize, stride: usize) -> DatasetResult<Self> {
        if length == 0 {
            return Err(DatasetError::InvalidWindow(
                "sequence length must be at least one frame".into(),
            ));
        }
        if stride == 0 {
            return Err(DatasetError::InvalidWindow(
                "stride must be at least one frame".into(),
            ));
        }
        Ok(Self { length, stride })
    }

    /// Stride derived from how many frames neighbouring windows share.
    pub fn with_overlap(length: usize, overlap: usize) -> DatasetResult<Self> {
        if overlap >= length {
            return Err(DatasetError::InvalidWindow(format!(
                "overlap of {} frames leaves no stride for {}-frame sequences",
                overlap, length
            )));
        }
        Self::new(length, length - overlap)
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn overlap(&self) -> usize {
        self.length.saturating_sub(self.stride)
    }

    /// `floor((n - L) / S) + 1` when `n >= L`, else 0.
    pub fn window_count(&self, n: usize) -> usize {
        if n < self.length {
            0
        } else {
            (n - self.length) / self.stride + 1
        }
    }

    pub fn ranges(&self, n: usize) -> WindowRanges {
        WindowRanges {
            spec: *self,
            total: n,
            next_start: 0,
        }
    }
}

/// Iterator over window frame ranges.
#[derive(Clone, Debug)]
pub struct WindowRanges {
    spec: WindowSpec,
    total: usize,
    next_start: usize,
}

impl Iterator for WindowRanges {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next_start;
        let end = start.checked_add(self.spec.length)?;
        if end > self.total {
            return None;
        }
        self.next_start = start + self.spec.stride;
        Some(start..end)
    }
}

/// A window waiting for a labeling decision.
#[derive(Clone, Debug)]
pub struct Candidate<'a> {
    /// Position of the window within its source.
    pub index: usize,
    pub range: Range<usize>,
    pub frames: &'a [FeatureVector],
    /// Label of the last frame in the window.
    pub frame_label: Option<Label>,
}

/// Candidate windows of one source, in order.
pub fn candidates<'a>(
    vectors: &'a [FeatureVector],
    frame_labels: &'a [Option<Label>],
    spec: WindowSpec,
) -> impl Iterator<Item = Candidate<'a>> + 'a {
    spec.ranges(vectors.len())
        .enumerate()
        .map(move |(index, range)| Candidate {
            index,
            frames: &vectors[range.clone()],
            frame_label: frame_labels.get(range.end - 1).copied().flatten(),
            range,
        })
}

/// Window a source and let `policy` keep, label or reject each candidate.
pub fn build_sequences<P: LabelPolicy + ?Sized>(
    vectors: &[FeatureVector],
    frame_labels: &[Option<Label>],
    spec: WindowSpec,
    policy: &mut P,
) -> Result<Vec<Sequence>> {
    if frame_labels.len() != vectors.len() {
        return Err(anyhow!(
            "{} frame labels for {} feature vectors",
            frame_labels.len(),
            vectors.len()
        ));
    }

    let mut sequences = Vec::with_capacity(spec.window_count(vectors.len()));
    for candidate in candidates(vectors, frame_labels, spec) {
        log::debug!(
            "window {}: frames {}..{}",
            candidate.index,
            candidate.range.start,
            candidate.range.end
        );
        match policy.decide(&candidate)? {
            Decision::Keep(label) => {
                sequences.push(Sequence::new(candidate.frames.to_vec(), Some(label)));
            }
            Decision::Discard => {
                log::debug!("window {} discarded by {} policy", candidate.index, policy.name());
            }
            Decision::Stop => {
                log::info!(
                    "{} policy stopped review at window {}",
                    policy.name(),
                    candidate.index
                );
                break;
            }
        }
    }
    Ok(sequences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::COORD_LEN;
    use crate::label::{ConstantLabel, InteractiveReview};

    fn vectors(n: usize) -> Vec<FeatureVector> {
        (0..n)
            .map(|i| FeatureVector::new([0.5; COORD_LEN], Some(i as f64)))
            .collect()
    }

    #[test]
    fn inclusive_end_boundary_is_a_window() {
        let spec = WindowSpec::new(4, 2).unwrap();
        let starts: Vec<_> = spec.ranges(10).map(|r| r.start).collect();
        assert_eq!(starts, vec![0, 2, 4, 6]);
        assert_eq!(spec.window_count(10), 4);
    }

    #[test]
    fn window_count_matches_ranges() {
        for n in 0..40 {
            for length in 1..8 {
                for stride in 1..6 {
                    let spec = WindowSpec::new(length, stride).unwrap();
                    let ranges: Vec<_> = spec.ranges(n).collect();
                    assert_eq!(ranges.len(), spec.window_count(n), "n={n} L={length} S={stride}");
                    for r in &ranges {
                        assert_eq!(r.len(), length);
                        assert!(r.end <= n);
                    }
                }
            }
        }
    }

    #[test]
    fn short_source_yields_nothing() {
        let spec = WindowSpec::new(5, 1).unwrap();
        assert_eq!(spec.ranges(4).count(), 0);
        assert_eq!(spec.window_count(0), 0);
    }

    #[test]
    fn overlap_must_leave_a_stride() {
        assert_eq!(WindowSpec::with_overlap(90, 45).unwrap().stride(), 45);
        assert!(WindowSpec::with_overlap(90, 90).is_err());
        assert!(WindowSpec::new(0, 1).is_err());
        assert!(WindowSpec::new(3, 0).is_err());
    }

    #[test]
    fn sequences_take_last_frame_label_and_contiguous_frames() {
        let data = vectors(7);
        let mut labels = vec![Some(Label::NonFall); 7];
        labels[3] = Some(Label::Fall);
        let spec = WindowSpec::new(4, 3).unwrap();

        let mut policy = InteractiveReview::new(None, |c: &Candidate<'_>| {
            Ok(Decision::Keep(c.frame_label.unwrap_or(Label::NonFall)))
        });
        let sequences = build_sequences(&data, &labels, spec, &mut policy).unwrap();

        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[0].label, Some(Label::Fall));
        assert_eq!(sequences[1].label, Some(Label::NonFall));
        let ars: Vec<_> = sequences[1].frames.iter().map(|v| v.aspect_ratio().unwrap()).collect();
        assert_eq!(ars, vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn rejected_windows_are_dropped_and_stop_ends_review() {
        let data = vectors(10);
        let labels = vec![Some(Label::Fall); 10];
        let spec = WindowSpec::new(2, 2).unwrap();
        let mut policy = InteractiveReview::new(Some(Label::Fall), |c: &Candidate<'_>| {
            Ok(match c.index {
                1 => Decision::Discard,
                3 => Decision::Stop,
                _ => Decision::Keep(Label::Fall),
            })
        });
        let sequences = build_sequences(&data, &labels, spec, &mut policy).unwrap();
        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[1].frames[0].aspect_ratio(), Some(4.0));
    }

    #[test]
    fn label_count_must_match_vectors() {
        let data = vectors(3);
        let spec = WindowSpec::new(2, 1).unwrap();
        let mut policy = ConstantLabel::new(Label::Fall);
        assert!(build_sequences(&data, &[None], spec, &mut policy).is_err());
    }
}
