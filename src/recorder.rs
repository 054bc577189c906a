//! Per-source recording.
//!
//! Drains one pose source through validation, the aspect ratio estimator and
//! the vectorizer, then windows the finished vector list into labeled
//! sequences. Carry-forward state lives only for the duration of one source.

use anyhow::Result;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::aspect::aspect_ratio;
use crate::dataset::{Dataset, Label};
use crate::features::{vectorize, vectorize_unmeasured, FeatureVector};
use crate::ingest::PoseSource;
use crate::label::LabelPolicy;
use crate::validate::{CarryForward, FrameRejection, FrameValidator, ValidatedFrame};
use crate::window::{build_sequences, WindowSpec};

/// Frame counters for one source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordingStats {
    pub observations: usize,
    pub fresh: usize,
    pub carried: usize,
    pub dropped: usize,
    pub detection_misses: usize,
    pub out_of_bounds: usize,
}

/// Feature vectors and frame labels of one source, before windowing.
#[derive(Clone, Debug)]
pub struct SourceRecording {
    pub name: String,
    pub vectors: Vec<FeatureVector>,
    pub frame_labels: Vec<Option<Label>>,
    pub stats: RecordingStats,
}

pub struct Recorder<R> {
    validator: FrameValidator<R>,
    max_frames: Option<usize>,
}

impl<R: Rng> Recorder<R> {
    pub fn new(validator: FrameValidator<R>) -> Self {
        Self {
            validator,
            max_frames: None,
        }
    }

    /// Stop once this many feature vectors were recorded.
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    /// Read `source` to the end, the frame cap, or until `stop` is raised.
    pub fn record<S, P>(
        &mut self,
        source: &mut S,
        policy: &mut P,
        stop: Option<&AtomicBool>,
    ) -> Result<SourceRecording>
    where
        S: PoseSource + ?Sized,
        P: LabelPolicy + ?Sized,
    {
        let mut carry = CarryForward::new();
        let mut stats = RecordingStats::default();
        let mut vectors = Vec::new();
        let mut frame_labels = Vec::new();

        while let Some(obs) = source.next_observation()? {
            stats.observations += 1;
            let validated = self.validator.validate(obs.index, obs.landmarks, &mut carry);
            let vector = match validated {
                ValidatedFrame::Fresh(frame) => {
                    stats.fresh += 1;
                    vectorize(&frame, aspect_ratio(&frame.de_normalize(obs.size)))
                }
                ValidatedFrame::Carried { frame, reason } => {
                    stats.carried += 1;
                    count_rejection(&mut stats, &reason);
                    vectorize_unmeasured(&frame)
                }
                ValidatedFrame::Dropped(reason) => {
                    stats.dropped += 1;
                    count_rejection(&mut stats, &reason);
                    continue;
                }
            };
            frame_labels.push(policy.frame_label(vectors.len()));
            vectors.push(vector);

            if self.max_frames.is_some_and(|max| vectors.len() >= max) {
                log::info!("{}: reached frame cap of {}", source.name(), vectors.len());
                break;
            }
            if stop.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
                log::info!("{}: stop requested after {} frames", source.name(), vectors.len());
                break;
            }
        }

        log::info!(
            "{}: {} observations, {} fresh, {} carried, {} dropped",
            source.name(),
            stats.observations,
            stats.fresh,
            stats.carried,
            stats.dropped
        );
        Ok(SourceRecording {
            name: source.name().to_string(),
            vectors,
            frame_labels,
            stats,
        })
    }

    /// Record a source and window it into a per-source dataset.
    pub fn build<S, P>(
        &mut self,
        source: &mut S,
        spec: WindowSpec,
        policy: &mut P,
    ) -> Result<(Dataset, RecordingStats)>
    where
        S: PoseSource + ?Sized,
        P: LabelPolicy + ?Sized,
    {
        let recording = self.record(source, policy, None)?;
        let dataset = window_recording(&recording, spec, policy)?;
        Ok((dataset, recording.stats))
    }
}

/// Window a finished recording.
pub fn window_recording<P: LabelPolicy + ?Sized>(
    recording: &SourceRecording,
    spec: WindowSpec,
    policy: &mut P,
) -> Result<Dataset> {
    let sequences = build_sequences(&recording.vectors, &recording.frame_labels, spec, policy)?;
    log::info!(
        "{}: {} of {} windows kept ({} frames, stride {})",
        recording.name,
        sequences.len(),
        spec.window_count(recording.vectors.len()),
        spec.length(),
        spec.stride()
    );
    Ok(Dataset::new(sequences))
}

fn count_rejection(stats: &mut RecordingStats, reason: &FrameRejection) {
    match reason {
        FrameRejection::DetectionMiss => stats.detection_misses += 1,
        FrameRejection::OutOfBounds(_) => stats.out_of_bounds += 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{PoseFileConfig, PoseFileSource, PoseObservation};
    use crate::label::{ConstantLabel, SyntheticLabels};
    use crate::landmarks::{ImageSize, LandmarkFrame, Point};
    use crate::validate::InvalidFramePolicy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Scripted {
        observations: Vec<Option<LandmarkFrame>>,
        next: usize,
    }

    impl PoseSource for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn next_observation(&mut self) -> Result<Option<PoseObservation>> {
            let Some(landmarks) = self.observations.get(self.next).copied() else {
                return Ok(None);
            };
            let index = self.next;
            self.next += 1;
            Ok(Some(PoseObservation {
                index,
                size: ImageSize::new(100, 100),
                landmarks,
            }))
        }
    }

    fn upright() -> LandmarkFrame {
        LandmarkFrame {
            front_face: Point::new(0.5, 0.1),
            left_wrist: Point::new(0.4, 0.5),
            right_wrist: Point::new(0.6, 0.5),
            left_shoulder: Point::new(0.45, 0.25),
            right_shoulder: Point::new(0.55, 0.25),
            left_hip: Point::new(0.47, 0.55),
            right_hip: Point::new(0.53, 0.55),
            left_knee: Point::new(0.47, 0.75),
            right_knee: Point::new(0.53, 0.75),
            right_ankle: Point::new(0.53, 0.95),
            left_ankle: Point::new(0.47, 0.95),
        }
    }

    fn recorder(policy: InvalidFramePolicy) -> Recorder<StdRng> {
        Recorder::new(FrameValidator::new(policy, StdRng::seed_from_u64(4)))
    }

    #[test]
    fn carried_frames_have_no_aspect_ratio() -> Result<()> {
        let mut source = Scripted {
            observations: vec![Some(upright()), None, Some(upright())],
            next: 0,
        };
        let mut policy = ConstantLabel::new(Label::Fall);
        let recording =
            recorder(InvalidFramePolicy::CarryForward).record(&mut source, &mut policy, None)?;

        assert_eq!(recording.vectors.len(), 3);
        assert!(recording.vectors[0].aspect_ratio().is_some());
        assert_eq!(recording.vectors[1].aspect_ratio(), None);
        assert_eq!(recording.vectors[1].coords(), recording.vectors[0].coords());
        assert_eq!(recording.stats.carried, 1);
        assert_eq!(recording.stats.detection_misses, 1);
        assert_eq!(recording.frame_labels, vec![Some(Label::Fall); 3]);
        Ok(())
    }

    #[test]
    fn discard_policy_skips_bad_frames() -> Result<()> {
        let mut bad = upright();
        bad.front_face = Point::new(0.5, 0.0);
        let mut source = Scripted {
            observations: vec![Some(upright()), Some(bad), None, Some(upright())],
            next: 0,
        };
        let mut policy = SyntheticLabels::seeded(1);
        let recording =
            recorder(InvalidFramePolicy::Discard).record(&mut source, &mut policy, None)?;
        assert_eq!(recording.vectors.len(), 2);
        assert_eq!(recording.stats.dropped, 2);
        assert_eq!(recording.stats.out_of_bounds, 1);
        Ok(())
    }

    #[test]
    fn frame_cap_and_stop_flag_end_recording() -> Result<()> {
        let mut source = Scripted {
            observations: vec![Some(upright()); 10],
            next: 0,
        };
        let mut policy = ConstantLabel::new(Label::NonFall);
        let recording = recorder(InvalidFramePolicy::Discard)
            .with_max_frames(4)
            .record(&mut source, &mut policy, None)?;
        assert_eq!(recording.vectors.len(), 4);

        let stop = AtomicBool::new(true);
        let recording =
            recorder(InvalidFramePolicy::Discard).record(&mut source, &mut policy, Some(&stop))?;
        assert_eq!(recording.vectors.len(), 1);
        Ok(())
    }

    #[test]
    fn synthetic_recording_builds_full_windows() -> Result<()> {
        let mut source = PoseFileSource::new(PoseFileConfig::new("stub://fall?frames=120"))?;
        let spec = WindowSpec::with_overlap(30, 15)?;
        let mut policy = ConstantLabel::new(Label::Fall);
        let (dataset, stats) =
            recorder(InvalidFramePolicy::CarryForward).build(&mut source, spec, &mut policy)?;

        // 120 frames, none dropped: misses after frame 0 are carried
        assert_eq!(stats.observations, 120);
        assert_eq!(stats.dropped, 0);
        assert_eq!(dataset.len(), spec.window_count(120));
        assert!(dataset.iter().all(|s| s.len() == 30 && s.label == Some(Label::Fall)));
        Ok(())
    }
}
