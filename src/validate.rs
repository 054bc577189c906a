//! Frame validation and repair.
//!
//! Hand detectors lose the wrists far more often than the body detector loses
//! the torso, especially mid-fall. A missing wrist is imputed from the hip on
//! the same side; every other key must already be inside the image.

use rand::Rng;

use crate::landmarks::{LandmarkFrame, LandmarkKey, Point};

/// Lower and upper bound of the per-axis wrist jitter.
pub const WRIST_JITTER_MIN: f64 = 0.001;
pub const WRIST_JITTER_MAX: f64 = 0.01;

/// Which wrists were imputed by [`repair_wrists`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WristRepair {
    pub left: bool,
    pub right: bool,
}

/// Replace sentinel wrists with the same-side hip plus a small positive jitter.
///
/// One jitter pair is drawn per call and shared by both wrists.
pub fn repair_wrists<R: Rng + ?Sized>(frame: &mut LandmarkFrame, rng: &mut R) -> WristRepair {
    let jitter_x = rng.gen_range(WRIST_JITTER_MIN..=WRIST_JITTER_MAX);
    let jitter_y = rng.gen_range(WRIST_JITTER_MIN..=WRIST_JITTER_MAX);
    let mut repair = WristRepair::default();

    if frame.left_wrist.is_not_detected() {
        frame.left_wrist = Point::new(frame.left_hip.x + jitter_x, frame.left_hip.y + jitter_y);
        repair.left = true;
    }
    if frame.right_wrist.is_not_detected() {
        frame.right_wrist = Point::new(frame.right_hip.x + jitter_x, frame.right_hip.y + jitter_y);
        repair.right = true;
    }
    repair
}

/// Keys whose coordinates fall outside `(0, 1]`, in feature order.
pub fn out_of_bounds_keys(frame: &LandmarkFrame) -> Vec<LandmarkKey> {
    frame
        .iter()
        .filter(|(_, point)| !point.in_bounds())
        .map(|(key, _)| key)
        .collect()
}

/// First key that fails the bounds check.
pub fn check_bounds(frame: &LandmarkFrame) -> Result<(), LandmarkKey> {
    match out_of_bounds_keys(frame).first() {
        Some(key) => Err(*key),
        None => Ok(()),
    }
}

/// Why a frame produced no usable landmarks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameRejection {
    /// The extractor found no body.
    DetectionMiss,
    /// Detected, but these keys are outside the image.
    OutOfBounds(Vec<LandmarkKey>),
}

/// What to do with a frame that was missed or failed the bounds check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InvalidFramePolicy {
    /// Substitute the last valid frame for misses and invalid frames.
    #[default]
    CarryForward,
    /// Drop misses and invalid frames.
    Discard,
    /// Keep invalid frames after logging them; carry forward only on misses.
    Report,
}

/// Last usable frame of one source.
///
/// Owned by the caller and scoped to a single source so nothing leaks between
/// recordings.
#[derive(Clone, Debug, Default)]
pub struct CarryForward {
    last: Option<LandmarkFrame>,
}

impl CarryForward {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remember(&mut self, frame: LandmarkFrame) {
        self.last = Some(frame);
    }

    pub fn last(&self) -> Option<LandmarkFrame> {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Outcome of validating one observation.
#[derive(Clone, Debug, PartialEq)]
pub enum ValidatedFrame {
    /// Landmarks measured in this frame.
    Fresh(LandmarkFrame),
    /// Landmarks reused from an earlier frame.
    Carried {
        frame: LandmarkFrame,
        reason: FrameRejection,
    },
    /// Nothing usable.
    Dropped(FrameRejection),
}

impl ValidatedFrame {
    pub fn landmarks(&self) -> Option<&LandmarkFrame> {
        match self {
            ValidatedFrame::Fresh(frame) | ValidatedFrame::Carried { frame, .. } => Some(frame),
            ValidatedFrame::Dropped(_) => None,
        }
    }
}

/// Applies wrist repair, the bounds check and the invalid-frame policy.
pub struct FrameValidator<R> {
    policy: InvalidFramePolicy,
    rng: R,
}

impl<R: Rng> FrameValidator<R> {
    pub fn new(policy: InvalidFramePolicy, rng: R) -> Self {
        Self { policy, rng }
    }

    pub fn policy(&self) -> InvalidFramePolicy {
        self.policy
    }

    pub fn validate(
        &mut self,
        frame_index: usize,
        detected: Option<LandmarkFrame>,
        carry: &mut CarryForward,
    ) -> ValidatedFrame {
        let Some(mut frame) = detected else {
            return self.fallback(frame_index, FrameRejection::DetectionMiss, carry);
        };

        let repair = repair_wrists(&mut frame, &mut self.rng);
        if repair.left || repair.right {
            log::debug!(
                "frame {}: imputed wrists from hips (left={}, right={})",
                frame_index,
                repair.left,
                repair.right
            );
        }

        let bad_keys = out_of_bounds_keys(&frame);
        if bad_keys.is_empty() {
            carry.remember(frame);
            return ValidatedFrame::Fresh(frame);
        }

        log::warn!(
            "frame {}: {} landmarks are out of image",
            frame_index,
            join_keys(&bad_keys)
        );
        match self.policy {
            InvalidFramePolicy::Report => {
                carry.remember(frame);
                ValidatedFrame::Fresh(frame)
            }
            _ => self.fallback(frame_index, FrameRejection::OutOfBounds(bad_keys), carry),
        }
    }

    fn fallback(
        &self,
        frame_index: usize,
        reason: FrameRejection,
        carry: &CarryForward,
    ) -> ValidatedFrame {
        if self.policy == InvalidFramePolicy::Discard {
            return ValidatedFrame::Dropped(reason);
        }
        match carry.last() {
            Some(frame) => {
                log::debug!("frame {}: carrying forward last valid landmarks", frame_index);
                ValidatedFrame::Carried { frame, reason }
            }
            None => {
                log::warn!(
                    "frame {}: {:?} before any valid frame, dropping",
                    frame_index,
                    reason
                );
                ValidatedFrame::Dropped(reason)
            }
        }
    }
}

fn join_keys(keys: &[LandmarkKey]) -> String {
    keys.iter()
        .map(|key| key.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
