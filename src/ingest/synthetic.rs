use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::PoseObservation;
use crate::landmarks::{ImageSize, LandmarkFrame, Point, FEATURE_ORDER};

/// Scripted recording: a subject stands, falls over ten frames, then lies
/// still. Every `miss_every`-th frame has no detection and wrists drop out at
/// random, the way a hand detector loses them mid-fall.
pub(crate) struct SyntheticPoseSource {
    frames: usize,
    fall_at: usize,
    miss_every: usize,
    size: ImageSize,
    rng: StdRng,
    next_index: usize,
}

const FALL_FRAMES: usize = 10;
const WRIST_DROP_PROBABILITY: f64 = 0.3;
const JITTER: f64 = 0.004;

impl SyntheticPoseSource {
    pub(crate) fn new(frames: usize, size: ImageSize, seed: u64) -> Self {
        Self {
            frames,
            fall_at: frames * 3 / 5,
            miss_every: 17,
            size,
            rng: StdRng::seed_from_u64(seed),
            next_index: 0,
        }
    }

    pub(crate) fn next_observation(&mut self) -> Option<PoseObservation> {
        if self.next_index >= self.frames {
            return None;
        }
        let index = self.next_index;
        self.next_index += 1;

        let landmarks = if (index + 1) % self.miss_every == 0 {
            None
        } else {
            Some(self.pose_at(index))
        };
        Some(PoseObservation {
            index,
            size: self.size,
            landmarks,
        })
    }

    fn progress(&self, index: usize) -> f64 {
        if index <= self.fall_at {
            0.0
        } else {
            ((index - self.fall_at) as f64 / FALL_FRAMES as f64).min(1.0)
        }
    }

    fn pose_at(&mut self, index: usize) -> LandmarkFrame {
        let t = self.progress(index);
        let mut frame = LandmarkFrame {
            front_face: blend((0.50, 0.12), (0.18, 0.78), t),
            left_wrist: blend((0.42, 0.50), (0.40, 0.86), t),
            right_wrist: blend((0.58, 0.50), (0.42, 0.74), t),
            left_shoulder: blend((0.45, 0.25), (0.28, 0.80), t),
            right_shoulder: blend((0.55, 0.25), (0.30, 0.74), t),
            left_hip: blend((0.47, 0.52), (0.50, 0.84), t),
            right_hip: blend((0.53, 0.52), (0.52, 0.78), t),
            left_knee: blend((0.47, 0.72), (0.68, 0.86), t),
            right_knee: blend((0.53, 0.72), (0.70, 0.80), t),
            right_ankle: blend((0.53, 0.93), (0.88, 0.82), t),
            left_ankle: blend((0.47, 0.93), (0.86, 0.88), t),
        };

        for key in FEATURE_ORDER {
            let point = frame.get_mut(key);
            point.x = (point.x + self.rng.gen_range(-JITTER..=JITTER)).clamp(0.001, 1.0);
            point.y = (point.y + self.rng.gen_range(-JITTER..=JITTER)).clamp(0.001, 1.0);
        }
        if self.rng.gen_bool(WRIST_DROP_PROBABILITY) {
            frame.left_wrist = Point::NOT_DETECTED;
        }
        if self.rng.gen_bool(WRIST_DROP_PROBABILITY) {
            frame.right_wrist = Point::NOT_DETECTED;
        }
        frame
    }
}

fn blend(from: (f64, f64), to: (f64, f64), t: f64) -> Point {
    Point::new(from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspect::aspect_ratio;
    use crate::validate::{out_of_bounds_keys, repair_wrists};

    #[test]
    fn recording_has_misses_and_ends() {
        let mut source = SyntheticPoseSource::new(40, ImageSize::new(640, 480), 3);
        let observations: Vec<_> = std::iter::from_fn(|| source.next_observation()).collect();
        assert_eq!(observations.len(), 40);
        assert!(observations[16].landmarks.is_none());
        assert!(observations[33].landmarks.is_none());
        assert_eq!(observations.iter().filter(|o| o.landmarks.is_none()).count(), 2);
    }

    #[test]
    fn subject_goes_from_upright_to_lying() {
        let size = ImageSize::new(640, 480);
        let mut source = SyntheticPoseSource::new(100, size, 9);
        let mut first = source.pose_at(0);
        let mut last = source.pose_at(99);
        let mut rng = StdRng::seed_from_u64(0);
        repair_wrists(&mut first, &mut rng);
        repair_wrists(&mut last, &mut rng);

        assert!(out_of_bounds_keys(&first).is_empty());
        assert!(out_of_bounds_keys(&last).is_empty());
        assert!(aspect_ratio(&first.de_normalize(size)) > 1.0);
        assert!(aspect_ratio(&last.de_normalize(size)) <= 1.0);
    }
}
