//! Per-frame feature vectors.

use crate::landmarks::{LandmarkFrame, Point, FEATURE_ORDER, LANDMARK_COUNT};

/// Number of coordinate slots (x, y per landmark).
pub const COORD_LEN: usize = LANDMARK_COUNT * 2;

/// Total vector width: coordinates plus the aspect ratio.
pub const FEATURE_LEN: usize = COORD_LEN + 1;

/// Index of the body aspect ratio inside a vector.
pub const ASPECT_RATIO_INDEX: usize = COORD_LEN;

/// 22 landmark coordinates followed by the body aspect ratio.
///
/// The aspect ratio is `None` when the frame carried landmarks forward without
/// a fresh measurement, or when a dataset file stores `null` in slot 22.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureVector {
    coords: [f64; COORD_LEN],
    aspect_ratio: Option<f64>,
}

impl FeatureVector {
    pub fn new(coords: [f64; COORD_LEN], aspect_ratio: Option<f64>) -> Self {
        Self {
            coords,
            aspect_ratio,
        }
    }

    pub fn coords(&self) -> &[f64; COORD_LEN] {
        &self.coords
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        self.aspect_ratio
    }

    pub fn set_aspect_ratio(&mut self, value: Option<f64>) {
        self.aspect_ratio = value;
    }

    /// Slot by position, `0..FEATURE_LEN`. Slot 22 may be `None`.
    pub fn get(&self, index: usize) -> Option<f64> {
        if index < COORD_LEN {
            Some(self.coords[index])
        } else if index == ASPECT_RATIO_INDEX {
            self.aspect_ratio
        } else {
            None
        }
    }

    /// All slots in order.
    pub fn slots(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.coords
            .iter()
            .map(|v| Some(*v))
            .chain(std::iter::once(self.aspect_ratio))
    }

    /// Rebuild the landmark frame from the coordinate slots.
    pub fn to_landmarks(&self) -> LandmarkFrame {
        let mut frame = LandmarkFrame::default();
        for (i, key) in FEATURE_ORDER.iter().enumerate() {
            *frame.get_mut(*key) = Point::new(self.coords[2 * i], self.coords[2 * i + 1]);
        }
        frame
    }
}

fn flatten(frame: &LandmarkFrame) -> [f64; COORD_LEN] {
    let mut coords = [0.0; COORD_LEN];
    for (i, (_, point)) in frame.iter().enumerate() {
        coords[2 * i] = point.x;
        coords[2 * i + 1] = point.y;
    }
    coords
}

/// Flatten a frame in feature order and append its aspect ratio.
pub fn vectorize(frame: &LandmarkFrame, aspect_ratio: f64) -> FeatureVector {
    FeatureVector::new(flatten(frame), Some(aspect_ratio))
}

/// Flatten a frame whose aspect ratio is unknown.
pub fn vectorize_unmeasured(frame: &LandmarkFrame) -> FeatureVector {
    FeatureVector::new(flatten(frame), None)
}
