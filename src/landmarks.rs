//! Body landmark model.
//!
//! A `LandmarkFrame` holds the eleven body points the dataset is built from,
//! in normalized image coordinates. `PixelLandmarks` is the de-normalized form
//! used for the aspect ratio and for visual checks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of body points per frame.
pub const LANDMARK_COUNT: usize = 11;

/// Named body keypoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkKey {
    FrontFace,
    LeftWrist,
    RightWrist,
    LeftShoulder,
    RightShoulder,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    RightAnkle,
    LeftAnkle,
}

/// Order in which keys are flattened into a feature vector.
///
/// Ankles are right-then-left. Consumers index vectors positionally, so this
/// order must never change.
pub const FEATURE_ORDER: [LandmarkKey; LANDMARK_COUNT] = [
    LandmarkKey::FrontFace,
    LandmarkKey::LeftWrist,
    LandmarkKey::RightWrist,
    LandmarkKey::LeftShoulder,
    LandmarkKey::RightShoulder,
    LandmarkKey::LeftHip,
    LandmarkKey::RightHip,
    LandmarkKey::LeftKnee,
    LandmarkKey::RightKnee,
    LandmarkKey::RightAnkle,
    LandmarkKey::LeftAnkle,
];

impl LandmarkKey {
    pub fn as_str(self) -> &'static str {
        match self {
            LandmarkKey::FrontFace => "front_face",
            LandmarkKey::LeftWrist => "left_wrist",
            LandmarkKey::RightWrist => "right_wrist",
            LandmarkKey::LeftShoulder => "left_shoulder",
            LandmarkKey::RightShoulder => "right_shoulder",
            LandmarkKey::LeftHip => "left_hip",
            LandmarkKey::RightHip => "right_hip",
            LandmarkKey::LeftKnee => "left_knee",
            LandmarkKey::RightKnee => "right_knee",
            LandmarkKey::RightAnkle => "right_ankle",
            LandmarkKey::LeftAnkle => "left_ankle",
        }
    }

    /// Position of this key in [`FEATURE_ORDER`].
    pub fn feature_index(self) -> usize {
        match self {
            LandmarkKey::FrontFace => 0,
            LandmarkKey::LeftWrist => 1,
            LandmarkKey::RightWrist => 2,
            LandmarkKey::LeftShoulder => 3,
            LandmarkKey::RightShoulder => 4,
            LandmarkKey::LeftHip => 5,
            LandmarkKey::RightHip => 6,
            LandmarkKey::LeftKnee => 7,
            LandmarkKey::RightKnee => 8,
            LandmarkKey::RightAnkle => 9,
            LandmarkKey::LeftAnkle => 10,
        }
    }
}

impl fmt::Display for LandmarkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LandmarkKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FEATURE_ORDER
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown landmark key '{}'", s))
    }
}

/// Normalized 2D coordinate. Serialized as `[x, y]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Sentinel the extractor uses for an undetected point.
    pub const NOT_DETECTED: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_not_detected(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// `0 < x <= 1` and `0 < y <= 1`.
    pub fn in_bounds(&self) -> bool {
        self.x > 0.0 && self.x <= 1.0 && self.y > 0.0 && self.y <= 1.0
    }
}

impl From<[f64; 2]> for Point {
    fn from(value: [f64; 2]) -> Self {
        Point::new(value[0], value[1])
    }
}

impl From<Point> for [f64; 2] {
    fn from(value: Point) -> Self {
        [value.x, value.y]
    }
}

/// Image dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// One frame of body landmarks in normalized coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    pub front_face: Point,
    pub left_wrist: Point,
    pub right_wrist: Point,
    pub left_shoulder: Point,
    pub right_shoulder: Point,
    pub left_hip: Point,
    pub right_hip: Point,
    pub left_knee: Point,
    pub right_knee: Point,
    pub right_ankle: Point,
    pub left_ankle: Point,
}

impl LandmarkFrame {
    pub fn get(&self, key: LandmarkKey) -> Point {
        match key {
            LandmarkKey::FrontFace => self.front_face,
            LandmarkKey::LeftWrist => self.left_wrist,
            LandmarkKey::RightWrist => self.right_wrist,
            LandmarkKey::LeftShoulder => self.left_shoulder,
            LandmarkKey::RightShoulder => self.right_shoulder,
            LandmarkKey::LeftHip => self.left_hip,
            LandmarkKey::RightHip => self.right_hip,
            LandmarkKey::LeftKnee => self.left_knee,
            LandmarkKey::RightKnee => self.right_knee,
            LandmarkKey::RightAnkle => self.right_ankle,
            LandmarkKey::LeftAnkle => self.left_ankle,
        }
    }

    pub fn get_mut(&mut self, key: LandmarkKey) -> &mut Point {
        match key {
            LandmarkKey::FrontFace => &mut self.front_face,
            LandmarkKey::LeftWrist => &mut self.left_wrist,
            LandmarkKey::RightWrist => &mut self.right_wrist,
            LandmarkKey::LeftShoulder => &mut self.left_shoulder,
            LandmarkKey::RightShoulder => &mut self.right_shoulder,
            LandmarkKey::LeftHip => &mut self.left_hip,
            LandmarkKey::RightHip => &mut self.right_hip,
            LandmarkKey::LeftKnee => &mut self.left_knee,
            LandmarkKey::RightKnee => &mut self.right_knee,
            LandmarkKey::RightAnkle => &mut self.right_ankle,
            LandmarkKey::LeftAnkle => &mut self.left_ankle,
        }
    }

    /// Points in [`FEATURE_ORDER`].
    pub fn iter(&self) -> impl Iterator<Item = (LandmarkKey, Point)> + '_ {
        FEATURE_ORDER.iter().map(move |&key| (key, self.get(key)))
    }

    /// Convert to pixel space. Coordinates are truncated toward zero.
    pub fn de_normalize(&self, size: ImageSize) -> PixelLandmarks {
        let mut points = [PixelPoint::default(); LANDMARK_COUNT];
        for (key, point) in self.iter() {
            points[key.feature_index()] = PixelPoint {
                x: (point.x * f64::from(size.width)) as i64,
                y: (point.y * f64::from(size.height)) as i64,
            };
        }
        PixelLandmarks { points }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PixelPoint {
    pub x: i64,
    pub y: i64,
}

/// Landmarks in pixel coordinates, indexed by [`LandmarkKey`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelLandmarks {
    points: [PixelPoint; LANDMARK_COUNT],
}

impl PixelLandmarks {
    pub fn get(&self, key: LandmarkKey) -> PixelPoint {
        self.points[key.feature_index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (LandmarkKey, PixelPoint)> + '_ {
        FEATURE_ORDER.iter().map(move |&key| (key, self.get(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_index_matches_order() {
        for (i, key) in FEATURE_ORDER.iter().enumerate() {
            assert_eq!(key.feature_index(), i);
            assert_eq!(key.as_str().parse::<LandmarkKey>().unwrap(), *key);
        }
    }

    #[test]
    fn point_bounds_exclude_zero_and_accept_one() {
        assert!(Point::new(1.0, 1.0).in_bounds());
        assert!(!Point::new(0.0, 0.5).in_bounds());
        assert!(!Point::new(0.5, 1.0001).in_bounds());
        assert!(Point::NOT_DETECTED.is_not_detected());
    }

    #[test]
    fn de_normalize_truncates() {
        let mut frame = LandmarkFrame::default();
        frame.left_knee = Point::new(0.5, 0.999);
        let pixels = frame.de_normalize(ImageSize::new(641, 480));
        assert_eq!(pixels.get(LandmarkKey::LeftKnee), PixelPoint { x: 320, y: 479 });
    }

    #[test]
    fn frame_json_uses_named_pairs() {
        let mut frame = LandmarkFrame::default();
        frame.front_face = Point::new(0.25, 0.5);
        let json = serde_json::to_value(frame).unwrap();
        assert_eq!(json["front_face"], serde_json::json!([0.25, 0.5]));
        let back: LandmarkFrame = serde_json::from_value(json).unwrap();
        assert_eq!(back, frame);
    }
}
