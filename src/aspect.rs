//! Body aspect ratio.
//!
//! Vertical over horizontal extent between the shoulders and the opposite
//! knees, measured in pixels. Above 1 reads as upright, at or below 1 as
//! lying down. No smoothing happens here.

use crate::landmarks::{LandmarkKey, PixelLandmarks};

/// Vertical and horizontal shoulder-to-knee extents in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BodyExtent {
    pub vertical: i64,
    pub horizontal: i64,
}

pub fn body_extent(landmarks: &PixelLandmarks) -> BodyExtent {
    let left_shoulder = landmarks.get(LandmarkKey::LeftShoulder);
    let right_shoulder = landmarks.get(LandmarkKey::RightShoulder);
    let left_knee = landmarks.get(LandmarkKey::LeftKnee);
    let right_knee = landmarks.get(LandmarkKey::RightKnee);

    let vertical = (left_shoulder.y - right_knee.y)
        .abs()
        .max((right_shoulder.y - left_knee.y).abs());
    let horizontal = (left_shoulder.x - right_knee.x)
        .abs()
        .max((right_shoulder.x - left_knee.x).abs());

    BodyExtent {
        vertical,
        horizontal,
    }
}

/// Aspect ratio of a pixel-space frame. A zero horizontal extent counts as 1px.
pub fn aspect_ratio(landmarks: &PixelLandmarks) -> f64 {
    let BodyExtent {
        vertical,
        mut horizontal,
    } = body_extent(landmarks);
    if horizontal == 0 {
        log::debug!("adjusting body aspect ratio {}/0 to {}/1", vertical, vertical);
        horizontal = 1;
    }
    vertical as f64 / horizontal as f64
}
