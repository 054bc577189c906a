//! Pose observation sources.
//!
//! Everything upstream of validation lives here:
//! - Keypoint files: landmarks already extracted by an external pose model,
//!   one JSON object per frame
//! - Synthetic `stub://` recordings (tests, demos)
//! - An adapter joining any [`FrameSource`] with a [`PoseExtractor`]
//!
//! Sources yield observations in frame order and are owned by a single
//! recorder. A missed detection is an observation without landmarks, never an
//! error.

mod extract;
pub mod file;
mod keypoints;
mod synthetic;

pub use extract::{ExtractingSource, Frame, FrameSource, PoseExtractor};
pub use file::{PoseFileConfig, PoseFileSource, PoseFileStats};
pub use keypoints::KeypointRecord;

use anyhow::Result;

use crate::landmarks::{ImageSize, LandmarkFrame};

/// Output of the pose extractor for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct PoseObservation {
    /// Position of the frame in its source, starting at 0.
    pub index: usize,
    pub size: ImageSize,
    /// `None` when no body was detected.
    pub landmarks: Option<LandmarkFrame>,
}

/// Ordered stream of pose observations from one recording.
pub trait PoseSource {
    fn name(&self) -> &str;

    /// Next observation, or `None` at the end of the recording.
    fn next_observation(&mut self) -> Result<Option<PoseObservation>>;
}
