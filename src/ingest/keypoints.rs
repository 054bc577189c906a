use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::io::BufRead;

use super::PoseObservation;
use crate::landmarks::{ImageSize, LandmarkFrame};

/// One line of a keypoint file.
///
/// ```text
/// {"width": 640, "height": 480, "landmarks": {"front_face": [0.51, 0.12], ...}}
/// {"width": 640, "height": 480, "landmarks": null}
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeypointRecord {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub landmarks: Option<LandmarkFrame>,
}

/// Line-oriented reader over pre-extracted keypoints. Blank lines are skipped.
pub(crate) struct KeypointReader<R> {
    input: R,
    line_no: usize,
    next_index: usize,
    buf: String,
}

impl<R: BufRead> KeypointReader<R> {
    pub(crate) fn new(input: R) -> Self {
        Self {
            input,
            line_no: 0,
            next_index: 0,
            buf: String::new(),
        }
    }

    pub(crate) fn next_observation(&mut self) -> Result<Option<PoseObservation>> {
        loop {
            self.buf.clear();
            if self.input.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }
            let record: KeypointRecord = serde_json::from_str(line)
                .map_err(|e| anyhow!("keypoint line {}: {}", self.line_no, e))?;
            let index = self.next_index;
            self.next_index += 1;
            return Ok(Some(PoseObservation {
                index,
                size: ImageSize::new(record.width, record.height),
                landmarks: record.landmarks,
            }));
        }
    }
}
