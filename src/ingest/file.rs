//! Local pose recording source.
//!
//! `PoseFileSource` reads one recording, either a keypoint file on disk or a
//! synthetic `stub://` recording. It is responsible for:
//! - Reading observations in frame order
//! - Reporting missed detections as observations without landmarks
//! - Counting frames for progress logging
//!
//! It MUST NOT fetch remote URLs.

use anyhow::{anyhow, Result};
use std::fs::File;
use std::io::BufReader;

use super::keypoints::KeypointReader;
use super::synthetic::SyntheticPoseSource;
use super::{PoseObservation, PoseSource};
use crate::landmarks::ImageSize;

const DEFAULT_STUB_FRAMES: usize = 300;

/// Configuration for a local pose recording.
#[derive(Clone, Debug)]
pub struct PoseFileConfig {
    /// Keypoint file path, or `stub://<name>[?frames=N]`.
    pub path: String,
    /// Image size reported by synthetic recordings.
    pub stub_size: ImageSize,
    /// Seed for synthetic recordings.
    pub stub_seed: u64,
}

impl Default for PoseFileConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            stub_size: ImageSize::new(640, 480),
            stub_seed: 0,
        }
    }
}

impl PoseFileConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// Local pose recording.
pub struct PoseFileSource {
    name: String,
    backend: PoseBackend,
    observations: u64,
    detections: u64,
}

enum PoseBackend {
    Synthetic(SyntheticPoseSource),
    Keypoints(KeypointReader<BufReader<File>>),
}

impl PoseFileSource {
    pub fn new(config: PoseFileConfig) -> Result<Self> {
        if !is_local_file_path(&config.path) {
            return Err(anyhow!(
                "pose ingestion only supports local paths (no URL schemes)"
            ));
        }
        let backend = if let Some(rest) = config.path.strip_prefix("stub://") {
            let frames = stub_frame_count(rest)?;
            PoseBackend::Synthetic(SyntheticPoseSource::new(
                frames,
                config.stub_size,
                config.stub_seed,
            ))
        } else {
            let file = File::open(&config.path)
                .map_err(|e| anyhow!("failed to open keypoint file {}: {}", config.path, e))?;
            PoseBackend::Keypoints(KeypointReader::new(BufReader::new(file)))
        };
        log::info!("PoseFileSource: opened {}", config.path);
        Ok(Self {
            name: config.path,
            backend,
            observations: 0,
            detections: 0,
        })
    }

    pub fn stats(&self) -> PoseFileStats {
        PoseFileStats {
            observations: self.observations,
            detections: self.detections,
            path: self.name.clone(),
        }
    }
}

impl PoseSource for PoseFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_observation(&mut self) -> Result<Option<PoseObservation>> {
        let observation = match &mut self.backend {
            PoseBackend::Synthetic(source) => source.next_observation(),
            PoseBackend::Keypoints(reader) => reader
                .next_observation()
                .map_err(|e| anyhow!("{}: {}", self.name, e))?,
        };
        if let Some(obs) = &observation {
            self.observations += 1;
            if obs.landmarks.is_some() {
                self.detections += 1;
            }
        }
        Ok(observation)
    }
}

/// Counters for one recording.
#[derive(Clone, Debug)]
pub struct PoseFileStats {
    pub observations: u64,
    pub detections: u64,
    pub path: String,
}

fn stub_frame_count(rest: &str) -> Result<usize> {
    let Some((_, query)) = rest.split_once('?') else {
        return Ok(DEFAULT_STUB_FRAMES);
    };
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix("frames=") {
            return value
                .parse()
                .map_err(|_| anyhow!("stub frames must be an integer, got '{}'", value));
        }
    }
    Ok(DEFAULT_STUB_FRAMES)
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    if path.starts_with("stub://") {
        return true;
    }
    !path.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn stub_source_honours_frame_count() -> Result<()> {
        let mut source = PoseFileSource::new(PoseFileConfig::new("stub://fall?frames=25"))?;
        let mut count = 0;
        while source.next_observation()?.is_some() {
            count += 1;
        }
        assert_eq!(count, 25);
        let stats = source.stats();
        assert_eq!(stats.observations, 25);
        assert_eq!(stats.detections, 24);
        Ok(())
    }

    #[test]
    fn remote_and_empty_paths_are_refused() {
        assert!(PoseFileSource::new(PoseFileConfig::new("rtsp://camera/stream")).is_err());
        assert!(PoseFileSource::new(PoseFileConfig::new("  ")).is_err());
        assert!(PoseFileSource::new(PoseFileConfig::new("stub://x?frames=many")).is_err());
    }

    #[test]
    fn keypoint_file_is_read_line_by_line() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, r#"{{"width": 320, "height": 240, "landmarks": null}}"#)?;
        writeln!(file, r#"{{"width": 320, "height": 240}}"#)?;

        let path = file.path().to_string_lossy().into_owned();
        let mut source = PoseFileSource::new(PoseFileConfig::new(path.clone()))?;
        assert_eq!(source.name(), path);
        let first = source.next_observation()?.expect("first");
        assert_eq!(first.size, ImageSize::new(320, 240));
        assert_eq!(source.next_observation()?.map(|o| o.index), Some(1));
        assert!(source.next_observation()?.is_none());
        assert_eq!(source.stats().detections, 0);
        Ok(())
    }
}
