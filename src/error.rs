//! Error taxonomy for the dataset pipeline.
//!
//! Recoverable per-frame problems (detection misses, out-of-bounds landmarks)
//! are reported through [`crate::validate::FrameRejection`] and handled by the
//! caller. Everything here aborts the current operation and is surfaced to the
//! tool that invoked it.

use std::path::PathBuf;

use thiserror::Error;

use crate::landmarks::LandmarkKey;

/// Result alias for library operations.
pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Error)]
pub enum DatasetError {
    /// A detected landmark lies outside the `(0, 1]` image bounds.
    #[error("landmark {key} out of image bounds at frame {frame_index}")]
    OutOfBoundsLandmark { key: LandmarkKey, frame_index: usize },

    /// Every aspect ratio in the corpus has the same value.
    #[error("degenerate aspect ratio range: min == max == {value}")]
    DegenerateNormalizationRange { value: f64 },

    /// Merged corpus does not hold the sum of the per-source counts.
    #[error("merge count mismatch: expected {expected} sequences, got {actual}")]
    MergeCountMismatch { expected: usize, actual: usize },

    /// Reading or writing a dataset file failed.
    #[error("dataset i/o failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is valid JSON but not a dataset.
    #[error("malformed dataset: {0}")]
    Format(String),

    #[error("invalid dataset json: {0}")]
    Json(#[from] serde_json::Error),

    /// An aspect ratio slot is still null where a value is required.
    #[error("unresolved aspect ratio in sequence {sequence} frame {frame}")]
    UnresolvedAspectRatio { sequence: usize, frame: usize },

    /// A value fell outside `[0, 1]` after normalization.
    #[error("value {value} outside [0, 1] in sequence {sequence} frame {frame} slot {slot}")]
    NormalizedOutOfRange {
        sequence: usize,
        frame: usize,
        slot: usize,
        value: f64,
    },

    /// A sequence reached export without a label.
    #[error("sequence {sequence} has no label")]
    UnlabeledSequence { sequence: usize },

    /// NaN or infinity cannot be written to the dataset format.
    #[error("non-finite value {value} in sequence {sequence} frame {frame}")]
    NonFiniteValue {
        sequence: usize,
        frame: usize,
        value: f64,
    },

    #[error("invalid window: {0}")]
    InvalidWindow(String),

    #[error("dataset is empty")]
    EmptyDataset,
}

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatasetError::Io {
            path: path.into(),
            source,
        }
    }
}
