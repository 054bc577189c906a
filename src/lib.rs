//! Fall detection dataset tools.
//!
//! Turns per-frame body landmarks from an external pose estimator into
//! fixed-length labeled sequences, then merges and normalizes sequences from
//! many recordings into one training file.
//!
//! # Pipeline
//!
//! ```text
//! PoseSource -> FrameValidator -> aspect_ratio -> vectorize
//!            -> WindowSpec / LabelPolicy -> Dataset (per source)
//!            -> merge -> normalize -> codec::write_dataset
//! ```
//!
//! # Module Structure
//!
//! - `landmarks`: fixed-schema landmark frames, pixel conversion
//! - `validate`: wrist imputation, bounds check, carry-forward
//! - `aspect`, `features`: per-frame feature derivation
//! - `window`, `label`, `recorder`: sequence production per source
//! - `merge`, `normalize`, `codec`: corpus assembly and the file format
//! - `ingest`: pose sources
//! - `config`: tool configuration

pub mod aspect;
pub mod codec;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod ingest;
pub mod label;
pub mod landmarks;
pub mod merge;
pub mod normalize;
pub mod recorder;
pub mod validate;
pub mod window;

pub use config::ProcessorConfig;
pub use dataset::{Dataset, DatasetSummary, Label, Sequence};
pub use error::{DatasetError, DatasetResult};
pub use features::{vectorize, FeatureVector, ASPECT_RATIO_INDEX, FEATURE_LEN};
pub use ingest::{PoseFileConfig, PoseFileSource, PoseObservation, PoseSource};
pub use label::{ConstantLabel, Decision, InteractiveReview, LabelPolicy, SyntheticLabels};
pub use landmarks::{ImageSize, LandmarkFrame, LandmarkKey, Point, FEATURE_ORDER};
pub use merge::{merge, MergeReport, Shard};
pub use normalize::{normalize, AspectRange};
pub use recorder::{Recorder, RecordingStats};
pub use validate::{CarryForward, FrameValidator, InvalidFramePolicy};
pub use window::{Candidate, WindowSpec};
