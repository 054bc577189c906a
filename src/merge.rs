//! Cross-source dataset merging.
//!
//! Shards are concatenated in the order given, the aspect ratio slot of every
//! vector is repaired, the total count is cross-checked and the corpus is
//! shuffled. Source identity is not kept in the result.

use rand::seq::SliceRandom;
use rand::Rng;
use std::path::{Path, PathBuf};

use crate::codec;
use crate::dataset::Dataset;
use crate::error::{DatasetError, DatasetResult};

/// Aspect ratios above this are assumed to be raw pixel extents.
pub const ASPECT_OUTLIER_THRESHOLD: f64 = 40.0;

/// Assumed body width in pixels used to rescale outliers.
pub const ASPECT_OUTLIER_DIVISOR: f64 = 10.0;

/// One per-source dataset waiting to be merged.
#[derive(Clone, Debug)]
pub struct Shard {
    pub name: String,
    pub dataset: Dataset,
}

impl Shard {
    pub fn new(name: impl Into<String>, dataset: Dataset) -> Self {
        Self {
            name: name.into(),
            dataset,
        }
    }
}

/// What the aspect ratio repair changed in one source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RepairStats {
    /// Null slots filled from the previous frame.
    pub filled: usize,
    /// Outliers divided down.
    pub rescaled: usize,
    /// Null slots with no previous value in the source.
    pub unresolved: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceReport {
    pub name: String,
    pub sequences: usize,
    pub repair: RepairStats,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub sources: Vec<SourceReport>,
    pub total: usize,
}

/// Forward-fill missing aspect ratios and rescale outliers, in traversal order.
///
/// The fill value is seeded per source: a null before the first measured
/// value stays null.
pub fn repair_aspect_ratios(dataset: &mut Dataset) -> RepairStats {
    let mut stats = RepairStats::default();
    let mut previous: Option<f64> = None;

    for sequence in &mut dataset.sequences {
        for vector in &mut sequence.frames {
            let repaired = match vector.aspect_ratio() {
                None => {
                    if previous.is_some() {
                        stats.filled += 1;
                    } else {
                        stats.unresolved += 1;
                    }
                    previous
                }
                Some(value) if value > ASPECT_OUTLIER_THRESHOLD => {
                    stats.rescaled += 1;
                    Some(value / ASPECT_OUTLIER_DIVISOR)
                }
                Some(value) => Some(value),
            };
            vector.set_aspect_ratio(repaired);
            previous = repaired;
        }
    }
    stats
}

/// Merge shards into one shuffled corpus.
///
/// Fails with [`DatasetError::MergeCountMismatch`] when the merged corpus does
/// not hold exactly the sum of the shard sizes.
pub fn merge<R: Rng + ?Sized>(
    shards: Vec<Shard>,
    rng: &mut R,
) -> DatasetResult<(Dataset, MergeReport)> {
    let expected: usize = shards.iter().map(|shard| shard.dataset.len()).sum();
    let mut merged = Dataset::new(Vec::with_capacity(expected));
    let mut report = MergeReport::default();

    for mut shard in shards {
        let repair = repair_aspect_ratios(&mut shard.dataset);
        if repair.unresolved > 0 {
            log::warn!(
                "{}: {} aspect ratio slots have no earlier value to fill from",
                shard.name,
                repair.unresolved
            );
        }
        log::info!(
            "{}: {} sequences, {} filled, {} rescaled",
            shard.name,
            shard.dataset.len(),
            repair.filled,
            repair.rescaled
        );
        report.sources.push(SourceReport {
            name: shard.name,
            sequences: shard.dataset.len(),
            repair,
        });
        merged.sequences.append(&mut shard.dataset.sequences);
    }

    if merged.len() != expected {
        return Err(DatasetError::MergeCountMismatch {
            expected,
            actual: merged.len(),
        });
    }

    merged.sequences.shuffle(rng);
    report.total = merged.len();
    Ok((merged, report))
}

/// Read every dataset file in `dir`, sorted by file name.
pub fn load_shards(dir: &Path) -> DatasetResult<Vec<Shard>> {
    let entries = std::fs::read_dir(dir).map_err(|e| DatasetError::io(dir, e))?;
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DatasetError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut shards = Vec::with_capacity(paths.len());
    for path in paths {
        let dataset = codec::read_dataset(&path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        shards.push(Shard::new(name, dataset));
    }
    Ok(shards)
}
