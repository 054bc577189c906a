//! Global min-max normalization of the aspect ratio slot.

use crate::dataset::Dataset;
use crate::error::{DatasetError, DatasetResult};
use crate::features::ASPECT_RATIO_INDEX;

/// Observed aspect ratio range of a corpus.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AspectRange {
    pub min: f64,
    pub max: f64,
}

impl AspectRange {
    /// Scan every vector once. Null slots are an error: the merger should have
    /// filled them.
    pub fn scan(dataset: &Dataset) -> DatasetResult<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for (s, sequence) in dataset.iter().enumerate() {
            for (f, vector) in sequence.frames.iter().enumerate() {
                let value = vector
                    .aspect_ratio()
                    .ok_or(DatasetError::UnresolvedAspectRatio {
                        sequence: s,
                        frame: f,
                    })?;
                if !value.is_finite() {
                    return Err(DatasetError::NonFiniteValue {
                        sequence: s,
                        frame: f,
                        value,
                    });
                }
                min = min.min(value);
                max = max.max(value);
            }
        }
        if min > max {
            return Err(DatasetError::EmptyDataset);
        }
        Ok(Self { min, max })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn rescale(&self, value: f64) -> f64 {
        (value - self.min) / self.span()
    }
}

/// Rescale every aspect ratio into `[0, 1]` and verify the result.
///
/// Nothing is modified when the range is degenerate.
pub fn normalize(dataset: &mut Dataset) -> DatasetResult<AspectRange> {
    let range = AspectRange::scan(dataset)?;
    if range.span() == 0.0 {
        return Err(DatasetError::DegenerateNormalizationRange { value: range.min });
    }
    log::info!("aspect ratio range: min={} max={}", range.min, range.max);

    for sequence in &mut dataset.sequences {
        for vector in &mut sequence.frames {
            if let Some(value) = vector.aspect_ratio() {
                vector.set_aspect_ratio(Some(range.rescale(value)));
            }
        }
    }

    verify_aspect_ratios(dataset)?;
    Ok(range)
}

/// Every aspect ratio slot holds a value in `[0, 1]`.
pub fn verify_aspect_ratios(dataset: &Dataset) -> DatasetResult<()> {
    for (s, sequence) in dataset.iter().enumerate() {
        for (f, vector) in sequence.frames.iter().enumerate() {
            let value = vector
                .aspect_ratio()
                .ok_or(DatasetError::UnresolvedAspectRatio {
                    sequence: s,
                    frame: f,
                })?;
            if !(0.0..=1.0).contains(&value) {
                return Err(DatasetError::NormalizedOutOfRange {
                    sequence: s,
                    frame: f,
                    slot: ASPECT_RATIO_INDEX,
                    value,
                });
            }
        }
    }
    Ok(())
}

/// Every slot of every vector lies in `[0, 1]`.
///
/// Stricter than [`verify_aspect_ratios`]: landmark coordinates carried into a
/// dataset despite a failed bounds check show up here.
pub fn verify_all_features(dataset: &Dataset) -> DatasetResult<()> {
    for (s, sequence) in dataset.iter().enumerate() {
        for (f, vector) in sequence.frames.iter().enumerate() {
            for (slot, value) in vector.slots().enumerate() {
                let value = value.ok_or(DatasetError::UnresolvedAspectRatio {
                    sequence: s,
                    frame: f,
                })?;
                if !(0.0..=1.0).contains(&value) {
                    return Err(DatasetError::NormalizedOutOfRange {
                        sequence: s,
                        frame: f,
                        slot,
                        value,
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Label, Sequence};
    use crate::features::{FeatureVector, COORD_LEN};

    fn dataset(ars: &[&[Option<f64>]]) -> Dataset {
        Dataset::new(
            ars.iter()
                .map(|seq| {
                    Sequence::new(
                        seq.iter()
                            .map(|ar| FeatureVector::new([0.25; COORD_LEN], *ar))
                            .collect(),
                        Some(Label::Fall),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn extremes_map_to_zero_and_one() {
        let mut data = dataset(&[&[Some(2.0), Some(0.5)], &[Some(8.0), Some(5.0)]]);
        let range = normalize(&mut data).unwrap();

        assert_eq!(range, AspectRange { min: 0.5, max: 8.0 });
        let values: Vec<f64> = data
            .iter()
            .flat_map(|s| s.frames.iter().map(|v| v.aspect_ratio().unwrap()))
            .collect();
        assert_eq!(values[1], 0.0);
        assert_eq!(values[2], 1.0);
        assert_eq!(values[0], 0.2);
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(verify_all_features(&data).is_ok());
    }

    #[test]
    fn degenerate_range_is_an_error_and_leaves_data_alone() {
        let mut data = dataset(&[&[Some(3.0), Some(3.0)]]);
        let before = data.clone();
        match normalize(&mut data) {
            Err(DatasetError::DegenerateNormalizationRange { value }) => assert_eq!(value, 3.0),
            other => panic!("expected degenerate range, got {:?}", other),
        }
        assert_eq!(data, before);
    }

    #[test]
    fn null_slot_is_reported() {
        let mut data = dataset(&[&[Some(1.0), None]]);
        assert!(matches!(
            normalize(&mut data),
            Err(DatasetError::UnresolvedAspectRatio { sequence: 0, frame: 1 })
        ));
    }

    #[test]
    fn empty_dataset_has_no_range() {
        assert!(matches!(
            AspectRange::scan(&Dataset::default()),
            Err(DatasetError::EmptyDataset)
        ));
    }

    #[test]
    fn aspect_ratio_outside_unit_range_fails_verification() {
        let data = dataset(&[&[Some(0.0), Some(1.0)], &[Some(0.5), Some(1.5)]]);
        match verify_aspect_ratios(&data) {
            Err(DatasetError::NormalizedOutOfRange {
                sequence,
                frame,
                slot,
                value,
            }) => {
                assert_eq!((sequence, frame, slot), (1, 1, ASPECT_RATIO_INDEX));
                assert_eq!(value, 1.5);
            }
            other => panic!("expected out-of-range error, got {:?}", other),
        }

        let negative = dataset(&[&[Some(-0.25)]]);
        assert!(matches!(
            verify_aspect_ratios(&negative),
            Err(DatasetError::NormalizedOutOfRange { sequence: 0, frame: 0, .. })
        ));
        assert!(verify_aspect_ratios(&dataset(&[&[Some(0.0), Some(1.0)]])).is_ok());
    }

    #[test]
    fn out_of_range_coordinate_fails_full_check() {
        let mut data = dataset(&[&[Some(0.5)]]);
        let mut coords = [0.25; COORD_LEN];
        coords[4] = 1.25;
        data.sequences[0].frames[0] = FeatureVector::new(coords, Some(0.5));
        assert!(verify_aspect_ratios(&data).is_ok());
        assert!(matches!(
            verify_all_features(&data),
            Err(DatasetError::NormalizedOutOfRange { slot: 4, .. })
        ));
    }
}
