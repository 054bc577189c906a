//! On-disk dataset format.
//!
//! A JSON array of sequences, each an array of 23-slot vectors followed by the
//! integer label. Layout is fixed for downstream readers that index it
//! naively:
//!
//! ```text
//! [
//!   [
//!     [0.5, 0.25, ..., 1.75],
//!     [0.5, 0.25, ..., null],
//!     1
//!   ],
//!   [
//!     ...
//!   ]
//! ]
//! ```
//!
//! Vectors are printed on one line with `", "` separators and floats in
//! shortest round-trip form (`0.1`, `1.0`, `1e-05`, `1.5e+16`).
//!
//! Writes go to a temporary sibling file that is renamed into place, so a
//! failed write never leaves a truncated dataset behind.

use serde_json::Value;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::dataset::{Dataset, Label, Sequence};
use crate::error::{DatasetError, DatasetResult};
use crate::features::{FeatureVector, COORD_LEN, FEATURE_LEN};

/// Render one float the way the dataset format expects.
///
/// Positional notation for decimal exponents in `-4..16`, scientific with a
/// signed two-digit exponent otherwise. Both forms print the same shortest
/// round-trip digits.
pub fn format_float(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() {
            "-0.0".to_string()
        } else {
            "0.0".to_string()
        };
    }
    let sign = if value.is_sign_negative() { "-" } else { "" };
    let (digits, exp) = shortest_digits(value.abs());

    if (-4..16).contains(&exp) {
        return format!("{}{}", sign, positional(&digits, exp));
    }
    let (first, rest) = digits.split_at(1);
    let mantissa = if rest.is_empty() {
        first.to_string()
    } else {
        format!("{}.{}", first, rest)
    };
    let exp_sign = if exp < 0 { '-' } else { '+' };
    format!("{}{}e{}{:02}", sign, mantissa, exp_sign, exp.abs())
}

/// Shortest round-trip significand digits and decimal exponent of a positive
/// finite value, so that `value == 0.d0d1d2... * 10^(exp + 1)`.
///
/// When two digit strings of that length are equally close, the one ending
/// in an even digit wins.
fn shortest_digits(value: f64) -> (String, i32) {
    let scientific = format!("{:e}", value);
    let (mantissa, exp) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let mut digits: Vec<u8> = mantissa.bytes().filter(u8::is_ascii_digit).collect();

    let Some(&last) = digits.last() else {
        return (String::from("0"), exp);
    };
    let last = last - b'0';
    if last % 2 == 1 {
        let significand = digits
            .iter()
            .try_fold(0u64, |acc, d| acc.checked_mul(10)?.checked_add(u64::from(d - b'0')));
        if let Some(significand) = significand {
            // half a unit in the last printed place sits one decimal place lower
            let half_exp = exp - digits.len() as i32;
            let below = significand.checked_mul(10).and_then(|m| m.checked_sub(5));
            let above = significand.checked_mul(10).and_then(|m| m.checked_add(5));
            let n = digits.len() - 1;
            if below.is_some_and(|m| is_exactly(value, m, half_exp)) {
                digits[n] -= 1;
            } else if last < 9 && above.is_some_and(|m| is_exactly(value, m, half_exp)) {
                digits[n] += 1;
            }
        }
    }
    (String::from_utf8_lossy(&digits).into_owned(), exp)
}

/// `digits * 10^exp` written out without an exponent.
fn positional(digits: &str, exp: i32) -> String {
    if exp < 0 {
        let zeros = "0".repeat((-exp - 1) as usize);
        return format!("0.{}{}", zeros, digits);
    }
    let int_len = exp as usize + 1;
    if digits.len() <= int_len {
        format!("{}{}.0", digits, "0".repeat(int_len - digits.len()))
    } else {
        let (int_part, frac_part) = digits.split_at(int_len);
        format!("{}.{}", int_part, frac_part)
    }
}

/// Whether a positive finite `value` equals `m * 10^exp` exactly.
fn is_exactly(value: f64, m: u64, exp: i32) -> bool {
    let bits = value.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    // value == mant * 2^k
    let (mant, k) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };

    // m * 5^exp * 2^exp == mant * 2^k, every power moved to the side where it
    // is non-negative
    let twos = exp - k;
    let lhs = scale(u128::from(m), exp.max(0), twos.max(0));
    let rhs = scale(u128::from(mant), (-exp).max(0), (-twos).max(0));
    matches!((lhs, rhs), (Some(l), Some(r)) if l == r)
}

fn scale(base: u128, fives: i32, twos: i32) -> Option<u128> {
    let fives = 5u128.checked_pow(u32::try_from(fives).ok()?)?;
    let twos = 2u128.checked_pow(u32::try_from(twos).ok()?)?;
    base.checked_mul(fives)?.checked_mul(twos)
}

fn format_vector(
    out: &mut String,
    vector: &FeatureVector,
    sequence: usize,
    frame: usize,
) -> DatasetResult<()> {
    out.push('[');
    for (slot, value) in vector.slots().enumerate() {
        if slot > 0 {
            out.push_str(", ");
        }
        match value {
            Some(v) if !v.is_finite() => {
                return Err(DatasetError::NonFiniteValue {
                    sequence,
                    frame,
                    value: v,
                })
            }
            Some(v) => out.push_str(&format_float(v)),
            None => out.push_str("null"),
        }
    }
    out.push(']');
    Ok(())
}

/// Render a dataset to its exact text form.
///
/// Every sequence must be labeled; values must be finite.
pub fn render_dataset(dataset: &Dataset) -> DatasetResult<String> {
    let mut out = String::from("[\n");
    let last_sequence = dataset.len().saturating_sub(1);

    for (s, sequence) in dataset.iter().enumerate() {
        let label = sequence
            .label
            .ok_or(DatasetError::UnlabeledSequence { sequence: s })?;
        out.push_str("  [\n");
        for (f, vector) in sequence.frames.iter().enumerate() {
            out.push_str("    ");
            format_vector(&mut out, vector, s, f)?;
            out.push_str(",\n");
        }
        out.push_str(&format!("    {}\n", label.value()));
        out.push_str(if s < last_sequence { "  ],\n" } else { "  ]\n" });
    }
    out.push_str("]\n");
    Ok(out)
}

/// Write a dataset, replacing `path` only once the full content is on disk.
pub fn write_dataset(path: &Path, dataset: &Dataset) -> DatasetResult<()> {
    let text = render_dataset(dataset)?;
    write_atomic(path, text.as_bytes())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    path.with_file_name(format!(".{}.partial", name))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> DatasetResult<()> {
    let tmp = temp_path(path);
    let result = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(DatasetError::io(path, e));
    }
    Ok(())
}

fn parse_vector(value: &Value, sequence: usize, frame: usize) -> DatasetResult<FeatureVector> {
    let slots = value.as_array().ok_or_else(|| {
        DatasetError::Format(format!("sequence {sequence} frame {frame} is not an array"))
    })?;
    if slots.len() != FEATURE_LEN {
        return Err(DatasetError::Format(format!(
            "sequence {sequence} frame {frame} has {} values, expected {FEATURE_LEN}",
            slots.len()
        )));
    }

    let mut coords = [0.0; COORD_LEN];
    for (slot, coord) in coords.iter_mut().enumerate() {
        *coord = slots[slot].as_f64().ok_or_else(|| {
            DatasetError::Format(format!(
                "sequence {sequence} frame {frame} slot {slot} is not a number"
            ))
        })?;
    }
    let aspect_ratio = match &slots[COORD_LEN] {
        Value::Null => None,
        other => Some(other.as_f64().ok_or_else(|| {
            DatasetError::Format(format!(
                "sequence {sequence} frame {frame} aspect ratio is not a number"
            ))
        })?),
    };
    Ok(FeatureVector::new(coords, aspect_ratio))
}

fn parse_label(value: &Value, sequence: usize) -> DatasetResult<Option<Label>> {
    if value.is_null() {
        return Ok(None);
    }
    let raw = value
        .as_i64()
        .or_else(|| value.as_f64().filter(|v| v.fract() == 0.0).map(|v| v as i64));
    raw.and_then(Label::from_value)
        .map(Some)
        .ok_or_else(|| DatasetError::Format(format!("sequence {sequence} has invalid label {value}")))
}

fn parse_sequence(value: &Value, sequence: usize) -> DatasetResult<Sequence> {
    let elements = value
        .as_array()
        .ok_or_else(|| DatasetError::Format(format!("sequence {sequence} is not an array")))?;
    let Some((last, body)) = elements.split_last() else {
        return Err(DatasetError::Format(format!("sequence {sequence} is empty")));
    };

    // Old unlabeled exports end with a vector instead of a label.
    let (vectors, label) = if last.is_array() {
        (elements.as_slice(), None)
    } else {
        (body, parse_label(last, sequence)?)
    };

    let frames = vectors
        .iter()
        .enumerate()
        .map(|(frame, v)| parse_vector(v, sequence, frame))
        .collect::<DatasetResult<Vec<_>>>()?;
    Ok(Sequence::new(frames, label))
}

/// Parse dataset text. Accepts any JSON whitespace, not only the canonical
/// layout.
pub fn parse_dataset(text: &str) -> DatasetResult<Dataset> {
    let root: Value = serde_json::from_str(text)?;
    let sequences = root
        .as_array()
        .ok_or_else(|| DatasetError::Format("top level is not an array".into()))?;
    let sequences = sequences
        .iter()
        .enumerate()
        .map(|(i, s)| parse_sequence(s, i))
        .collect::<DatasetResult<Vec<_>>>()?;
    Ok(Dataset::new(sequences))
}

pub fn read_dataset(path: &Path) -> DatasetResult<Dataset> {
    let text = fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
    parse_dataset(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(first: f64, aspect_ratio: Option<f64>) -> FeatureVector {
        let mut coords = [0.5; COORD_LEN];
        coords[0] = first;
        FeatureVector::new(coords, aspect_ratio)
    }

    #[test]
    fn floats_match_reference_repr() {
        let cases = [
            (0.5, "0.5"),
            (1.0, "1.0"),
            (0.1, "0.1"),
            (123.0, "123.0"),
            (0.0001, "0.0001"),
            (0.00001, "1e-05"),
            (0.000015, "1.5e-05"),
            (1e15, "1000000000000000.0"),
            (1e16, "1e+16"),
            (-2.5e-7, "-2.5e-07"),
            (1e100, "1e+100"),
            (0.0, "0.0"),
            (1.0 / 3.0, "0.3333333333333333"),
        ];
        for (value, expected) in cases {
            assert_eq!(format_float(value), expected, "formatting {value:e}");
        }
    }

    #[test]
    fn equally_short_digits_round_to_even() {
        // 911481531226031.25 is exactly halfway between ...031.2 and ...031.3
        let tie = 911481531226031.25_f64;
        assert_eq!(format_float(tie), "911481531226031.2");
        assert_eq!(format_float(-tie), "-911481531226031.2");
        assert_eq!(format_float(911481531226031.375), "911481531226031.4");
        assert_eq!(format_float(1.5e-7), "1.5e-07");
        assert_eq!(format_float(123.456), "123.456");
        assert_eq!(format_float(0.00012), "0.00012");
        assert_eq!(format_float(1234567890123456.0), "1234567890123456.0");
    }

    #[test]
    fn layout_is_exact() {
        let dataset = Dataset::new(vec![
            Sequence::new(vec![vector(0.25, Some(2.0)), vector(0.75, None)], Some(Label::Fall)),
            Sequence::new(vec![vector(0.125, Some(0.5))], Some(Label::NonFall)),
        ]);
        let text = render_dataset(&dataset).unwrap();

        let halves = vec!["0.5"; COORD_LEN - 1].join(", ");
        let expected = format!(
            "[\n  [\n    [0.25, {h}, 2.0],\n    [0.75, {h}, null],\n    1\n  ],\n  [\n    [0.125, {h}, 0.5],\n    0\n  ]\n]\n",
            h = halves
        );
        assert_eq!(text, expected);
        assert_eq!(parse_dataset(&text).unwrap(), dataset);
    }

    #[test]
    fn empty_dataset_renders_brackets() {
        assert_eq!(render_dataset(&Dataset::default()).unwrap(), "[\n]\n");
        assert!(parse_dataset("[\n]\n").unwrap().is_empty());
    }

    #[test]
    fn unlabeled_or_non_finite_data_is_refused() {
        let unlabeled = Dataset::new(vec![Sequence::new(vec![vector(0.5, Some(1.0))], None)]);
        assert!(matches!(
            render_dataset(&unlabeled),
            Err(DatasetError::UnlabeledSequence { sequence: 0 })
        ));

        let nan = Dataset::new(vec![Sequence::new(
            vec![vector(0.5, Some(f64::NAN))],
            Some(Label::Fall),
        )]);
        assert!(matches!(
            render_dataset(&nan),
            Err(DatasetError::NonFiniteValue { .. })
        ));
    }

    #[test]
    fn reader_rejects_wrong_shapes() {
        assert!(matches!(parse_dataset("{}"), Err(DatasetError::Format(_))));
        assert!(matches!(parse_dataset("[[]]"), Err(DatasetError::Format(_))));
        assert!(matches!(parse_dataset("[[[1, 2], 1]]"), Err(DatasetError::Format(_))));
        assert!(matches!(parse_dataset("[[2]]"), Err(DatasetError::Format(_))));
        assert!(matches!(parse_dataset("not json"), Err(DatasetError::Json(_))));
    }

    #[test]
    fn reader_accepts_legacy_unlabeled_sequences() {
        let v = format!("[{}]", vec!["0.5"; FEATURE_LEN].join(","));
        let dataset = parse_dataset(&format!("[[{v},{v}]]")).unwrap();
        assert_eq!(dataset.sequences[0].len(), 2);
        assert_eq!(dataset.sequences[0].label, None);
    }
}
