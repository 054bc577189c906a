//! inspect_dataset - print shape, label balance and bounds of a dataset file
//!
//! With `--sequence N` the landmarks of that sequence are rebuilt from the
//! feature vectors and printed in pixel coordinates.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;

use fall_dataset::codec;
use fall_dataset::normalize::verify_all_features;
use fall_dataset::validate::check_bounds;
use fall_dataset::{DatasetError, ImageSize};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Dataset file to inspect.
    input: PathBuf,
    /// Print the landmarks of this sequence.
    #[arg(long)]
    sequence: Option<usize>,
    /// Frame width used to de-normalize printed landmarks.
    #[arg(long, default_value_t = 640)]
    width: u32,
    /// Frame height used to de-normalize printed landmarks.
    #[arg(long, default_value_t = 480)]
    height: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let dataset = codec::read_dataset(&args.input)?;
    let summary = dataset.summary();
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if summary.ragged > 0 {
        log::warn!("{} sequences differ in length from the first", summary.ragged);
    }
    match verify_all_features(&dataset) {
        Ok(()) => println!("all features within [0, 1]"),
        Err(e) => println!("not fully normalized: {}", e),
    }

    let Some(index) = args.sequence else {
        return Ok(());
    };
    let sequence = dataset.sequences.get(index).ok_or_else(|| {
        anyhow!(
            "sequence {} out of range, dataset has {}",
            index,
            dataset.len()
        )
    })?;
    let size = ImageSize::new(args.width, args.height);
    let label = sequence
        .label
        .map(|label| label.to_string())
        .unwrap_or_else(|| "none".to_string());
    println!("sequence {} ({} frames, label {})", index, sequence.len(), label);

    for (frame_index, vector) in sequence.frames.iter().enumerate() {
        let landmarks = vector.to_landmarks();
        if let Err(key) = check_bounds(&landmarks) {
            log::warn!("{}", DatasetError::OutOfBoundsLandmark { key, frame_index });
        }
        let points: Vec<String> = landmarks
            .de_normalize(size)
            .iter()
            .map(|(key, p)| format!("{}=({},{})", key, p.x, p.y))
            .collect();
        let aspect = vector
            .aspect_ratio()
            .map(codec::format_float)
            .unwrap_or_else(|| "null".to_string());
        println!("  [{}] aspect={} {}", frame_index, aspect, points.join(" "));
    }
    Ok(())
}
