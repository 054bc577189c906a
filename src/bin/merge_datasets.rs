//! merge_datasets - combine per-source dataset files into one shuffled corpus
//!
//! Every file in the input directory is read in name order, its aspect ratio
//! slots are forward-filled and outliers rescaled, then the union is shuffled
//! and written atomically.

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::IsTerminal;
use std::path::PathBuf;

use fall_dataset::codec;
use fall_dataset::merge::{load_shards, merge};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Directory holding one dataset file per source.
    #[arg(long, default_value = "out/sources")]
    input_dir: PathBuf,
    /// Merged dataset file.
    #[arg(long, default_value = "out/merged.json")]
    output: PathBuf,
    /// Shuffle seed for reproducible merges.
    #[arg(long)]
    seed: Option<u64>,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let ui = ui::Ui::from_args(&args.ui, std::io::stderr().is_terminal());

    let shards = {
        let _stage = ui.stage("Load source datasets");
        load_shards(&args.input_dir)?
    };
    if shards.is_empty() {
        log::warn!("no dataset files in {}", args.input_dir.display());
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let (dataset, report) = {
        let _stage = ui.stage("Merge");
        merge(shards, &mut rng)?
    };
    for source in &report.sources {
        println!(
            "{}: {} sequences ({} aspect ratios filled, {} rescaled)",
            source.name, source.sequences, source.repair.filled, source.repair.rescaled
        );
    }

    let summary = dataset.summary();
    {
        let _stage = ui.stage("Write merged dataset");
        codec::write_dataset(&args.output, &dataset)?;
    }
    println!(
        "merged shape: ({}, {}, {}) -> {}",
        summary.sequences,
        summary.sequence_length,
        summary.vector_width,
        args.output.display()
    );
    Ok(())
}
