//! normalize_dataset - min-max scale the aspect ratio slot of a merged corpus
//!
//! The output is written only when every aspect ratio lands in `[0, 1]`. A
//! degenerate range or an unfilled slot aborts with the input untouched.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;

use fall_dataset::codec;
use fall_dataset::normalize::{normalize, verify_all_features};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Merged dataset file.
    #[arg(long, default_value = "out/merged.json")]
    input: PathBuf,
    /// Normalized dataset file (may equal --input).
    #[arg(long, default_value = "out/normalized.json")]
    output: PathBuf,
    /// Also require every landmark coordinate to lie in [0, 1].
    #[arg(long)]
    strict: bool,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let ui = ui::Ui::from_args(&args.ui, std::io::stderr().is_terminal());

    let mut dataset = {
        let _stage = ui.stage("Read dataset");
        codec::read_dataset(&args.input)?
    };

    let range = {
        let _stage = ui.stage("Normalize aspect ratios");
        normalize(&mut dataset)?
    };
    if args.strict {
        let _stage = ui.stage("Check all features");
        verify_all_features(&dataset)
            .map_err(|e| anyhow!("{} failed the strict check: {}", args.input.display(), e))?;
    }

    {
        let _stage = ui.stage("Write dataset");
        codec::write_dataset(&args.output, &dataset)?;
    }
    println!(
        "aspect ratio range [{}, {}] mapped to [0, 1] for {} sequences -> {}",
        codec::format_float(range.min),
        codec::format_float(range.max),
        dataset.len(),
        args.output.display()
    );
    Ok(())
}
