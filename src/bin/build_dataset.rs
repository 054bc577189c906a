//! build_dataset - window annotated recordings into a per-source dataset file
//!
//! Every keypoint file under `dataset_path` is one recording. Frames are
//! validated (missing wrists imputed, misses carried forward), windowed with
//! stride `sequence_length - overlapping_frame_window`, labeled, and written
//! to `out_path`.

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use fall_dataset::codec;
use fall_dataset::label::parse_answer;
use fall_dataset::{
    Candidate, ConstantLabel, Dataset, Decision, FrameValidator, InteractiveReview,
    InvalidFramePolicy, Label, LabelPolicy, PoseFileConfig, PoseFileSource, ProcessorConfig,
    Recorder, SyntheticLabels,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Labeling {
    /// Ask for every window on stdin.
    Interactive,
    /// Label every window with `--label`.
    Constant,
    /// Random frame labels (throwaway datasets only).
    Synthetic,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OnInvalid {
    /// Keep out-of-bounds frames after logging them.
    Report,
    /// Replace out-of-bounds frames with the last valid one.
    CarryForward,
    /// Drop out-of-bounds and missed frames.
    Discard,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// TOML config with a [dataset_processor_params] table.
    #[arg(long, env = "FALL_DATASET_CONFIG")]
    config: Option<PathBuf>,
    /// How windows get their label.
    #[arg(long, value_enum, default_value = "interactive")]
    labeling: Labeling,
    /// Frame label for constant labeling and for plain "y" answers (0 or 1).
    #[arg(long, default_value_t = 1)]
    label: i64,
    /// What to do with frames whose landmarks leave the image.
    #[arg(long, value_enum, default_value = "report")]
    on_invalid: OnInvalid,
    /// Seed for wrist jitter and synthetic labels.
    #[arg(long)]
    seed: Option<u64>,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let cfg = ProcessorConfig::load_from(args.config.as_deref())?;
    let label = Label::from_value(args.label)
        .ok_or_else(|| anyhow!("--label must be 0 or 1, got {}", args.label))?;
    let spec = cfg.offline_window()?;

    let ui = ui::Ui::from_args(&args.ui, std::io::stderr().is_terminal());
    // Spinners would draw over the review prompt.
    let ui = match args.labeling {
        Labeling::Interactive => ui.plain(),
        _ => ui,
    };

    let sources = {
        let _stage = ui.stage("Discover recordings");
        list_recordings(&cfg.dataset_path)?
    };
    log::info!(
        "{} recordings, {}-frame sequences, stride {}",
        sources.len(),
        spec.length(),
        spec.stride()
    );

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let policy = match args.on_invalid {
        OnInvalid::Report => InvalidFramePolicy::Report,
        OnInvalid::CarryForward => InvalidFramePolicy::CarryForward,
        OnInvalid::Discard => InvalidFramePolicy::Discard,
    };
    let mut recorder = Recorder::new(FrameValidator::new(policy, rng));

    let mut labels: Box<dyn LabelPolicy> = match args.labeling {
        Labeling::Interactive => Box::new(InteractiveReview::new(Some(label), review_on_stdin)),
        Labeling::Constant => Box::new(ConstantLabel::new(label)),
        Labeling::Synthetic => Box::new(match args.seed {
            Some(seed) => SyntheticLabels::seeded(seed),
            None => SyntheticLabels::new(),
        }),
    };

    let mut dataset = Dataset::default();
    for path in sources {
        let _stage = ui.stage(&format!("Process {}", path));
        let mut source = PoseFileSource::new(PoseFileConfig::new(path))?;
        let (mut part, _stats) = recorder.build(&mut source, spec, labels.as_mut())?;
        dataset.sequences.append(&mut part.sequences);
        log::info!("dataset has now {} samples", dataset.len());
    }

    {
        let _stage = ui.stage("Write dataset");
        codec::write_dataset(&cfg.out_path, &dataset)?;
    }
    println!(
        "{} sequences written to {}",
        dataset.len(),
        cfg.out_path.display()
    );
    Ok(())
}

/// Recordings in name order. A `stub://` path is a single synthetic recording.
fn list_recordings(dataset_path: &Path) -> Result<Vec<String>> {
    let as_str = dataset_path.to_string_lossy();
    if as_str.starts_with("stub://") {
        return Ok(vec![as_str.into_owned()]);
    }
    let entries = std::fs::read_dir(dataset_path)
        .map_err(|e| anyhow!("failed to read {}: {}", dataset_path.display(), e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() {
            paths.push(path.to_string_lossy().into_owned());
        }
    }
    paths.sort();
    Ok(paths)
}

fn review_on_stdin(candidate: &Candidate<'_>) -> Result<Decision> {
    let ratios: Vec<f64> = candidate
        .frames
        .iter()
        .filter_map(|v| v.aspect_ratio())
        .collect();
    let first = ratios.first().copied().unwrap_or(f64::NAN);
    let last = ratios.last().copied().unwrap_or(f64::NAN);
    let min = ratios.iter().copied().fold(f64::INFINITY, f64::min);
    let max = ratios.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    println!(
        "window {} (frames {}..{}): aspect ratio {:.2} -> {:.2} [min {:.2}, max {:.2}], {} unmeasured",
        candidate.index,
        candidate.range.start,
        candidate.range.end,
        first,
        last,
        min,
        max,
        candidate.frames.len() - ratios.len()
    );

    loop {
        print!("Save this sequence? [y/0/1, s = skip rest of recording] ");
        std::io::stdout().flush()?;
        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer)? == 0 {
            return Ok(Decision::Stop);
        }
        match parse_answer(&answer, candidate.frame_label) {
            Ok(decision) => {
                match decision {
                    Decision::Keep(label) => println!("Saved with label {}", label),
                    Decision::Discard => println!("Discarded"),
                    Decision::Stop => println!("Skipping rest of recording"),
                }
                return Ok(decision);
            }
            Err(e) => println!("{}", e),
        }
    }
}
