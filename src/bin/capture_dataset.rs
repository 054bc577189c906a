//! capture_dataset - record a live pose stream into a dataset file
//!
//! Frames that fail validation are dropped rather than carried. Recording
//! stops at the frame cap or on Ctrl-C, then the frames are windowed with a
//! half-second stride. Labels are random placeholders until a real source of
//! ground truth is wired in.

use anyhow::{anyhow, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fall_dataset::codec;
use fall_dataset::recorder::window_recording;
use fall_dataset::{
    FrameValidator, ImageSize, InvalidFramePolicy, PoseFileConfig, PoseFileSource,
    ProcessorConfig, Recorder, SyntheticLabels,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// TOML config with a [dataset_processor_params] table.
    #[arg(long, env = "FALL_DATASET_CONFIG")]
    config: Option<PathBuf>,
    /// Pose stream: keypoint file or stub://<name>[?frames=N].
    #[arg(long, default_value = "stub://camera?frames=1200")]
    source: String,
    /// Stop after this many recorded frames.
    #[arg(long, default_value_t = 1000)]
    max_frames: usize,
    /// Frame width reported by stub sources.
    #[arg(long, default_value_t = 640)]
    width: u32,
    /// Frame height reported by stub sources.
    #[arg(long, default_value_t = 480)]
    height: u32,
    /// Output file (defaults to out_path from the config).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Seed for wrist jitter, stub motion and labels.
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
    if args.max_frames == 0 {
        return Err(anyhow!("--max-frames must be greater than zero"));
    }
    let spec = cfg.live_window()?;
    let out_path = args.out.unwrap_or_else(|| cfg.out_path.clone());
    let ui = ui::Ui::from_args(&args.ui, std::io::stderr().is_terminal());

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
        })
        .map_err(|e| anyhow!("failed to install Ctrl-C handler: {}", e))?;
    }

    let mut source = PoseFileSource::new(PoseFileConfig {
        stub_size: ImageSize::new(args.width, args.height),
        stub_seed: args.seed.unwrap_or(0),
        ..PoseFileConfig::new(args.source.clone())
    })?;
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut labels = match args.seed {
        Some(seed) => SyntheticLabels::seeded(seed),
        None => SyntheticLabels::new(),
    };
    let mut recorder = Recorder::new(FrameValidator::new(InvalidFramePolicy::Discard, rng))
        .with_max_frames(args.max_frames);

    let recording = {
        let _stage = ui.stage("Record poses");
        recorder.record(&mut source, &mut labels, Some(stop.as_ref()))?
    };
    let stats = source.stats();
    log::info!(
        "{}: {} observations, {} with a detection",
        stats.path,
        stats.observations,
        stats.detections
    );

    let dataset = {
        let _stage = ui.stage("Window recording");
        window_recording(&recording, spec, &mut labels)?
    };
    if dataset.is_empty() {
        log::warn!(
            "{} frames recorded, fewer than one {}-frame window",
            recording.vectors.len(),
            spec.length()
        );
    }

    {
        let _stage = ui.stage("Write dataset");
        codec::write_dataset(&out_path, &dataset)?;
    }
    println!(
        "{} sequences from {} frames written to {}",
        dataset.len(),
        recording.vectors.len(),
        out_path.display()
    );
    Ok(())
}
