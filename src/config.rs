use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::window::WindowSpec;

const DEFAULT_CAM_FPS: u32 = 30;
const DEFAULT_SEQUENCE_SECONDS: f64 = 3.0;
const DEFAULT_OVERLAPPING_FRAME_WINDOW: usize = 45;
const DEFAULT_DATASET_PATH: &str = "data";
const DEFAULT_OUT_PATH: &str = "out/dataset.json";

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    dataset_processor_params: Option<ProcessorParamsFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ProcessorParamsFile {
    cam_fps: Option<u32>,
    sequence_length: Option<f64>,
    overlapping_frame_window: Option<usize>,
    dataset_path: Option<PathBuf>,
    out_path: Option<PathBuf>,
}

/// Options shared by the dataset tools.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorConfig {
    pub cam_fps: u32,
    /// Window length in seconds.
    pub sequence_length: f64,
    /// Frames shared by neighbouring windows on the offline path.
    pub overlapping_frame_window: usize,
    pub dataset_path: PathBuf,
    pub out_path: PathBuf,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            cam_fps: DEFAULT_CAM_FPS,
            sequence_length: DEFAULT_SEQUENCE_SECONDS,
            overlapping_frame_window: DEFAULT_OVERLAPPING_FRAME_WINDOW,
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            out_path: PathBuf::from(DEFAULT_OUT_PATH),
        }
    }
}

impl ProcessorConfig {
    /// Load from `FALL_DATASET_CONFIG` (if set), then apply env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("FALL_DATASET_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Load from an explicit file (if any), then apply env overrides.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ConfigFile) -> Self {
        let params = file.dataset_processor_params.unwrap_or_default();
        let defaults = Self::default();
        Self {
            cam_fps: params.cam_fps.unwrap_or(defaults.cam_fps),
            sequence_length: params.sequence_length.unwrap_or(defaults.sequence_length),
            overlapping_frame_window: params
                .overlapping_frame_window
                .unwrap_or(defaults.overlapping_frame_window),
            dataset_path: params.dataset_path.unwrap_or(defaults.dataset_path),
            out_path: params.out_path.unwrap_or(defaults.out_path),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(fps) = std::env::var("FALL_DATASET_CAM_FPS") {
            self.cam_fps = fps
                .trim()
                .parse()
                .map_err(|_| anyhow!("FALL_DATASET_CAM_FPS must be an integer frame rate"))?;
        }
        if let Ok(seconds) = std::env::var("FALL_DATASET_SEQUENCE_LENGTH") {
            self.sequence_length = seconds
                .trim()
                .parse()
                .map_err(|_| anyhow!("FALL_DATASET_SEQUENCE_LENGTH must be a number of seconds"))?;
        }
        if let Ok(overlap) = std::env::var("FALL_DATASET_OVERLAP") {
            self.overlapping_frame_window = overlap
                .trim()
                .parse()
                .map_err(|_| anyhow!("FALL_DATASET_OVERLAP must be an integer frame count"))?;
        }
        if let Ok(path) = std::env::var("FALL_DATASET_PATH") {
            if !path.trim().is_empty() {
                self.dataset_path = PathBuf::from(path);
            }
        }
        if let Ok(path) = std::env::var("FALL_DATASET_OUT_PATH") {
            if !path.trim().is_empty() {
                self.out_path = PathBuf::from(path);
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.cam_fps == 0 {
            return Err(anyhow!("cam_fps must be greater than zero"));
        }
        if !self.sequence_length.is_finite() || self.sequence_length <= 0.0 {
            return Err(anyhow!("sequence_length must be a positive number of seconds"));
        }
        if self.sequence_frames() == 0 {
            return Err(anyhow!("sequence_length is shorter than one frame"));
        }
        Ok(())
    }

    /// Frames per window: `cam_fps * sequence_length`, truncated.
    pub fn sequence_frames(&self) -> usize {
        (f64::from(self.cam_fps) * self.sequence_length) as usize
    }

    /// Windowing for annotated recordings: stride is length minus overlap.
    /// Overlap is only checked here, not by `load`.
    pub fn offline_window(&self) -> Result<WindowSpec> {
        Ok(WindowSpec::with_overlap(
            self.sequence_frames(),
            self.overlapping_frame_window,
        )?)
    }

    /// Windowing for live capture: half a second of stride.
    pub fn live_window(&self) -> Result<WindowSpec> {
        Ok(WindowSpec::new(
            self.sequence_frames(),
            (self.cam_fps / 2) as usize,
        )?)
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = toml::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
