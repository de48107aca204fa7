use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::extract::{
    DECODER_TIMEOUT_SECS, MAX_FRAME_HEIGHT, MAX_FRAME_WIDTH, TARGET_SAMPLE_FPS,
};

const DEFAULT_DB_PATH: &str = "ridesecure.db";
const DEFAULT_DECODER_BIN: &str = "ffmpeg";
const DEFAULT_VIOLATION_EVERY: usize = 20;

#[derive(Debug, Deserialize, Default)]
struct AppConfigFile {
    db_path: Option<String>,
    extraction: Option<ExtractionConfigFile>,
    detection: Option<DetectionConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ExtractionConfigFile {
    decoder_bin: Option<String>,
    target_fps: Option<u32>,
    max_width: Option<u32>,
    max_height: Option<u32>,
    timeout_secs: Option<u64>,
    scratch_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    violation_every: Option<usize>,
    seed: Option<u64>,
}

/// Application configuration: compiled-in defaults, overridden by a JSON
/// config file named by `RIDESECURE_CONFIG`, overridden by `RIDESECURE_*`
/// environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: String,
    pub extraction: ExtractionSettings,
    pub detection: DetectionSettings,
}

#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    /// Decoder executable; looked up on PATH unless absolute.
    pub decoder_bin: String,
    /// Sampling rate requested from the decoder.
    pub target_fps: u32,
    /// Decoded frames are downscaled to fit this box.
    pub max_width: u32,
    pub max_height: u32,
    /// Hard cap on decoder runtime.
    pub timeout_secs: u64,
    /// Scratch directory override; platform temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
}

impl ExtractionSettings {
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(crate::extract::default_scratch_dir)
    }
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            decoder_bin: DEFAULT_DECODER_BIN.to_string(),
            target_fps: TARGET_SAMPLE_FPS,
            max_width: MAX_FRAME_WIDTH,
            max_height: MAX_FRAME_HEIGHT,
            timeout_secs: DECODER_TIMEOUT_SECS,
            scratch_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectionSettings {
    /// Mock backend emits one candidate every N-th inspected frame.
    pub violation_every: usize,
    /// Deterministic seed for the mock backend; random when unset.
    pub seed: Option<u64>,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            violation_every: DEFAULT_VIOLATION_EVERY,
            seed: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            extraction: ExtractionSettings::default(),
            detection: DetectionSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("RIDESECURE_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: AppConfigFile) -> Self {
        let defaults = Self::default();
        let extraction_file = file.extraction.unwrap_or_default();
        let detection_file = file.detection.unwrap_or_default();
        Self {
            db_path: file.db_path.unwrap_or(defaults.db_path),
            extraction: ExtractionSettings {
                decoder_bin: extraction_file
                    .decoder_bin
                    .unwrap_or(defaults.extraction.decoder_bin),
                target_fps: extraction_file
                    .target_fps
                    .unwrap_or(defaults.extraction.target_fps),
                max_width: extraction_file
                    .max_width
                    .unwrap_or(defaults.extraction.max_width),
                max_height: extraction_file
                    .max_height
                    .unwrap_or(defaults.extraction.max_height),
                timeout_secs: extraction_file
                    .timeout_secs
                    .unwrap_or(defaults.extraction.timeout_secs),
                scratch_dir: extraction_file.scratch_dir,
            },
            detection: DetectionSettings {
                violation_every: detection_file
                    .violation_every
                    .unwrap_or(defaults.detection.violation_every),
                seed: detection_file.seed,
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("RIDESECURE_DB_PATH") {
            if !path.trim().is_empty() {
                self.db_path = path;
            }
        }
        if let Ok(bin) = std::env::var("RIDESECURE_DECODER") {
            if !bin.trim().is_empty() {
                self.extraction.decoder_bin = bin;
            }
        }
        if let Ok(dir) = std::env::var("RIDESECURE_SCRATCH_DIR") {
            if !dir.trim().is_empty() {
                self.extraction.scratch_dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(fps) = std::env::var("RIDESECURE_TARGET_FPS") {
            let parsed: u32 = fps
                .parse()
                .map_err(|_| anyhow!("RIDESECURE_TARGET_FPS must be an integer"))?;
            self.extraction.target_fps = parsed;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.db_path.trim().is_empty() {
            return Err(anyhow!("db_path must not be empty"));
        }
        if self.extraction.decoder_bin.trim().is_empty() {
            return Err(anyhow!("decoder_bin must not be empty"));
        }
        if self.extraction.target_fps == 0 {
            return Err(anyhow!("target_fps must be greater than zero"));
        }
        if self.extraction.max_width == 0 || self.extraction.max_height == 0 {
            return Err(anyhow!("frame bounds must be greater than zero"));
        }
        if self.extraction.timeout_secs == 0 {
            return Err(anyhow!("decoder timeout must be greater than zero"));
        }
        if self.detection.violation_every == 0 {
            return Err(anyhow!("violation_every must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<AppConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pipeline_constants() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.db_path, "ridesecure.db");
        assert_eq!(cfg.extraction.decoder_bin, "ffmpeg");
        assert_eq!(cfg.extraction.target_fps, 10);
        assert_eq!(cfg.extraction.max_width, 640);
        assert_eq!(cfg.extraction.max_height, 360);
        assert_eq!(cfg.extraction.timeout_secs, 30);
        assert_eq!(cfg.detection.violation_every, 20);
    }

    #[test]
    fn validate_rejects_zero_fps() {
        let mut cfg = AppConfig::default();
        cfg.extraction.target_fps = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn scratch_dir_defaults_to_temp_subdir() {
        let settings = ExtractionSettings::default();
        let dir = settings.scratch_dir();
        assert!(dir.ends_with("ridesecure_frames"));
    }
}
