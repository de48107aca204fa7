//! External decoder invocation.
//!
//! The production decoder shells out to `ffmpeg`, asking it to sample the
//! video at a fixed rate into numbered JPEG files in a scratch directory.
//! The trait keeps the rest of the pipeline independent of that choice: an
//! in-process decoding library (or a test double writing JPEGs directly)
//! slots in without touching extraction or playback.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};

use crate::config::ExtractionSettings;

/// Prefix/suffix of decoder output files. Names are zero-padded so that
/// lexicographic order equals temporal order.
const FRAME_PREFIX: &str = "frame_";
const FRAME_SUFFIX: &str = ".jpg";

/// Subdirectory of the platform temp dir used when no scratch dir is
/// configured. Reused across runs and purged before each extraction.
pub const SCRATCH_DIR_NAME: &str = "ridesecure_frames";

/// Interval between child-exit polls while waiting on the decoder.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A decoder that samples a video into numbered image files.
pub trait FrameDecoder {
    /// Decoder identifier for logs.
    fn name(&self) -> &'static str;

    /// Sample `video` at `fps` frames per second into `out_dir`, returning
    /// the produced image files in temporal order.
    ///
    /// Any failure (missing binary, timeout, bad exit, empty output) is an
    /// error; the caller decides whether that is soft or fatal.
    fn extract_frames(&self, video: &Path, fps: u32, out_dir: &Path) -> Result<Vec<PathBuf>>;
}

/// Default scratch directory under the platform temp dir.
pub fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join(SCRATCH_DIR_NAME)
}

/// Create the scratch directory if needed and purge frame files left over
/// from a previous run, so two extractions never mix sequences.
pub fn prepare_scratch(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create scratch directory {}", dir.display()))?;
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("read scratch directory {}", dir.display()))?
    {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(FRAME_PREFIX) && name.ends_with(FRAME_SUFFIX) {
            if let Err(err) = std::fs::remove_file(entry.path()) {
                log::warn!("could not purge stale frame {}: {}", name, err);
            }
        }
    }
    Ok(())
}

/// Enumerate decoder output files in lexicographic (= temporal) order.
pub fn list_frame_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("read frame directory {}", dir.display()))?
    {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(FRAME_PREFIX) && name.ends_with(FRAME_SUFFIX) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

// ----------------------------------------------------------------------------
// FfmpegDecoder
// ----------------------------------------------------------------------------

/// Decoder backed by the `ffmpeg` command-line tool.
pub struct FfmpegDecoder {
    bin: String,
    timeout: Duration,
}

impl FfmpegDecoder {
    pub fn new(bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            timeout,
        }
    }

    pub fn from_settings(settings: &ExtractionSettings) -> Self {
        Self::new(
            settings.decoder_bin.clone(),
            Duration::from_secs(settings.timeout_secs),
        )
    }
}

impl FrameDecoder for FfmpegDecoder {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn extract_frames(&self, video: &Path, fps: u32, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let pattern = out_dir.join(format!("{}%04d{}", FRAME_PREFIX, FRAME_SUFFIX));

        let mut child = Command::new(&self.bin)
            .arg("-i")
            .arg(video)
            .arg("-vf")
            .arg(format!("fps={}", fps))
            .arg(&pattern)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("spawn decoder '{}'", self.bin))?;

        // Poll for exit under the hard timeout; a wedged decoder is killed.
        let started = Instant::now();
        let status = loop {
            match child.try_wait().context("poll decoder process")? {
                Some(status) => break status,
                None => {
                    if started.elapsed() > self.timeout {
                        child.kill().ok();
                        child.wait().ok();
                        return Err(anyhow!(
                            "decoder timed out after {}s",
                            self.timeout.as_secs()
                        ));
                    }
                    std::thread::sleep(WAIT_POLL_INTERVAL);
                }
            }
        };

        if !status.success() {
            return Err(anyhow!("decoder exited with status {}", status));
        }

        let files = list_frame_files(out_dir)?;
        if files.is_empty() {
            return Err(anyhow!("decoder exited cleanly but produced no frames"));
        }
        log::debug!(
            "{}: {} frame files in {}",
            self.name(),
            files.len(),
            out_dir.display()
        );
        Ok(files)
    }
}
