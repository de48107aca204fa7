//! Frame extraction pipeline.
//!
//! This module turns a video file into an in-memory `FrameSequence`:
//! - `decoder`: subprocess decoder behind the `FrameDecoder` trait
//! - `synthetic`: placeholder sequence generator for decoder soft failures
//! - `overlay`: bitmap-font text drawing used by the placeholder frames
//! - `worker`: one background extraction thread per load, result on a channel
//!
//! Extraction never takes the application down. Decoder problems (binary
//! missing, timeout, bad exit, no output) are soft failures that fall back to
//! a synthetic sequence; only placeholder synthesis itself failing is fatal.

mod decoder;
mod overlay;
mod synthetic;
mod worker;

pub use decoder::{default_scratch_dir, FfmpegDecoder, FrameDecoder};
pub use synthetic::placeholder_sequence;
pub use worker::{ExtractionHandle, ExtractionJob};

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;

use crate::config::ExtractionSettings;
use crate::frame::{fit_within, Frame, FrameSequence};

/// Sampling rate requested from the decoder, frames per second.
pub const TARGET_SAMPLE_FPS: u32 = 10;

/// Decoded frames are downscaled to fit this box, aspect ratio preserved.
pub const MAX_FRAME_WIDTH: u32 = 640;
pub const MAX_FRAME_HEIGHT: u32 = 360;

/// Hard cap on how long the decoder subprocess may run.
pub const DECODER_TIMEOUT_SECS: u64 = 30;

/// Fallback sequence shape when the decoder is unavailable.
pub const PLACEHOLDER_FRAME_COUNT: usize = 100;
pub const PLACEHOLDER_FPS: f64 = 30.0;

/// Video container extensions the application accepts.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

/// How a sequence was produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameOrigin {
    /// Real frames from the decoder.
    Decoded,
    /// Synthetic fallback frames; `reason` says why the decoder was skipped.
    Placeholder { reason: String },
}

/// Result of a (successful) extraction: always a usable sequence.
#[derive(Debug)]
pub struct ExtractionOutcome {
    pub sequence: FrameSequence,
    pub origin: FrameOrigin,
}

impl ExtractionOutcome {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.origin, FrameOrigin::Placeholder { .. })
    }
}

/// Check a path against the accepted video extensions (case-insensitive).
pub fn is_supported_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.iter().any(|s| *s == ext)
        })
        .unwrap_or(false)
}

/// Validate a user-supplied video path before any extraction work starts.
///
/// Missing files and unsupported extensions are caller errors, not soft
/// failures: nothing has been extracted yet and no fallback applies.
pub fn validate_video_path(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(anyhow!("video file not found: {}", path.display()));
    }
    if !is_supported_video(path) {
        return Err(anyhow!(
            "unsupported video format: {} (expected one of {})",
            path.display(),
            SUPPORTED_EXTENSIONS.join(", ")
        ));
    }
    Ok(())
}

/// Extract frames from `path` using the decoder configured in `settings`.
pub fn extract(path: &Path, settings: &ExtractionSettings) -> Result<ExtractionOutcome> {
    let decoder = FfmpegDecoder::from_settings(settings);
    extract_with(path, settings, &decoder)
}

/// Extraction pipeline over an explicit decoder (swappable for tests or an
/// in-process decoding library).
///
/// Every decoder-side problem is mapped to the placeholder fallback; the
/// returned `FrameOrigin` tells the caller which world it is in.
pub fn extract_with(
    path: &Path,
    settings: &ExtractionSettings,
    decoder: &dyn FrameDecoder,
) -> Result<ExtractionOutcome> {
    validate_video_path(path)?;

    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match decode_real_frames(path, settings, decoder) {
        Ok(sequence) => {
            log::info!(
                "extracted {} frames at {} fps from {}",
                sequence.len(),
                sequence.frame_rate(),
                source_name
            );
            Ok(ExtractionOutcome {
                sequence,
                origin: FrameOrigin::Decoded,
            })
        }
        Err(err) => {
            // Soft failure: decoder missing, timed out, bad exit, no output.
            // The application stays usable on synthetic frames.
            let reason = format!("{:#}", err);
            log::warn!(
                "frame extraction failed for {} ({}), using placeholder frames",
                source_name,
                reason
            );
            let sequence =
                placeholder_sequence(&source_name, PLACEHOLDER_FRAME_COUNT, PLACEHOLDER_FPS)
                    .context("placeholder frame synthesis failed")?;
            Ok(ExtractionOutcome {
                sequence,
                origin: FrameOrigin::Placeholder { reason },
            })
        }
    }
}

fn decode_real_frames(
    path: &Path,
    settings: &ExtractionSettings,
    decoder: &dyn FrameDecoder,
) -> Result<FrameSequence> {
    let scratch = settings.scratch_dir();
    decoder::prepare_scratch(&scratch)?;

    let frame_files = decoder.extract_frames(path, settings.target_fps, &scratch)?;
    if frame_files.is_empty() {
        return Err(anyhow!("decoder produced no frames"));
    }

    let mut frames = Vec::with_capacity(frame_files.len());
    for file in &frame_files {
        match load_scaled_frame(file, settings.max_width, settings.max_height) {
            Ok(frame) => frames.push(frame),
            Err(err) => {
                // One bad file does not sink the run.
                log::warn!("skipping unreadable frame {}: {}", file.display(), err);
            }
        }
    }
    if frames.is_empty() {
        return Err(anyhow!(
            "none of the {} decoder output files could be read",
            frame_files.len()
        ));
    }

    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    FrameSequence::new(frames, settings.target_fps as f64, source_name)
}

fn load_scaled_frame(file: &Path, max_w: u32, max_h: u32) -> Result<Frame> {
    let img = image::open(file)
        .with_context(|| format!("decode frame image {}", file.display()))?
        .into_rgb8();
    let (src_w, src_h) = img.dimensions();
    let (out_w, out_h) = fit_within(src_w, src_h, max_w, max_h);
    let scaled = if (out_w, out_h) == (src_w, src_h) {
        img
    } else {
        image::imageops::resize(&img, out_w, out_h, FilterType::Triangle)
    };
    Frame::new(scaled.into_raw(), out_w, out_h)
}
