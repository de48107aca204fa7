//! Bitmap frame types shared by extraction and playback.
//!
//! - `Frame`: a single tightly packed 24-bit RGB bitmap.
//! - `FrameSequence`: an ordered, immutable run of frames plus the effective
//!   frame rate they were sampled at.
//!
//! A sequence is produced once per loaded video (by the extraction worker),
//! handed to the playback side, and read-only from then on. Replacing a
//! loaded video drops the old sequence wholesale.

use anyhow::{anyhow, Result};

/// One decoded (or synthesized) video frame. Pixels are packed RGB, three
/// bytes per pixel, row-major, no padding between rows.
#[derive(Clone)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    /// Create a frame from a packed RGB buffer.
    ///
    /// The buffer length must be exactly `width * height * 3`.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = (width as usize) * (height as usize) * 3;
        if width == 0 || height == 0 {
            return Err(anyhow!("frame dimensions must be non-zero"));
        }
        if data.len() != expected {
            return Err(anyhow!(
                "frame buffer is {} bytes, expected {} for {}x{} RGB",
                data.len(),
                expected,
                width,
                height
            ));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Packed RGB pixel data.
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// RGB value at (x, y). Out-of-range coordinates return None.
    pub fn pixel_at(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 3;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    /// Mutable access for in-place drawing. Crate-internal: only the
    /// synthetic frame generator paints on frames.
    pub(crate) fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// FrameSequence
// ----------------------------------------------------------------------------

/// Ordered, immutable collection of frames sampled at a fixed rate.
///
/// The rate is the *effective* sampling rate chosen at extraction time; it is
/// independent of whatever the source video's native rate was.
#[derive(Debug)]
pub struct FrameSequence {
    frames: Vec<Frame>,
    frame_rate: f64,
    source: String,
}

impl FrameSequence {
    /// Build a sequence. Rejects an empty frame list and non-positive rates:
    /// every sequence handed to playback is usable as-is.
    pub fn new(frames: Vec<Frame>, frame_rate: f64, source: impl Into<String>) -> Result<Self> {
        if frames.is_empty() {
            return Err(anyhow!("frame sequence must contain at least one frame"));
        }
        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            return Err(anyhow!("frame rate must be positive, got {}", frame_rate));
        }
        Ok(Self {
            frames,
            frame_rate,
            source: source.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Effective sampling rate in frames per second.
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Name of the video this sequence was produced from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames.len() as f64 / self.frame_rate
    }
}

// ----------------------------------------------------------------------------
// Scaling
// ----------------------------------------------------------------------------

/// Compute the dimensions a `src_w` x `src_h` image should be scaled to so it
/// fits inside `max_w` x `max_h` with the aspect ratio preserved.
///
/// Both dimensions are scaled by `min(max_w/src_w, max_h/src_h)` and rounded.
/// Images already inside the bounds are left alone (no upscaling).
pub fn fit_within(src_w: u32, src_h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if src_w == 0 || src_h == 0 || max_w == 0 || max_h == 0 {
        return (src_w.max(1), src_h.max(1));
    }
    let scale_x = max_w as f64 / src_w as f64;
    let scale_y = max_h as f64 / src_h as f64;
    let scale = scale_x.min(scale_y);
    if scale >= 1.0 {
        return (src_w, src_h);
    }
    let out_w = ((src_w as f64 * scale).round() as u32).max(1);
    let out_h = ((src_h as f64 * scale).round() as u32).max(1);
    (out_w.min(max_w), out_h.min(max_h))
}
