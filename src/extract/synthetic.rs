//! Synthetic placeholder frames.
//!
//! When the decoder is unavailable the application still needs something to
//! play, detect against, and scrub through. Each placeholder frame is a solid
//! color swept through the hue circle by frame index, labeled with the frame
//! number and the source file name so an operator can tell frames apart and
//! see that the pipeline ran end to end.

use anyhow::Result;

use super::overlay::{draw_text, text_width, GLYPH_HEIGHT};
use super::{MAX_FRAME_HEIGHT, MAX_FRAME_WIDTH};
use crate::frame::{Frame, FrameSequence};

/// Background saturation/value for the hue sweep.
const FILL_SATURATION: f64 = 0.3;
const FILL_VALUE: f64 = 0.8;

const TEXT_COLOR: [u8; 3] = [0, 0, 0];

/// Generate a fixed-length placeholder sequence for `source_name`.
pub fn placeholder_sequence(source_name: &str, count: usize, fps: f64) -> Result<FrameSequence> {
    let width = MAX_FRAME_WIDTH;
    let height = MAX_FRAME_HEIGHT;

    let mut frames = Vec::with_capacity(count);
    for i in 0..count {
        let hue = i as f64 / count as f64;
        let fill = hsv_to_rgb(hue, FILL_SATURATION, FILL_VALUE);

        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..(width * height) {
            data.extend_from_slice(&fill);
        }
        let mut frame = Frame::new(data, width, height)?;

        let label = format!("Frame {}/{}", i + 1, count);
        paint_centered(&mut frame, &label, height as usize / 2 - GLYPH_HEIGHT);
        paint_centered(&mut frame, source_name, height as usize / 2 + 8);

        frames.push(frame);
    }

    FrameSequence::new(frames, fps, source_name)
}

fn paint_centered(frame: &mut Frame, text: &str, y: usize) {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let x = width.saturating_sub(text_width(text)) / 2;
    draw_text(frame.pixels_mut(), width, height, text, x, y, TEXT_COLOR);
}

/// HSV to RGB. `h` in [0, 1) wraps; `s` and `v` in [0, 1].
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [u8; 3] {
    let h = (h.rem_euclid(1.0)) * 6.0;
    let sector = h.floor() as u32 % 6;
    let f = h - h.floor();
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match sector {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    ]
}
