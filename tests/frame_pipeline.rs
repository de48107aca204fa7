//! Full pipeline over a decoder double that writes real JPEG files, the way
//! the external decoder would.

use std::path::{Path, PathBuf};

use anyhow::Result;
use image::RgbImage;

use ridesecure::extract::{extract_with, FrameDecoder, FrameOrigin};
use ridesecure::ExtractionSettings;

/// Decoder double: pretends the video is `duration_secs` long and writes one
/// JPEG per sampled frame, numbered like the real decoder output.
struct JpegWritingDecoder {
    duration_secs: u32,
    width: u32,
    height: u32,
}

impl FrameDecoder for JpegWritingDecoder {
    fn name(&self) -> &'static str {
        "jpeg-double"
    }

    fn extract_frames(&self, _video: &Path, fps: u32, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let count = fps * self.duration_secs;
        let mut files = Vec::new();
        for i in 0..count {
            let shade = (i % 256) as u8;
            let img = RgbImage::from_pixel(self.width, self.height, image::Rgb([shade, 0, 0]));
            let path = out_dir.join(format!("frame_{:04}.jpg", i + 1));
            img.save(&path)?;
            files.push(path);
        }
        Ok(files)
    }
}

fn fake_video(dir: &Path) -> PathBuf {
    let path = dir.join("ride.mp4");
    std::fs::write(&path, b"container bytes").unwrap();
    path
}

fn settings(scratch: &Path) -> ExtractionSettings {
    let mut settings = ExtractionSettings::default();
    settings.scratch_dir = Some(scratch.to_path_buf());
    settings
}

#[test]
fn five_second_video_at_ten_fps_yields_fifty_frames() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let video = fake_video(dir.path());
    let decoder = JpegWritingDecoder {
        duration_secs: 5,
        width: 1280,
        height: 720,
    };

    let outcome = extract_with(&video, &settings(scratch.path()), &decoder).unwrap();

    assert_eq!(outcome.origin, FrameOrigin::Decoded);
    let diff = (outcome.sequence.len() as i64 - 50).abs();
    assert!(diff <= 1, "got {} frames", outcome.sequence.len());
    assert!((outcome.sequence.frame_rate() - 10.0).abs() < 1e-9);
}

#[test]
fn decoded_frames_are_downscaled_with_aspect_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let video = fake_video(dir.path());
    let decoder = JpegWritingDecoder {
        duration_secs: 1,
        width: 1920,
        height: 1080,
    };

    let outcome = extract_with(&video, &settings(scratch.path()), &decoder).unwrap();

    let frame = outcome.sequence.get(0).unwrap();
    assert_eq!((frame.width(), frame.height()), (640, 360));
    assert_eq!(
        frame.pixels().len(),
        (frame.width() * frame.height() * 3) as usize
    );
}

#[test]
fn small_sources_are_not_upscaled() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let video = fake_video(dir.path());
    let decoder = JpegWritingDecoder {
        duration_secs: 1,
        width: 320,
        height: 180,
    };

    let outcome = extract_with(&video, &settings(scratch.path()), &decoder).unwrap();
    let frame = outcome.sequence.get(0).unwrap();
    assert_eq!((frame.width(), frame.height()), (320, 180));
}

#[test]
fn frames_keep_temporal_order() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let video = fake_video(dir.path());
    let decoder = JpegWritingDecoder {
        duration_secs: 3,
        width: 64,
        height: 36,
    };

    let outcome = extract_with(&video, &settings(scratch.path()), &decoder).unwrap();

    // The double paints frame i with red = i % 256; JPEG is lossy, so allow
    // slack while confirming the shades increase monotonically.
    let seq = &outcome.sequence;
    let first = seq.get(0).unwrap().pixel_at(10, 10).unwrap()[0] as i32;
    let mid = seq.get(15).unwrap().pixel_at(10, 10).unwrap()[0] as i32;
    let last = seq.get(29).unwrap().pixel_at(10, 10).unwrap()[0] as i32;
    assert!(first < mid && mid < last, "{} {} {}", first, mid, last);
}

/// Decoder double that reports success but writes nothing.
struct EmptyDecoder;

impl FrameDecoder for EmptyDecoder {
    fn name(&self) -> &'static str {
        "empty"
    }

    fn extract_frames(&self, _video: &Path, _fps: u32, _out_dir: &Path) -> Result<Vec<PathBuf>> {
        Ok(Vec::new())
    }
}

#[test]
fn zero_output_files_falls_back_to_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let video = fake_video(dir.path());

    let outcome = extract_with(&video, &settings(scratch.path()), &EmptyDecoder).unwrap();
    assert!(outcome.is_placeholder());
    assert_eq!(outcome.sequence.len(), 100);
}

/// Decoder double that produces one unreadable file among good ones.
struct CorruptMiddleDecoder;

impl FrameDecoder for CorruptMiddleDecoder {
    fn name(&self) -> &'static str {
        "corrupt-middle"
    }

    fn extract_frames(&self, _video: &Path, _fps: u32, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for i in 1..=3u32 {
            let path = out_dir.join(format!("frame_{:04}.jpg", i));
            if i == 2 {
                std::fs::write(&path, b"garbage")?;
            } else {
                RgbImage::from_pixel(32, 32, image::Rgb([200, 200, 200])).save(&path)?;
            }
            files.push(path);
        }
        Ok(files)
    }
}

#[test]
fn unreadable_frame_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let video = fake_video(dir.path());

    let outcome =
        extract_with(&video, &settings(scratch.path()), &CorruptMiddleDecoder).unwrap();
    assert_eq!(outcome.origin, FrameOrigin::Decoded);
    assert_eq!(outcome.sequence.len(), 2);
}

#[test]
fn stale_frames_from_a_prior_run_are_purged() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let video = fake_video(dir.path());

    // Long stale run first, then a short one in the same scratch dir.
    let long = JpegWritingDecoder {
        duration_secs: 3,
        width: 64,
        height: 36,
    };
    let short = JpegWritingDecoder {
        duration_secs: 1,
        width: 64,
        height: 36,
    };
    extract_with(&video, &settings(scratch.path()), &long).unwrap();
    let outcome = extract_with(&video, &settings(scratch.path()), &short).unwrap();
    assert_eq!(outcome.sequence.len(), 10);
}
