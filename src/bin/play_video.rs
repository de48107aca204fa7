//! play_video - extract a video into frames and play it back headlessly.
//!
//! The scrub position and elapsed-time readout render as a progress bar;
//! Ctrl-C stops playback. When the decoder is unavailable the run continues
//! on synthetic placeholder frames and says so.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use indicatif::ProgressBar;

use ridesecure::playback::{PlaybackController, PlaybackSink, PlaybackState, Ticker};
use ridesecure::{validate_video_path, AppConfig, ExtractionJob, Frame, FrameOrigin};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Video file to play (.mp4, .avi, .mov, .mkv).
    video: PathBuf,
    /// Start playback from this frame index.
    #[arg(long, default_value_t = 0)]
    start: usize,
}

/// Sink rendering playback position onto a progress bar.
struct BarSink {
    bar: ProgressBar,
}

impl PlaybackSink for BarSink {
    fn show_frame(&mut self, _index: usize, _frame: &Frame) {}

    fn scrub_changed(&mut self, index: usize) {
        self.bar.set_position(index as u64);
    }

    fn time_changed(&mut self, label: &str) {
        self.bar.set_message(label.to_string());
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let cfg = AppConfig::load()?;
    let ui = ui::Ui::auto();

    validate_video_path(&args.video)?;

    let outcome = {
        let _stage = ui.stage("Extract frames");
        ExtractionJob::spawn(args.video.clone(), cfg.extraction.clone()).wait()?
    };
    if let FrameOrigin::Placeholder { reason } = &outcome.origin {
        eprintln!("note: decoder unavailable ({}), playing placeholder frames", reason);
    }
    let sequence = outcome.sequence;
    eprintln!(
        "{}: {} frames at {} fps ({:.1}s)",
        sequence.source(),
        sequence.len(),
        sequence.frame_rate(),
        sequence.duration_secs()
    );

    let bar = ui.frame_bar(sequence.len() as u64);
    let mut controller = PlaybackController::new(BarSink { bar: bar.clone() });
    controller.load(sequence);
    if args.start > 0 {
        controller.seek(args.start)?;
    }

    let interval = controller
        .tick_interval()
        .ok_or_else(|| anyhow!("no sequence loaded"))?;

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        ctrlc::set_handler(move || {
            interrupted.store(true, Ordering::SeqCst);
        })?;
    }

    controller.play();
    let ticker = Ticker::spawn(interval);
    loop {
        if interrupted.load(Ordering::SeqCst) {
            controller.stop();
            eprintln!("playback interrupted");
            break;
        }
        // The timeout keeps the Ctrl-C check responsive even if the ticker
        // thread stalls.
        match ticker.ticks().recv_timeout(interval + Duration::from_millis(250)) {
            Ok(()) => controller.tick(),
            Err(_) => break,
        }
        if controller.state() == PlaybackState::Stopped {
            break;
        }
    }
    drop(ticker);
    bar.finish_with_message(controller.time_label());

    eprintln!("done at {}", controller.time_label());
    Ok(())
}
