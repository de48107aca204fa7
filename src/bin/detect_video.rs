//! detect_video - run (mock) helmet detection over a video and persist the
//! resulting violations.
//!
//! Extraction falls back to placeholder frames when the decoder is missing,
//! so the full detect-and-persist workflow stays testable on any machine.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use ridesecure::{
    run_detection, validate_video_path, AppConfig, ExtractionJob, FrameOrigin,
    MockDetectionService, SqliteViolationStore, ViolationStore,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Video file to analyze (.mp4, .avi, .mov, .mkv).
    video: PathBuf,
    /// Path to the violations database.
    #[arg(long, env = "RIDESECURE_DB_PATH")]
    db_path: Option<String>,
    /// Emit one mock violation every N frames.
    #[arg(long)]
    every: Option<usize>,
    /// Deterministic seed for the mock backend.
    #[arg(long)]
    seed: Option<u64>,
    /// Session name recorded in the database.
    #[arg(long)]
    session_name: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let cfg = AppConfig::load()?;
    let ui = ui::Ui::auto();

    validate_video_path(&args.video)?;

    let db_path = args.db_path.unwrap_or_else(|| cfg.db_path.clone());
    let mut store = SqliteViolationStore::open(&db_path)?;

    let outcome = {
        let _stage = ui.stage("Extract frames");
        ExtractionJob::spawn(args.video.clone(), cfg.extraction.clone()).wait()?
    };
    if let FrameOrigin::Placeholder { reason } = &outcome.origin {
        eprintln!(
            "note: decoder unavailable ({}), detecting over placeholder frames",
            reason
        );
    }
    let sequence = outcome.sequence;

    let every = args.every.unwrap_or(cfg.detection.violation_every);
    let mut service = match args.seed.or(cfg.detection.seed) {
        Some(seed) => MockDetectionService::with_seed(every, seed),
        None => MockDetectionService::new(every),
    };
    let session_name = args
        .session_name
        .unwrap_or_else(|| format!("mock run: {}", sequence.source()));

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
        })?;
    }

    let bar = ui.frame_bar(sequence.len() as u64);
    let summary = run_detection(
        &sequence,
        &session_name,
        &mut service,
        &mut store,
        &stop,
        |done, _total| bar.set_position(done as u64),
    )?;
    bar.finish_and_clear();

    if summary.cancelled {
        eprintln!("detection cancelled by user");
    }
    println!(
        "session {}: {} frames processed, {} violations saved, {} skipped",
        summary.session_id,
        summary.frames_processed,
        summary.violations_saved,
        summary.violations_skipped
    );

    let stats = store.stats()?;
    println!(
        "store totals: {} violations ({} pending, {} processed), avg confidence {:.1}%",
        stats.total,
        stats.pending,
        stats.processed,
        stats.average_confidence * 100.0
    );
    Ok(())
}
