//! Background extraction worker.
//!
//! Extraction blocks on the decoder subprocess for up to the configured
//! timeout, so it never runs on the thread that owns playback and display.
//! One worker thread is spawned per load; the result travels back over an
//! mpsc channel held by the `ExtractionHandle`.
//!
//! Dropping the handle discards interest in the result: the worker's send
//! fails silently and the thread winds down on its own. Opening another
//! video while an extraction is in flight is therefore just "drop the old
//! handle, spawn a new job".

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{anyhow, Result};

use super::{extract_with, ExtractionOutcome, FfmpegDecoder, FrameDecoder};
use crate::config::ExtractionSettings;

pub struct ExtractionJob;

impl ExtractionJob {
    /// Spawn extraction with the configured ffmpeg decoder.
    pub fn spawn(path: PathBuf, settings: ExtractionSettings) -> ExtractionHandle {
        let decoder = FfmpegDecoder::from_settings(&settings);
        Self::spawn_with(path, settings, decoder)
    }

    /// Spawn extraction with an explicit decoder.
    pub fn spawn_with<D>(path: PathBuf, settings: ExtractionSettings, decoder: D) -> ExtractionHandle
    where
        D: FrameDecoder + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let thread = std::thread::spawn(move || {
            let result = extract_with(&path, &settings, &decoder);
            // The receiver may be gone already; that just means nobody wants
            // this sequence anymore.
            tx.send(result).ok();
        });
        ExtractionHandle {
            rx,
            thread: Some(thread),
        }
    }
}

/// Receiving end of one extraction run.
pub struct ExtractionHandle {
    rx: Receiver<Result<ExtractionOutcome>>,
    thread: Option<JoinHandle<()>>,
}

impl ExtractionHandle {
    /// Non-blocking poll. `None` while the worker is still running.
    pub fn try_recv(&mut self) -> Option<Result<ExtractionOutcome>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(Err(anyhow!("extraction worker terminated unexpectedly")))
            }
        }
    }

    /// Wait up to `timeout` for the result.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<Result<ExtractionOutcome>> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                Some(Err(anyhow!("extraction worker terminated unexpectedly")))
            }
        }
    }

    /// Block until the worker finishes and hand back its result.
    pub fn wait(mut self) -> Result<ExtractionOutcome> {
        let result = match self.rx.recv() {
            Ok(result) => result,
            Err(_) => Err(anyhow!("extraction worker terminated unexpectedly")),
        };
        if let Some(thread) = self.thread.take() {
            thread.join().ok();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionSettings;
    use crate::extract::FrameOrigin;
    use std::io::Write;

    fn settings_with_scratch(dir: &std::path::Path) -> ExtractionSettings {
        let mut settings = ExtractionSettings::default();
        settings.decoder_bin = "ridesecure-no-such-decoder-binary".to_string();
        settings.scratch_dir = Some(dir.to_path_buf());
        settings
    }

    #[test]
    fn worker_delivers_placeholder_outcome() {
        let scratch = tempfile::tempdir().unwrap();
        let video_dir = tempfile::tempdir().unwrap();
        let video = video_dir.path().join("clip.mp4");
        std::fs::File::create(&video)
            .unwrap()
            .write_all(b"not a real video")
            .unwrap();

        let handle = ExtractionJob::spawn(video, settings_with_scratch(scratch.path()));
        let outcome = handle.wait().unwrap();
        assert!(matches!(outcome.origin, FrameOrigin::Placeholder { .. }));
        assert_eq!(outcome.sequence.len(), crate::extract::PLACEHOLDER_FRAME_COUNT);
    }

    #[test]
    fn worker_reports_invalid_input_as_error() {
        let scratch = tempfile::tempdir().unwrap();
        let handle = ExtractionJob::spawn(
            PathBuf::from("/nonexistent/clip.mp4"),
            settings_with_scratch(scratch.path()),
        );
        assert!(handle.wait().is_err());
    }

    #[test]
    fn dropping_the_handle_discards_the_result() {
        let scratch = tempfile::tempdir().unwrap();
        let video_dir = tempfile::tempdir().unwrap();
        let video = video_dir.path().join("clip.mp4");
        std::fs::File::create(&video).unwrap();

        let handle = ExtractionJob::spawn(video, settings_with_scratch(scratch.path()));
        drop(handle); // worker finishes on its own; send just fails
    }
}
