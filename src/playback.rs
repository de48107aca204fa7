//! Playback over an extracted frame sequence.
//!
//! `PlaybackController` owns the loaded `FrameSequence`, the playback cursor,
//! and the Stopped/Playing/Paused state machine. It is deliberately free of
//! any timing source: something outside calls `tick()` at `tick_interval()`
//! while playing. `Ticker` is the stock timing source for that, a cancellable
//! periodic thread feeding a channel.
//!
//! The controller is meant to live on a single thread (the one that owns the
//! display). All side effects flow through the `PlaybackSink`, so the state
//! machine is testable without any UI.
//!
//! Scrub convention: seeking is accepted in any state, but while `Playing`
//! the input is ignored, matching the original application's slider, which
//! only applied changes when playback was idle. Tests pin this down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::frame::{Frame, FrameSequence};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// Where playback side effects land: a frame to display, the scrub position,
/// the elapsed-time readout.
pub trait PlaybackSink {
    fn show_frame(&mut self, index: usize, frame: &Frame);

    fn scrub_changed(&mut self, _index: usize) {}

    fn time_changed(&mut self, _label: &str) {}
}

/// Sink that discards everything; handy for headless runs.
pub struct NullSink;

impl PlaybackSink for NullSink {
    fn show_frame(&mut self, _index: usize, _frame: &Frame) {}
}

pub struct PlaybackController<S: PlaybackSink> {
    sink: S,
    sequence: Option<FrameSequence>,
    cursor: usize,
    state: PlaybackState,
}

impl<S: PlaybackSink> PlaybackController<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            sequence: None,
            cursor: 0,
            state: PlaybackState::Stopped,
        }
    }

    /// Load a sequence, replacing (and dropping) any previous one. Playback
    /// is reset and frame 0 is displayed.
    pub fn load(&mut self, sequence: FrameSequence) {
        log::info!(
            "loaded {} frames at {} fps from {}",
            sequence.len(),
            sequence.frame_rate(),
            sequence.source()
        );
        self.sequence = Some(sequence);
        self.state = PlaybackState::Stopped;
        self.cursor = 0;
        self.display_cursor_frame();
    }

    pub fn sequence(&self) -> Option<&FrameSequence> {
        self.sequence.as_ref()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Start or resume playback from the current cursor. No-op without a
    /// loaded sequence.
    pub fn play(&mut self) {
        if self.sequence.is_none() {
            log::debug!("play ignored: no sequence loaded");
            return;
        }
        self.state = PlaybackState::Playing;
    }

    /// Halt the tick clock, keep the cursor.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Stop and rewind: cursor to 0, frame 0 displayed.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.cursor = 0;
        self.display_cursor_frame();
    }

    /// Move the cursor to `index`.
    ///
    /// Out-of-range values and seeking with nothing loaded are input errors
    /// and change no state. While `Playing` the seek is ignored (see module
    /// docs); that is not an error.
    pub fn seek(&mut self, index: usize) -> Result<()> {
        let len = match &self.sequence {
            Some(seq) => seq.len(),
            None => return Err(anyhow!("cannot seek: no video loaded")),
        };
        if index >= len {
            return Err(anyhow!(
                "seek index {} out of range (sequence has {} frames)",
                index,
                len
            ));
        }
        if self.state == PlaybackState::Playing {
            log::debug!("seek to {} ignored while playing", index);
            return Ok(());
        }
        self.cursor = index;
        self.display_cursor_frame();
        Ok(())
    }

    /// One timer event. Only acts while `Playing`: displays the cursor
    /// frame, advances, syncs the scrub position, and auto-stops when the
    /// advanced cursor runs off the end of the sequence.
    pub fn tick(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let Some(seq) = &self.sequence else {
            return;
        };
        let len = seq.len();
        if let Some(frame) = seq.get(self.cursor) {
            self.sink.show_frame(self.cursor, frame);
        }
        self.cursor += 1;
        if self.cursor >= len {
            // End of sequence: the one self-triggered transition.
            self.stop();
            return;
        }
        self.sink.scrub_changed(self.cursor);
        let label = self.time_label();
        self.sink.time_changed(&label);
    }

    /// Period between ticks for the loaded sequence, integer milliseconds.
    pub fn tick_interval(&self) -> Option<Duration> {
        self.sequence
            .as_ref()
            .map(|seq| Duration::from_millis((1000.0 / seq.frame_rate()) as u64))
    }

    /// Elapsed time at the cursor, formatted `MM:SS`.
    pub fn time_label(&self) -> String {
        let seconds = match &self.sequence {
            Some(seq) => (self.cursor as f64 / seq.frame_rate()) as u64,
            None => 0,
        };
        format!("{:02}:{:02}", seconds / 60, seconds % 60)
    }

    fn display_cursor_frame(&mut self) {
        let Some(seq) = &self.sequence else {
            return;
        };
        if let Some(frame) = seq.get(self.cursor) {
            self.sink.show_frame(self.cursor, frame);
        }
        self.sink.scrub_changed(self.cursor);
        let label = self.time_label();
        self.sink.time_changed(&label);
    }
}

// ----------------------------------------------------------------------------
// Ticker
// ----------------------------------------------------------------------------

/// Cancellable periodic tick source, independent of any UI event loop.
///
/// A worker thread sends one unit onto the channel per period until the
/// ticker is cancelled or the receiver is dropped. Dropping the ticker
/// cancels and joins (the join waits at most one period).
pub struct Ticker {
    ticks: Receiver<()>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn(period: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_thread = stop.clone();
        let thread = std::thread::spawn(move || loop {
            std::thread::sleep(period);
            if stop_thread.load(Ordering::SeqCst) {
                break;
            }
            if tx.send(()).is_err() {
                break;
            }
        });
        Self {
            ticks: rx,
            stop,
            thread: Some(thread),
        }
    }

    pub fn ticks(&self) -> &Receiver<()> {
        &self.ticks
    }

    pub fn cancel(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
        if let Some(thread) = self.thread.take() {
            thread.join().ok();
        }
    }
}
