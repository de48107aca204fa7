//! RideSecure core.
//!
//! Headless engine for a helmet-violation logging application: turn a video
//! file into playable frames, drive playback, and persist detected
//! violations.
//!
//! # Architecture
//!
//! - `frame`: RGB bitmap frames and the immutable `FrameSequence`
//! - `extract`: decoder subprocess, synthetic fallback, background worker
//! - `playback`: cursor state machine, sink seam, cancellable ticker
//! - `detect`: `DetectionService` trait and the bundled mock backend
//! - `store`: `ViolationStore` trait with SQLite and in-memory impls
//! - `runner`: one detection run = session + per-frame detect + persist
//! - `config`: defaults, JSON config file, `RIDESECURE_*` env overrides
//!
//! Actual inference is out of scope: the mock backend fabricates detections
//! so the rest of the application can be exercised end to end, and a
//! model-backed `DetectionService` slots in without core changes. Extraction
//! failures degrade to synthetic frames rather than taking anything down.

pub mod config;
pub mod detect;
pub mod extract;
pub mod frame;
pub mod playback;
pub mod runner;
pub mod store;

pub use config::{AppConfig, DetectionSettings, ExtractionSettings};
pub use detect::{CandidateViolation, DetectionService, MockDetectionService};
pub use extract::{
    is_supported_video, validate_video_path, ExtractionHandle, ExtractionJob, ExtractionOutcome,
    FfmpegDecoder, FrameDecoder, FrameOrigin,
};
pub use frame::{fit_within, Frame, FrameSequence};
pub use playback::{NullSink, PlaybackController, PlaybackSink, PlaybackState, Ticker};
pub use runner::{run_detection, RunSummary};
pub use store::{
    DetectionSession, InMemoryViolationStore, SqliteViolationStore, Violation, ViolationStats,
    ViolationStore,
};
