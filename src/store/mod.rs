//! Violation persistence.
//!
//! - `Violation`, `DetectionSession`, `ViolationStats`: the records the
//!   application reads and writes.
//! - `ViolationStore`: the storage trait. Binaries construct a concrete
//!   store and pass it down; nothing in the crate reaches for a global.
//! - `SqliteViolationStore`: production implementation.
//! - `InMemoryViolationStore`: Vec-backed mirror for tests and dry runs.
//!
//! Store errors are ordinary `Result`s. Callers at the display boundary log
//! them and leave their in-memory state untouched, so what is shown never
//! diverges from what was actually persisted.

mod memory;
mod sqlite;

pub use memory::InMemoryViolationStore;
pub use sqlite::SqliteViolationStore;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

pub const VIOLATION_TYPE_NO_HELMET: &str = "NO_HELMET";
pub const STATUS_DETECTED: &str = "DETECTED";
pub const STATUS_PROCESSED: &str = "PROCESSED";
pub const SESSION_RUNNING: &str = "RUNNING";
pub const SESSION_COMPLETED: &str = "COMPLETED";

/// One detected helmet violation.
#[derive(Clone, Debug, PartialEq)]
pub struct Violation {
    /// Assigned by the store on first save.
    pub id: Option<i64>,
    /// Capture time of the detection event.
    pub timestamp: DateTime<Utc>,
    /// File name or path of the source video.
    pub video_source: String,
    /// Frame index within the source.
    pub frame_number: i64,
    /// Detector confidence, 0.0 to 1.0.
    pub detection_confidence: f64,
    pub license_plate: Option<String>,
    /// Plate-recognition confidence, 0.0 to 1.0 when present.
    pub plate_confidence: Option<f64>,
    pub snapshot_path: Option<String>,
    pub location_info: Option<String>,
    pub violation_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Violation {
    pub fn new(video_source: impl Into<String>, frame_number: i64, confidence: f64) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            timestamp: now,
            video_source: video_source.into(),
            frame_number,
            detection_confidence: confidence,
            license_plate: None,
            plate_confidence: None,
            snapshot_path: None,
            location_info: None,
            violation_type: VIOLATION_TYPE_NO_HELMET.to_string(),
            status: STATUS_DETECTED.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check the record invariants before persistence.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.detection_confidence) {
            return Err(anyhow!(
                "detection confidence {} outside [0, 1]",
                self.detection_confidence
            ));
        }
        if let Some(conf) = self.plate_confidence {
            if !(0.0..=1.0).contains(&conf) {
                return Err(anyhow!("plate confidence {} outside [0, 1]", conf));
            }
        }
        if self.video_source.trim().is_empty() {
            return Err(anyhow!("video source must not be empty"));
        }
        if self.frame_number < 0 {
            return Err(anyhow!("frame number must not be negative"));
        }
        Ok(())
    }
}

/// Aggregate counts over the violations table.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViolationStats {
    pub total: i64,
    pub pending: i64,
    pub processed: i64,
    pub average_confidence: f64,
}

/// Bookkeeping for one detection run over one video.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionSession {
    pub id: i64,
    pub session_name: String,
    pub video_path: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_frames: i64,
    pub processed_frames: i64,
    pub violations_detected: i64,
    pub status: String,
}

/// Durable record of detected violations plus session bookkeeping.
pub trait ViolationStore {
    /// Insert a violation. On success the record's `id` is filled in and
    /// returned; `created_at`/`updated_at` are stamped by the store.
    fn save(&mut self, violation: &mut Violation) -> Result<i64>;

    /// All violations, most recent first.
    fn list_all(&self) -> Result<Vec<Violation>>;

    /// Violations whose plate contains `pattern`, most recent first.
    fn list_by_license_plate(&self, pattern: &str) -> Result<Vec<Violation>>;

    /// Set a violation's status, bumping `updated_at`. Returns false when no
    /// such row exists.
    fn update_status(&mut self, id: i64, new_status: &str) -> Result<bool>;

    /// Delete one violation. Returns false when no such row exists.
    fn delete(&mut self, id: i64) -> Result<bool>;

    /// Delete every violation ("clear all"), returning the count removed.
    fn delete_all(&mut self) -> Result<usize>;

    fn stats(&self) -> Result<ViolationStats>;

    /// Open a detection session, returning its id.
    fn start_session(&mut self, name: &str, video_path: &str) -> Result<i64>;

    /// Close a session with its final counts.
    fn end_session(&mut self, id: i64, total_frames: i64, violations_detected: i64)
        -> Result<bool>;

    fn get_session(&self, id: i64) -> Result<Option<DetectionSession>>;
}
