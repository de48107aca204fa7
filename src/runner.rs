//! Detection run orchestration.
//!
//! Walks a frame sequence with a `DetectionService`, packages candidates
//! into `Violation` records, and persists them through a `ViolationStore`,
//! bracketed by a detection session. A failed save is logged and counted,
//! never fatal, and never reflected in caller-visible results as if it had
//! been stored. A cancelled run still closes its session with the partial
//! counts.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;

use crate::detect::{CandidateViolation, DetectionService};
use crate::frame::FrameSequence;
use crate::store::{Violation, ViolationStore};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub session_id: i64,
    pub frames_processed: usize,
    pub violations_saved: usize,
    pub violations_skipped: usize,
    pub cancelled: bool,
}

/// Run detection over `sequence`, persisting into `store`.
///
/// `stop` is checked between frames; raising it cancels the remainder of the
/// run. `progress` receives `(frames_done, frames_total)` after each frame.
pub fn run_detection(
    sequence: &FrameSequence,
    session_name: &str,
    service: &mut dyn DetectionService,
    store: &mut dyn ViolationStore,
    stop: &AtomicBool,
    mut progress: impl FnMut(usize, usize),
) -> Result<RunSummary> {
    let total = sequence.len();
    let session_id = store.start_session(session_name, sequence.source())?;
    log::info!(
        "detection run '{}' over {} frames with backend '{}'",
        session_name,
        total,
        service.name()
    );

    let mut frames_processed = 0usize;
    let mut violations_saved = 0usize;
    let mut violations_skipped = 0usize;
    let mut cancelled = false;

    for index in 0..total {
        if stop.load(Ordering::SeqCst) {
            cancelled = true;
            log::info!("detection run '{}' cancelled at frame {}", session_name, index);
            break;
        }
        let Some(frame) = sequence.get(index) else {
            break;
        };

        let candidates = match service.detect(frame, index) {
            Ok(candidates) => candidates,
            Err(err) => {
                log::warn!("detection failed on frame {}: {}", index, err);
                Vec::new()
            }
        };

        for candidate in candidates {
            let mut violation = violation_from_candidate(sequence.source(), index, candidate);
            match store.save(&mut violation) {
                Ok(id) => {
                    violations_saved += 1;
                    log::info!(
                        "violation saved: id={} frame={} plate={}",
                        id,
                        index,
                        violation.license_plate.as_deref().unwrap_or("-")
                    );
                }
                Err(err) => {
                    violations_skipped += 1;
                    log::warn!("failed to save violation at frame {}: {}", index, err);
                }
            }
        }

        frames_processed += 1;
        progress(frames_processed, total);
    }

    // The session closes with its partial counts even when cancelled.
    if !store.end_session(session_id, total as i64, violations_saved as i64)? {
        log::warn!("detection session {} missing at close", session_id);
    }

    Ok(RunSummary {
        session_id,
        frames_processed,
        violations_saved,
        violations_skipped,
        cancelled,
    })
}

fn violation_from_candidate(
    source: &str,
    frame_index: usize,
    candidate: CandidateViolation,
) -> Violation {
    let mut violation = Violation::new(
        source,
        frame_index as i64,
        candidate.detection_confidence,
    );
    violation.license_plate = candidate.license_plate;
    violation.plate_confidence = candidate.plate_confidence;
    violation.location_info = candidate.location_info;
    violation.violation_type = candidate.violation_type;
    violation
}
