use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::detect::backend::{CandidateViolation, DetectionService};
use crate::frame::Frame;
use crate::store::VIOLATION_TYPE_NO_HELMET;

/// Mock backend: emits one fabricated violation for every N-th inspected
/// frame, with randomized plate and confidence values shaped like the real
/// detector's output. Stands in for the model-backed service during UI and
/// workflow testing.
pub struct MockDetectionService {
    rng: StdRng,
    violation_every: usize,
    inspected: usize,
}

impl MockDetectionService {
    pub fn new(violation_every: usize) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            violation_every: violation_every.max(1),
            inspected: 0,
        }
    }

    /// Deterministic variant for tests.
    pub fn with_seed(violation_every: usize, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            violation_every: violation_every.max(1),
            inspected: 0,
        }
    }

    fn fabricate(&mut self) -> CandidateViolation {
        let plate = format!(
            "MH{:02}AB{:04}",
            self.rng.gen_range(0..100),
            self.rng.gen_range(0..10000)
        );
        CandidateViolation {
            detection_confidence: self.rng.gen_range(0.70..1.0),
            license_plate: Some(plate),
            plate_confidence: Some(self.rng.gen_range(0.80..1.0)),
            location_info: Some(format!("Traffic Junction {}", self.rng.gen_range(1..=10))),
            violation_type: VIOLATION_TYPE_NO_HELMET.to_string(),
        }
    }
}

impl DetectionService for MockDetectionService {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn detect(&mut self, _frame: &Frame, _frame_index: usize) -> Result<Vec<CandidateViolation>> {
        self.inspected += 1;
        if self.inspected % self.violation_every == 0 {
            Ok(vec![self.fabricate()])
        } else {
            Ok(vec![])
        }
    }
}
