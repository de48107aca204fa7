use anyhow::Result;

use crate::frame::Frame;

/// One violation candidate reported for a frame, before persistence.
///
/// Confidences are in `[0, 1]`. Plate fields are None when no plate could be
/// read from the frame.
#[derive(Clone, Debug)]
pub struct CandidateViolation {
    pub detection_confidence: f64,
    pub license_plate: Option<String>,
    pub plate_confidence: Option<f64>,
    pub location_info: Option<String>,
    pub violation_type: String,
}

/// Detection backend trait.
///
/// The extraction/playback core only ever talks to this trait; a concrete
/// model runtime (the external Python inference package, an ONNX runner)
/// plugs in behind it without the core changing. The bundled implementation
/// is `MockDetectionService`, which fakes detections for UI and workflow
/// testing.
pub trait DetectionService {
    /// Backend identifier for logs and session names.
    fn name(&self) -> &'static str;

    /// Inspect one frame and report zero or more violation candidates.
    ///
    /// Implementations must treat the frame as read-only and must not retain
    /// references beyond the call.
    fn detect(&mut self, frame: &Frame, frame_index: usize) -> Result<Vec<CandidateViolation>>;
}
