use anyhow::Result;
use chrono::Utc;

use super::{
    DetectionSession, Violation, ViolationStats, ViolationStore, SESSION_COMPLETED,
    SESSION_RUNNING, STATUS_DETECTED, STATUS_PROCESSED,
};

/// Vec-backed store with the same observable behavior as the SQLite
/// implementation. Used as a test double and for dry runs that should not
/// touch a database file.
#[derive(Debug, Default)]
pub struct InMemoryViolationStore {
    violations: Vec<Violation>,
    sessions: Vec<DetectionSession>,
    next_violation_id: i64,
    next_session_id: i64,
}

impl InMemoryViolationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted_desc(&self, mut rows: Vec<Violation>) -> Vec<Violation> {
        rows.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.id.cmp(&a.id))
        });
        rows
    }
}

impl ViolationStore for InMemoryViolationStore {
    fn save(&mut self, violation: &mut Violation) -> Result<i64> {
        violation.validate()?;
        self.next_violation_id += 1;
        let id = self.next_violation_id;
        let now = Utc::now();
        violation.id = Some(id);
        violation.created_at = now;
        violation.updated_at = now;
        self.violations.push(violation.clone());
        Ok(id)
    }

    fn list_all(&self) -> Result<Vec<Violation>> {
        Ok(self.sorted_desc(self.violations.clone()))
    }

    fn list_by_license_plate(&self, pattern: &str) -> Result<Vec<Violation>> {
        let matching = self
            .violations
            .iter()
            .filter(|v| {
                v.license_plate
                    .as_deref()
                    .map(|plate| plate.contains(pattern))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        Ok(self.sorted_desc(matching))
    }

    fn update_status(&mut self, id: i64, new_status: &str) -> Result<bool> {
        for v in &mut self.violations {
            if v.id == Some(id) {
                v.status = new_status.to_string();
                v.updated_at = Utc::now();
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn delete(&mut self, id: i64) -> Result<bool> {
        let before = self.violations.len();
        self.violations.retain(|v| v.id != Some(id));
        Ok(self.violations.len() < before)
    }

    fn delete_all(&mut self) -> Result<usize> {
        let removed = self.violations.len();
        self.violations.clear();
        Ok(removed)
    }

    fn stats(&self) -> Result<ViolationStats> {
        let total = self.violations.len() as i64;
        let pending = self
            .violations
            .iter()
            .filter(|v| v.status == STATUS_DETECTED)
            .count() as i64;
        let processed = self
            .violations
            .iter()
            .filter(|v| v.status == STATUS_PROCESSED)
            .count() as i64;
        let average_confidence = if total > 0 {
            self.violations
                .iter()
                .map(|v| v.detection_confidence)
                .sum::<f64>()
                / total as f64
        } else {
            0.0
        };
        Ok(ViolationStats {
            total,
            pending,
            processed,
            average_confidence,
        })
    }

    fn start_session(&mut self, name: &str, video_path: &str) -> Result<i64> {
        self.next_session_id += 1;
        let id = self.next_session_id;
        self.sessions.push(DetectionSession {
            id,
            session_name: name.to_string(),
            video_path: video_path.to_string(),
            start_time: Utc::now(),
            end_time: None,
            total_frames: 0,
            processed_frames: 0,
            violations_detected: 0,
            status: SESSION_RUNNING.to_string(),
        });
        Ok(id)
    }

    fn end_session(
        &mut self,
        id: i64,
        total_frames: i64,
        violations_detected: i64,
    ) -> Result<bool> {
        for session in &mut self.sessions {
            if session.id == id {
                session.end_time = Some(Utc::now());
                session.total_frames = total_frames;
                session.violations_detected = violations_detected;
                session.status = SESSION_COMPLETED.to_string();
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn get_session(&self, id: i64) -> Result<Option<DetectionSession>> {
        Ok(self.sessions.iter().find(|s| s.id == id).cloned())
    }
}
