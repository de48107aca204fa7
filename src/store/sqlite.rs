use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{
    DetectionSession, Violation, ViolationStats, ViolationStore, SESSION_COMPLETED,
    SESSION_RUNNING, STATUS_DETECTED, STATUS_PROCESSED,
};

/// SQLite-backed violation store.
///
/// Timestamps are written by this code as RFC 3339 TEXT (no SQL-side
/// defaults), so the in-memory store behaves identically and rows round-trip
/// through chrono without format surprises.
pub struct SqliteViolationStore {
    conn: Connection,
}

impl SqliteViolationStore {
    pub fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("open violations database {}", db_path))?;
        let store = Self { conn };
        store.ensure_schema()?;
        log::info!("violation store opened at {}", db_path);
        Ok(store)
    }

    /// Private in-memory database, for tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        let store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS violations (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              timestamp TEXT NOT NULL,
              video_source TEXT NOT NULL,
              frame_number INTEGER NOT NULL,
              detection_confidence REAL NOT NULL,
              license_plate TEXT,
              plate_confidence REAL,
              snapshot_path TEXT,
              location_info TEXT,
              violation_type TEXT NOT NULL DEFAULT 'NO_HELMET',
              status TEXT NOT NULL DEFAULT 'DETECTED',
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_violations_timestamp
              ON violations(timestamp);
            CREATE INDEX IF NOT EXISTS idx_violations_license_plate
              ON violations(license_plate);
            CREATE INDEX IF NOT EXISTS idx_violations_video_source
              ON violations(video_source);

            CREATE TABLE IF NOT EXISTS detection_sessions (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              session_name TEXT NOT NULL,
              video_path TEXT NOT NULL,
              start_time TEXT NOT NULL,
              end_time TEXT,
              total_frames INTEGER NOT NULL DEFAULT 0,
              processed_frames INTEGER NOT NULL DEFAULT 0,
              violations_detected INTEGER NOT NULL DEFAULT 0,
              status TEXT NOT NULL DEFAULT 'RUNNING'
            );

            CREATE TABLE IF NOT EXISTS model_performance (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              model_name TEXT NOT NULL,
              model_version TEXT NOT NULL,
              test_date TEXT NOT NULL,
              accuracy REAL,
              precision_score REAL,
              recall_score REAL,
              f1_score REAL,
              notes TEXT
            );
            "#,
        )?;
        Ok(())
    }
}

const VIOLATION_COLUMNS: &str = "id, timestamp, video_source, frame_number, \
     detection_confidence, license_plate, plate_confidence, snapshot_path, \
     location_info, violation_type, status, created_at, updated_at";

fn row_to_violation(row: &Row<'_>) -> rusqlite::Result<Violation> {
    Ok(Violation {
        id: Some(row.get(0)?),
        timestamp: row.get(1)?,
        video_source: row.get(2)?,
        frame_number: row.get(3)?,
        detection_confidence: row.get(4)?,
        license_plate: row.get(5)?,
        plate_confidence: row.get(6)?,
        snapshot_path: row.get(7)?,
        location_info: row.get(8)?,
        violation_type: row.get(9)?,
        status: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn row_to_session(row: &Row<'_>) -> rusqlite::Result<DetectionSession> {
    Ok(DetectionSession {
        id: row.get(0)?,
        session_name: row.get(1)?,
        video_path: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        total_frames: row.get(5)?,
        processed_frames: row.get(6)?,
        violations_detected: row.get(7)?,
        status: row.get(8)?,
    })
}

impl ViolationStore for SqliteViolationStore {
    fn save(&mut self, violation: &mut Violation) -> Result<i64> {
        violation.validate()?;
        let now = Utc::now();

        self.conn
            .execute(
                r#"
                INSERT INTO violations (
                  timestamp, video_source, frame_number, detection_confidence,
                  license_plate, plate_confidence, snapshot_path, location_info,
                  violation_type, status, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
                params![
                    violation.timestamp,
                    violation.video_source,
                    violation.frame_number,
                    violation.detection_confidence,
                    violation.license_plate,
                    violation.plate_confidence,
                    violation.snapshot_path,
                    violation.location_info,
                    violation.violation_type,
                    violation.status,
                    now,
                    now,
                ],
            )
            .context("insert violation")?;

        let id = self.conn.last_insert_rowid();
        violation.id = Some(id);
        violation.created_at = now;
        violation.updated_at = now;
        log::debug!("violation saved with id {}", id);
        Ok(id)
    }

    fn list_all(&self) -> Result<Vec<Violation>> {
        let sql = format!(
            "SELECT {} FROM violations ORDER BY timestamp DESC, id DESC",
            VIOLATION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_violation)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn list_by_license_plate(&self, pattern: &str) -> Result<Vec<Violation>> {
        let sql = format!(
            "SELECT {} FROM violations WHERE license_plate LIKE ?1 \
             ORDER BY timestamp DESC, id DESC",
            VIOLATION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let like = format!("%{}%", pattern);
        let rows = stmt.query_map(params![like], row_to_violation)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn update_status(&mut self, id: i64, new_status: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE violations SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![new_status, Utc::now(), id],
        )?;
        Ok(changed > 0)
    }

    fn delete(&mut self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM violations WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    fn delete_all(&mut self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM violations", [])?;
        Ok(removed)
    }

    fn stats(&self) -> Result<ViolationStats> {
        let mut stmt = self.conn.prepare(
            "SELECT COUNT(*), \
                    COUNT(CASE WHEN status = ?1 THEN 1 END), \
                    COUNT(CASE WHEN status = ?2 THEN 1 END), \
                    AVG(detection_confidence) \
             FROM violations",
        )?;
        let stats = stmt.query_row(params![STATUS_DETECTED, STATUS_PROCESSED], |row| {
            Ok(ViolationStats {
                total: row.get(0)?,
                pending: row.get(1)?,
                processed: row.get(2)?,
                average_confidence: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
            })
        })?;
        Ok(stats)
    }

    fn start_session(&mut self, name: &str, video_path: &str) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO detection_sessions (session_name, video_path, start_time, status) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![name, video_path, Utc::now(), SESSION_RUNNING],
            )
            .context("insert detection session")?;
        let id = self.conn.last_insert_rowid();
        log::info!("detection session '{}' started with id {}", name, id);
        Ok(id)
    }

    fn end_session(
        &mut self,
        id: i64,
        total_frames: i64,
        violations_detected: i64,
    ) -> Result<bool> {
        let end_time: DateTime<Utc> = Utc::now();
        let changed = self.conn.execute(
            "UPDATE detection_sessions \
             SET end_time = ?1, total_frames = ?2, violations_detected = ?3, status = ?4 \
             WHERE id = ?5",
            params![
                end_time,
                total_frames,
                violations_detected,
                SESSION_COMPLETED,
                id
            ],
        )?;
        Ok(changed > 0)
    }

    fn get_session(&self, id: i64) -> Result<Option<DetectionSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_name, video_path, start_time, end_time, total_frames, \
                    processed_frames, violations_detected, status \
             FROM detection_sessions WHERE id = ?1",
        )?;
        let session = stmt
            .query_row(params![id], row_to_session)
            .optional()
            .context("load detection session")?;
        Ok(session)
    }
}
