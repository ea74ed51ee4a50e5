//! SQLite persistence: one table per record kind.

use std::path::{Path, PathBuf};

use fitts_core::{ParticipantId, ParticipantSummary, ScreeningRecord, TrialRecord};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::sink::{RecordSink, next_after};

pub struct SqliteSink {
    conn: Connection,
    path: Option<PathBuf>, // None for :memory:
}

impl SqliteSink {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let conn = Connection::open(path)?;
        let sink = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        sink.migrate()?;
        Ok(sink)
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> StoreResult<Self> {
        let sink = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        sink.migrate()?;
        Ok(sink)
    }

    fn migrate(&self) -> StoreResult<()> {
        self.conn
            .execute_batch(include_str!("../migrations/001_init.sql"))?;
        Ok(())
    }

    pub fn count_trials(&self, participant: ParticipantId) -> StoreResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM TrialData WHERE participant_id = ?1",
            params![participant.get()],
            |row| row.get(0),
        )?;
        usize::try_from(count)
            .map_err(|_| StoreError::Corrupt(format!("trial count '{count}' is negative")))
    }

    /// Accuracy recorded in the participant's summary row, if one exists
    pub fn summary_accuracy(&self, participant: ParticipantId) -> StoreResult<Option<f64>> {
        let accuracy = self
            .conn
            .query_row(
                "SELECT accuracy_percentage FROM ParticipantSummary WHERE participant_id = ?1",
                params![participant.get()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(accuracy)
    }
}

impl RecordSink for SqliteSink {
    fn next_participant_id(&mut self) -> StoreResult<ParticipantId> {
        let max: Option<i64> = self.conn.query_row(
            "SELECT MAX(pid) FROM (
                SELECT participant_id AS pid FROM ScreeningInfo
                UNION ALL SELECT participant_id FROM TrialData
                UNION ALL SELECT participant_id FROM ParticipantSummary
            )",
            [],
            |row| row.get(0),
        )?;
        let max = max
            .map(|m| {
                u32::try_from(m)
                    .map_err(|_| StoreError::Corrupt(format!("participant id '{m}' out of range")))
            })
            .transpose()?;
        next_after(max)
    }

    fn append_screening(&mut self, record: &ScreeningRecord) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO ScreeningInfo (participant_id, handedness, mouse_usage_hours, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.participant_id.get(),
                record.handedness.as_str(),
                record.mouse_usage.label(),
                record.timestamp.to_rfc3339(),
            ],
        )?;
        debug!(participant = %record.participant_id, "screening row inserted");
        Ok(())
    }

    fn append_trial(&mut self, record: &TrialRecord) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO TrialData (
                participant_id, trial_number, diameter, distance, direction,
                task_time, distance_travelled, hit, miss, square_time, timestamp
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                record.participant_id.get(),
                record.trial_number as i64,
                record.diameter,
                record.distance,
                record.direction.as_str(),
                record.task_time,
                record.distance_travelled,
                record.hit,
                record.miss,
                record.square_time,
                record.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn append_summary(&mut self, summary: &ParticipantSummary) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO ParticipantSummary (
                participant_id, total_distance, hits, misses,
                accuracy_percentage, average_square_time, timestamp
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                summary.participant_id.get(),
                summary.total_distance,
                summary.hits,
                summary.misses,
                summary.accuracy_percentage,
                summary.average_square_time,
                summary.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(p) => format!("sqlite database {}", p.display()),
            None => "sqlite database :memory:".to_string(),
        }
    }
}
