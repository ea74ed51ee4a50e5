//! Append-only CSV files, one per table, with an explicit header row.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fitts_core::{ParticipantId, ParticipantSummary, ScreeningRecord, TrialRecord};
use serde::Serialize;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::sink::{RecordSink, next_after};

const SCREENING_FILE: &str = "ScreeningInfo.csv";
const TRIAL_FILE: &str = "TrialData.csv";
const SUMMARY_FILE: &str = "ParticipantSummary.csv";

const SCREENING_HEADER: [&str; 5] = [
    "id",
    "participant_id",
    "handedness",
    "mouse_usage_hours",
    "timestamp",
];
const TRIAL_HEADER: [&str; 12] = [
    "id",
    "participant_id",
    "trial_number",
    "diameter",
    "distance",
    "direction",
    "task_time",
    "distance_travelled",
    "hit",
    "miss",
    "square_time",
    "timestamp",
];
const SUMMARY_HEADER: [&str; 8] = [
    "id",
    "participant_id",
    "total_distance",
    "hits",
    "misses",
    "accuracy_percentage",
    "average_square_time",
    "timestamp",
];

#[derive(Serialize)]
struct ScreeningRow<'a> {
    id: u64,
    participant_id: u32,
    handedness: &'a str,
    mouse_usage_hours: &'a str,
    timestamp: String,
}

#[derive(Serialize)]
struct TrialRow<'a> {
    id: u64,
    participant_id: u32,
    trial_number: usize,
    diameter: u32,
    distance: u32,
    direction: &'a str,
    task_time: f64,
    distance_travelled: f64,
    hit: bool,
    miss: bool,
    square_time: f64,
    timestamp: String,
}

#[derive(Serialize)]
struct SummaryRow {
    id: u64,
    participant_id: u32,
    total_distance: f64,
    hits: u32,
    misses: u32,
    accuracy_percentage: f64,
    average_square_time: f64,
    timestamp: String,
}

/// One CSV table: file path plus the number of data rows already in it
struct Table {
    path: PathBuf,
    rows: u64,
}

impl Table {
    fn open(dir: &Path, name: &str, header: &[&str]) -> StoreResult<Self> {
        let path = dir.join(name);
        let empty = std::fs::metadata(&path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);
        if empty {
            let mut writer = csv::Writer::from_path(&path)?;
            writer.write_record(header)?;
            writer.flush().map_err(|e| StoreError::io(&path, e))?;
            return Ok(Self { path, rows: 0 });
        }
        let rows = csv::Reader::from_path(&path)?.records().count() as u64;
        Ok(Self { path, rows })
    }

    fn append<R: Serialize>(&mut self, row: &R) -> StoreResult<()> {
        let file: File = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.serialize(row)?;
        writer.flush().map_err(|e| StoreError::io(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    fn next_row_id(&self) -> u64 {
        self.rows + 1
    }

    /// Largest numeric `participant_id`; rows whose value is not a number are skipped
    fn max_participant(&self) -> StoreResult<Option<u32>> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let column = reader
            .headers()?
            .iter()
            .position(|h| h == "participant_id")
            .ok_or_else(|| {
                StoreError::Corrupt(format!(
                    "{} has no participant_id column",
                    self.path.display()
                ))
            })?;
        let mut max = None;
        for record in reader.records() {
            let record = record?;
            if let Some(id) = record.get(column).and_then(|v| v.trim().parse::<u32>().ok()) {
                max = max.max(Some(id));
            }
        }
        Ok(max)
    }
}

pub struct CsvSink {
    dir: PathBuf,
    screening: Table,
    trials: Table,
    summaries: Table,
}

impl CsvSink {
    /// Open the tables in `dir`, creating the directory and any missing file with its header.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self {
            screening: Table::open(&dir, SCREENING_FILE, &SCREENING_HEADER)?,
            trials: Table::open(&dir, TRIAL_FILE, &TRIAL_HEADER)?,
            summaries: Table::open(&dir, SUMMARY_FILE, &SUMMARY_HEADER)?,
            dir,
        })
    }

    pub fn screening_path(&self) -> &Path {
        &self.screening.path
    }

    pub fn trial_path(&self) -> &Path {
        &self.trials.path
    }

    pub fn summary_path(&self) -> &Path {
        &self.summaries.path
    }
}

impl RecordSink for CsvSink {
    fn next_participant_id(&mut self) -> StoreResult<ParticipantId> {
        let max = [&self.screening, &self.trials, &self.summaries]
            .into_iter()
            .map(Table::max_participant)
            .collect::<StoreResult<Vec<_>>>()?
            .into_iter()
            .flatten()
            .max();
        next_after(max)
    }

    fn append_screening(&mut self, record: &ScreeningRecord) -> StoreResult<()> {
        let row = ScreeningRow {
            id: self.screening.next_row_id(),
            participant_id: record.participant_id.get(),
            handedness: record.handedness.as_str(),
            mouse_usage_hours: record.mouse_usage.label(),
            timestamp: record.timestamp.to_rfc3339(),
        };
        self.screening.append(&row)?;
        debug!(participant = %record.participant_id, row = row.id, "screening row appended");
        Ok(())
    }

    fn append_trial(&mut self, record: &TrialRecord) -> StoreResult<()> {
        let row = TrialRow {
            id: self.trials.next_row_id(),
            participant_id: record.participant_id.get(),
            trial_number: record.trial_number,
            diameter: record.diameter,
            distance: record.distance,
            direction: record.direction.as_str(),
            task_time: record.task_time,
            distance_travelled: record.distance_travelled,
            hit: record.hit,
            miss: record.miss,
            square_time: record.square_time,
            timestamp: record.timestamp.to_rfc3339(),
        };
        self.trials.append(&row)
    }

    fn append_summary(&mut self, summary: &ParticipantSummary) -> StoreResult<()> {
        let row = SummaryRow {
            id: self.summaries.next_row_id(),
            participant_id: summary.participant_id.get(),
            total_distance: summary.total_distance,
            hits: summary.hits,
            misses: summary.misses,
            accuracy_percentage: summary.accuracy_percentage,
            average_square_time: summary.average_square_time,
            timestamp: summary.timestamp.to_rfc3339(),
        };
        self.summaries.append(&row)
    }

    fn describe(&self) -> String {
        format!("csv directory {}", self.dir.display())
    }
}
