//! Spreadsheet export: a folder holding one CSV per sheet plus a JSON dump of the session.

use std::path::{Path, PathBuf};
use std::process::Command;

use fitts_core::{ParticipantSummary, TrialRecord};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{StoreError, StoreResult};

pub const TRIAL_SHEET: &str = "Trial Data.csv";
pub const SUMMARY_SHEET: &str = "Summary.csv";
pub const SESSION_JSON: &str = "session.json";

#[derive(Debug, Clone)]
pub struct ExportedWorkbook {
    pub dir: PathBuf,
    pub trial_sheet: PathBuf,
    pub summary_sheet: PathBuf,
    pub session_json: PathBuf,
}

#[derive(Serialize)]
struct TrialSheetRow<'a> {
    #[serde(rename = "Participant ID")]
    participant_id: u32,
    #[serde(rename = "Trial")]
    trial_number: usize,
    #[serde(rename = "Diameter")]
    diameter: u32,
    #[serde(rename = "Distance")]
    distance: u32,
    #[serde(rename = "Direction")]
    direction: &'a str,
    #[serde(rename = "Task Time")]
    task_time: f64,
    #[serde(rename = "Distance Travelled")]
    distance_travelled: f64,
    #[serde(rename = "Success")]
    hit: bool,
    #[serde(rename = "Miss")]
    miss: bool,
    #[serde(rename = "Square Click Time")]
    square_time: f64,
}

#[derive(Serialize)]
struct SummarySheetRow {
    #[serde(rename = "Participant ID")]
    participant_id: u32,
    #[serde(rename = "Total Distance")]
    total_distance: f64,
    #[serde(rename = "Hits")]
    hits: u32,
    #[serde(rename = "Misses")]
    misses: u32,
    #[serde(rename = "Accuracy (%)")]
    accuracy_percentage: f64,
    #[serde(rename = "Average Square Click Time")]
    average_square_time: f64,
}

#[derive(Serialize)]
struct SessionDump<'a> {
    trials: &'a [TrialRecord],
    summaries: &'a [ParticipantSummary],
}

pub fn export_workbook(
    dir: &Path,
    trials: &[TrialRecord],
    summaries: &[ParticipantSummary],
) -> StoreResult<ExportedWorkbook> {
    std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let trial_sheet = dir.join(TRIAL_SHEET);
    let mut writer = csv::Writer::from_path(&trial_sheet)?;
    for t in trials {
        writer.serialize(TrialSheetRow {
            participant_id: t.participant_id.get(),
            trial_number: t.trial_number,
            diameter: t.diameter,
            distance: t.distance,
            direction: t.direction.as_str(),
            task_time: t.task_time,
            distance_travelled: t.distance_travelled,
            hit: t.hit,
            miss: t.miss,
            square_time: t.square_time,
        })?;
    }
    writer.flush().map_err(|e| StoreError::io(&trial_sheet, e))?;

    let summary_sheet = dir.join(SUMMARY_SHEET);
    let mut writer = csv::Writer::from_path(&summary_sheet)?;
    for s in summaries {
        writer.serialize(SummarySheetRow {
            participant_id: s.participant_id.get(),
            total_distance: s.total_distance,
            hits: s.hits,
            misses: s.misses,
            accuracy_percentage: s.accuracy_percentage,
            average_square_time: s.average_square_time,
        })?;
    }
    writer.flush().map_err(|e| StoreError::io(&summary_sheet, e))?;

    let session_json = dir.join(SESSION_JSON);
    let file =
        std::fs::File::create(&session_json).map_err(|e| StoreError::io(&session_json, e))?;
    serde_json::to_writer_pretty(file, &SessionDump { trials, summaries })?;

    info!(dir = %dir.display(), trials = trials.len(), "workbook exported");
    Ok(ExportedWorkbook {
        dir: dir.to_path_buf(),
        trial_sheet,
        summary_sheet,
        session_json,
    })
}

/// Hands `path` to the platform's default viewer without waiting for it.
pub fn open_in_viewer(path: &Path) -> StoreResult<()> {
    let mut command = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else if cfg!(target_os = "macos") {
        Command::new("open")
    } else {
        Command::new("xdg-open")
    };
    match command.arg(path).spawn() {
        Ok(_) => Ok(()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not launch a viewer");
            Err(StoreError::io(path, e))
        }
    }
}
