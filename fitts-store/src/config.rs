use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::delimited::CsvSink;
use crate::error::StoreResult;
use crate::sink::{MemorySink, RecordSink};
use crate::sqlite::SqliteSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Sqlite,
    Csv,
    Memory,
}

impl FromStr for StorageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" | "db" => Ok(StorageMode::Sqlite),
            "csv" => Ok(StorageMode::Csv),
            "memory" => Ok(StorageMode::Memory),
            other => Err(format!("unknown storage mode '{other}' (sqlite, csv, memory)")),
        }
    }
}

/// Storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub mode: StorageMode,
    /// Database file used in sqlite mode
    pub sqlite_path: PathBuf,
    /// Directory holding the CSV tables in csv mode
    pub csv_dir: PathBuf,
    /// Where to write the consent receipt; none disables it
    pub consent_receipt: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: StorageMode::Csv,
            sqlite_path: PathBuf::from("data/fitts.db"),
            csv_dir: PathBuf::from("data"),
            consent_receipt: Some(PathBuf::from("data/consent.txt")),
        }
    }
}

impl StorageConfig {
    /// Opens the configured sink. Failure here is fatal for the run.
    pub fn open_sink(&self) -> StoreResult<Box<dyn RecordSink>> {
        let sink: Box<dyn RecordSink> = match self.mode {
            StorageMode::Sqlite => Box::new(SqliteSink::open(&self.sqlite_path)?),
            StorageMode::Csv => Box::new(CsvSink::open(&self.csv_dir)?),
            StorageMode::Memory => Box::new(MemorySink::new()),
        };
        info!(sink = %sink.describe(), "storage ready");
        Ok(sink)
    }
}
