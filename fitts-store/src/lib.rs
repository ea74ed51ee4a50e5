pub mod config;
pub mod consent;
pub mod delimited;
pub mod error;
pub mod export;
pub mod sink;
pub mod sqlite;

pub use config::{StorageConfig, StorageMode};
pub use delimited::CsvSink;
pub use error::{StoreError, StoreResult};
pub use export::{ExportedWorkbook, export_workbook, open_in_viewer};
pub use sink::{MemorySink, RecordSink};
pub use sqlite::SqliteSink;
