use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Output formats the export pipeline can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    /// `.xlsx` workbook, one sheet per table.
    Excel,
    /// `.json`, array of rows or table→rows map, ISO-8601 timestamps.
    Json,
}

impl ExportFormat {
    /// File extension for this format, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "xlsx",
            ExportFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Excel => write!(f, "excel"),
            ExportFormat::Json => write!(f, "json"),
        }
    }
}

/// A file the export pipeline wrote.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportFile {
    /// Full path of the written file.
    pub path: PathBuf,
    /// Bare file name (what a download would be served as).
    pub file_name: String,
}

/// One table that could not be exported during a batch run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportFailure {
    pub table: String,
    pub message: String,
}

/// Per-table bookkeeping of a multi-table export run.
///
/// A failing table never aborts the batch; it lands in `failed` and the run
/// carries on with the remaining tables.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExportBatch {
    /// Directory the batch wrote into.
    pub directory: PathBuf,
    pub exported: Vec<ExportFile>,
    pub failed: Vec<ExportFailure>,
}

impl ExportBatch {
    /// Whether every requested table was written.
    pub fn is_complete(&self) -> bool {
        !self.exported.is_empty() && self.failed.is_empty()
    }
}
