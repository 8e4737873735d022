use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Pipeline step at which a per-table archive failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveStage {
    Verify,
    Backup,
    ExportExcel,
    ExportJson,
    Drop,
}

impl std::fmt::Display for ArchiveStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveStage::Verify => write!(f, "verify"),
            ArchiveStage::Backup => write!(f, "backup"),
            ArchiveStage::ExportExcel => write!(f, "export-excel"),
            ArchiveStage::ExportJson => write!(f, "export-json"),
            ArchiveStage::Drop => write!(f, "drop"),
        }
    }
}

/// Bookkeeping for one successfully archived table.
///
/// Written only after the backup, both exports and the drop have all
/// succeeded for that table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub table: String,
    pub backup_file: String,
    pub excel_file: String,
    pub json_file: String,
    pub rows_archived: usize,
}

/// Bookkeeping for one table whose pipeline stopped early.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FailureNote {
    pub table: String,
    pub stage: ArchiveStage,
    pub message: String,
}

/// Per-table outcome within an archive batch.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ArchiveOutcome {
    Success(ArchiveRecord),
    Failure(FailureNote),
}

impl ArchiveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ArchiveOutcome::Success(_))
    }

    /// The table this outcome belongs to.
    pub fn table(&self) -> &str {
        match self {
            ArchiveOutcome::Success(record) => &record.table,
            ArchiveOutcome::Failure(note) => &note.table,
        }
    }
}

/// Overall status of an archive batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveStatus {
    /// Every table succeeded.
    Success,
    /// Some but not all tables succeeded.
    Partial,
    /// No table succeeded.
    Failure,
}

impl ArchiveStatus {
    /// Derives the batch status from its per-table outcomes.
    pub fn from_outcomes(outcomes: &[ArchiveOutcome]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        if succeeded == outcomes.len() && !outcomes.is_empty() {
            ArchiveStatus::Success
        } else if succeeded > 0 {
            ArchiveStatus::Partial
        } else {
            ArchiveStatus::Failure
        }
    }
}

/// A terminal archive batch: created per request, never retried
/// automatically, immutable history once returned to the caller.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchiveJob {
    /// Directory all of this batch's artifacts were written into.
    pub archive_dir: PathBuf,
    /// Ordered per-table outcomes, one entry per attempted table.
    pub outcomes: Vec<ArchiveOutcome>,
    pub status: ArchiveStatus,
}

impl ArchiveJob {
    /// Number of tables archived successfully.
    pub fn archived_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }
}
