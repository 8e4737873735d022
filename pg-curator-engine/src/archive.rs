//! Table archiving pipeline.
//!
//! Archiving a table runs verify, backup, spreadsheet export, JSON export
//! and drop, strictly in that order; the destructive drop only happens once
//! every artifact for that table exists on disk. Tables are processed
//! sequentially and independently: a failing table is recorded with the
//! stage it failed at and the batch moves on. Every batch ends with a
//! manifest file next to its artifacts.

use std::path::{Path, PathBuf};

use chrono::Local;
use pg_curator_api::prelude::{
    ArchiveJob, ArchiveOutcome, ArchiveRecord, ArchiveStage, ArchiveStatus, ConnectionConfig,
    CuratorError, CuratorResult, FailureNote, ResultSet, SchemaError, StorageLayout, ToolingConfig,
};
use serde::Serialize;
use sqlx::PgPool;

use crate::backup::BackupOrchestrator;
use crate::executor::PredicateExecutor;
use crate::export::{write_json_rows, write_workbook};
use crate::introspect::SchemaIntrospector;
use crate::mutation::CascadeMutationEngine;
use crate::storage;

/// Batch summary written as `archive_info_<HHMMSS>.json` into the batch
/// directory.
#[derive(Serialize)]
struct ArchiveManifest<'a> {
    timestamp: String,
    tables_archived: usize,
    total_tables: usize,
    results: &'a [ArchiveOutcome],
}

fn write_manifest(dir: &Path, outcomes: &[ArchiveOutcome]) -> std::io::Result<PathBuf> {
    let manifest = ArchiveManifest {
        timestamp: Local::now().to_rfc3339(),
        tables_archived: outcomes.iter().filter(|o| o.is_success()).count(),
        total_tables: outcomes.len(),
        results: outcomes,
    };
    let path = dir.join(format!("archive_info_{}.json", storage::time_suffix()));
    let file = std::fs::File::create(&path)?;
    serde_json::to_writer_pretty(file, &manifest).map_err(std::io::Error::other)?;
    Ok(path)
}

/// Runs the archive pipeline over batches of tables.
pub struct ArchiveOrchestrator<'a> {
    pool: &'a PgPool,
    connection: &'a ConnectionConfig,
    tooling: &'a ToolingConfig,
    layout: &'a StorageLayout,
}

impl<'a> ArchiveOrchestrator<'a> {
    pub fn new(
        pool: &'a PgPool,
        connection: &'a ConnectionConfig,
        tooling: &'a ToolingConfig,
        layout: &'a StorageLayout,
    ) -> Self {
        Self {
            pool,
            connection,
            tooling,
            layout,
        }
    }

    // No row cap here: the pipeline ends by dropping the table, so the
    // exported artifacts must carry every row, not an excerpt.
    async fn verify(&self, table: &str) -> CuratorResult<ResultSet> {
        SchemaIntrospector::new(self.pool).require_table(table).await?;
        PredicateExecutor::new(self.pool)
            .fetch(table, None, None, 0)
            .await
    }

    async fn archive_one(&self, table: &str, dir: &Path) -> ArchiveOutcome {
        let fail = |stage: ArchiveStage, err: CuratorError| {
            tracing::warn!(table, %stage, %err, "table archive failed");
            ArchiveOutcome::Failure(FailureNote {
                table: table.to_string(),
                stage,
                message: err.to_string(),
            })
        };

        let rows = match self.verify(table).await {
            Ok(rows) => rows,
            Err(err) => return fail(ArchiveStage::Verify, err),
        };

        let backup = BackupOrchestrator::new(self.pool, self.connection, self.tooling, self.layout);
        let descriptor = match backup.backup_table(table, dir).await {
            Ok(descriptor) => descriptor,
            Err(err) => return fail(ArchiveStage::Backup, err),
        };

        let suffix = storage::time_suffix();
        let excel_path = dir.join(format!("{table}_{suffix}.xlsx"));
        if let Err(err) = write_workbook(&excel_path, &[(table.to_string(), &rows)]) {
            return fail(ArchiveStage::ExportExcel, err.into());
        }

        let json_path = dir.join(format!("{table}_{suffix}.json"));
        if let Err(err) = write_json_rows(&json_path, &rows) {
            return fail(ArchiveStage::ExportJson, err.into());
        }

        if let Err(err) = CascadeMutationEngine::new(self.pool).drop_table(table).await {
            return fail(ArchiveStage::Drop, err);
        }

        tracing::info!(table, rows = rows.len(), "table archived and dropped");
        ArchiveOutcome::Success(ArchiveRecord {
            table: table.to_string(),
            backup_file: file_name(&descriptor.path),
            excel_file: file_name(&excel_path),
            json_file: file_name(&json_path),
            rows_archived: rows.len(),
        })
    }

    /// Archives the named tables into one fresh batch directory and writes
    /// the batch manifest.
    ///
    /// Fails up front when none of the requested tables exists; a partially
    /// valid request proceeds and records the missing tables per table.
    pub async fn archive_tables(&self, tables: &[String]) -> CuratorResult<ArchiveJob> {
        let introspector = SchemaIntrospector::new(self.pool);
        let mut any_exists = false;
        for table in tables {
            if introspector.table_exists(table).await? {
                any_exists = true;
                break;
            }
        }
        if !any_exists {
            return Err(SchemaError::TableNotFound(tables.join(", ")).into());
        }

        let dir = storage::timestamp_dir(&self.layout.archives)?;

        let mut outcomes = Vec::with_capacity(tables.len());
        for table in tables {
            outcomes.push(self.archive_one(table, &dir).await);
        }

        let status = ArchiveStatus::from_outcomes(&outcomes);
        write_manifest(&dir, &outcomes)?;
        tracing::info!(
            dir = %dir.display(),
            archived = outcomes.iter().filter(|o| o.is_success()).count(),
            total = outcomes.len(),
            ?status,
            "archive batch finished",
        );

        Ok(ArchiveJob {
            archive_dir: dir,
            outcomes,
            status,
        })
    }

    /// Archives every discovered table.
    pub async fn archive_all_tables(&self) -> CuratorResult<ArchiveJob> {
        let tables = SchemaIntrospector::new(self.pool).list_tables().await?;
        self.archive_tables(&tables).await
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
