//! Table and query export pipeline.
//!
//! Exports land under `exports/<YYYYMMDD_HHMMSS>/`, one directory per run,
//! with `HHMMSS`-suffixed file names. Every read is capped at
//! [`EXPORT_ROW_LIMIT`] rows. Multi-table runs skip tables that cannot be
//! read and record them per table instead of aborting.

mod staging;
mod writers;

use std::path::Path;

use pg_curator_api::prelude::{
    CuratorResult, ExportBatch, ExportError, ExportFailure, ExportFile, ExportFormat, ResultSet,
    SchemaError, StorageLayout,
};
use sqlx::PgPool;

use crate::executor::PredicateExecutor;
use crate::introspect::SchemaIntrospector;
use crate::storage;

pub(crate) use writers::{write_json_rows, write_workbook};

/// Upper bound on rows read for any single export.
pub const EXPORT_ROW_LIMIT: i64 = 50_000;

/// Writes table contents and ad-hoc query results to disk.
pub struct ExportPipeline<'a> {
    pool: &'a PgPool,
    layout: &'a StorageLayout,
}

impl<'a> ExportPipeline<'a> {
    pub fn new(pool: &'a PgPool, layout: &'a StorageLayout) -> Self {
        Self { pool, layout }
    }

    async fn fetch_capped(&self, table: &str) -> CuratorResult<ResultSet> {
        SchemaIntrospector::new(self.pool).require_table(table).await?;
        PredicateExecutor::new(self.pool)
            .fetch(table, None, Some(EXPORT_ROW_LIMIT), 0)
            .await
    }

    fn write_set(
        &self,
        dir: &Path,
        stem: &str,
        format: ExportFormat,
        set: &ResultSet,
    ) -> CuratorResult<ExportFile> {
        if set.is_empty() {
            return Err(ExportError::Empty.into());
        }
        let file_name = format!("{stem}_{}.{}", storage::time_suffix(), format.extension());
        let path = dir.join(&file_name);
        match format {
            ExportFormat::Excel => {
                writers::write_workbook(&path, &[(stem.to_string(), set)])?;
            }
            ExportFormat::Json => writers::write_json_rows(&path, set)?,
        }
        tracing::info!(path = %path.display(), rows = set.len(), "export written");
        Ok(ExportFile { path, file_name })
    }

    /// Exports one table into a fresh timestamped directory.
    ///
    /// An empty table is an error here; in multi-table runs the same
    /// condition just produces an empty sheet or array.
    pub async fn export_table(
        &self,
        table: &str,
        format: ExportFormat,
    ) -> CuratorResult<ExportFile> {
        let set = self.fetch_capped(table).await?;
        let dir = storage::timestamp_dir(&self.layout.exports)?;
        self.write_set(&dir, table, format, &set)
    }

    /// Exports several tables into one combined file: a workbook with one
    /// sheet per table, or a JSON object keyed by table name.
    ///
    /// Tables that cannot be read are skipped and recorded per table; when
    /// none can be read the whole run fails.
    pub async fn export_tables(
        &self,
        tables: &[String],
        format: ExportFormat,
    ) -> CuratorResult<ExportBatch> {
        let mut sets: Vec<(String, ResultSet)> = Vec::with_capacity(tables.len());
        let mut failed = Vec::new();

        for table in tables {
            match self.fetch_capped(table).await {
                Ok(set) => sets.push((table.clone(), set)),
                Err(err) => {
                    tracing::warn!(table, %err, "skipping table in export run");
                    failed.push(ExportFailure {
                        table: table.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }
        if sets.is_empty() {
            return Err(SchemaError::TableNotFound(tables.join(", ")).into());
        }

        let dir = storage::timestamp_dir(&self.layout.exports)?;
        let file_name = format!(
            "tables_export_{}.{}",
            storage::time_suffix(),
            format.extension(),
        );
        let path = dir.join(&file_name);
        let sheets: Vec<(String, &ResultSet)> = sets
            .iter()
            .map(|(table, set)| (table.clone(), set))
            .collect();
        match format {
            ExportFormat::Excel => writers::write_workbook(&path, &sheets)?,
            ExportFormat::Json => writers::write_json_tables(&path, &sheets)?,
        }
        tracing::info!(
            path = %path.display(),
            tables = sets.len(),
            skipped = failed.len(),
            "combined export written",
        );

        Ok(ExportBatch {
            directory: dir,
            exported: vec![ExportFile { path, file_name }],
            failed,
        })
    }

    /// Exports every discovered table.
    pub async fn export_all(&self, format: ExportFormat) -> CuratorResult<ExportBatch> {
        let tables = SchemaIntrospector::new(self.pool).list_tables().await?;
        self.export_tables(&tables, format).await
    }

    /// Runs an ad-hoc statement and exports its result.
    ///
    /// The spreadsheet path round-trips the rows through a text staging
    /// table first, so mixed ad-hoc types reach the workbook writer as
    /// uniform text; the JSON path writes the typed values directly.
    pub async fn export_query(
        &self,
        statement: &str,
        format: ExportFormat,
    ) -> CuratorResult<ExportFile> {
        let mut set = PredicateExecutor::new(self.pool).run_query(statement).await?;
        set.rows.truncate(EXPORT_ROW_LIMIT as usize);

        let dir = storage::timestamp_dir(&self.layout.exports)?;
        match format {
            ExportFormat::Excel => {
                let normalized = staging::normalize_through_staging(self.pool, &set).await?;
                self.write_set(&dir, "query_export", format, &normalized)
            }
            ExportFormat::Json => self.write_set(&dir, "query_export", format, &set),
        }
    }
}
