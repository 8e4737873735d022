//! External dump/restore tooling.
//!
//! Shells out to `pg_dump`/`pg_restore` with a fixed flag set, captures the
//! process outcome and bounds every invocation with the configured timeout.
//! The password travels through the `PGPASSWORD` environment variable and
//! never appears on a command line.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use pg_curator_api::prelude::{
    BACKUP_EXTENSION, BackupDescriptor, BackupScope, ConnectionConfig, CuratorResult,
    StorageLayout, ToolingConfig, ToolingError,
};
use sqlx::PgPool;
use tokio::process::Command;

use crate::introspect::SchemaIntrospector;
use crate::mutation::CascadeMutationEngine;
use crate::storage;

/// One diagnostic of the restore tool is benign: dumps taken from newer
/// servers carry configuration parameters (e.g. `transaction_timeout`) the
/// target server does not recognize. Restores whose only error is this one
/// are successful.
const BENIGN_RESTORE_WARNING: &str = "unrecognized configuration parameter";

/// Drives the external dump/restore utilities.
pub struct BackupOrchestrator<'a> {
    pool: &'a PgPool,
    connection: &'a ConnectionConfig,
    tooling: &'a ToolingConfig,
    layout: &'a StorageLayout,
}

struct ToolOutput {
    exit_code: i32,
    stdout: String,
    stderr: String,
}

impl ToolOutput {
    fn combined(&self) -> String {
        format!("{}\n{}", self.stderr, self.stdout)
    }
}

/// Upload contract: a restore request must carry the backup format's own
/// extension; anything else is rejected before any filesystem or database
/// action.
pub fn validate_backup_upload(file_name: &str) -> Result<(), ToolingError> {
    let valid = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(BACKUP_EXTENSION));
    if valid {
        Ok(())
    } else {
        Err(ToolingError::InvalidExtension(file_name.to_string()))
    }
}

/// Classifies a restore run. A nonzero exit is still a success when the
/// recognized benign diagnostic is present and no *other* error text is.
fn restore_succeeded(exit_code: i32, output: &str) -> bool {
    if exit_code == 0 {
        return true;
    }
    if !output.contains(BENIGN_RESTORE_WARNING) {
        return false;
    }
    !output.lines().any(|line| {
        line.to_ascii_lowercase().contains("error:") && !line.contains(BENIGN_RESTORE_WARNING)
    })
}

/// Fixed dump argument contract: custom archive format, no tablespaces, no
/// unlogged table data, explicit output path, verbose progress.
fn dump_args(connection: &ConnectionConfig, table: Option<&str>, output: &Path) -> Vec<String> {
    let mut args = vec![
        "-h".to_string(),
        connection.host.clone(),
        "-U".to_string(),
        connection.user.clone(),
        "-p".to_string(),
        connection.port.to_string(),
        "-d".to_string(),
        connection.database.clone(),
    ];
    if let Some(table) = table {
        args.push("-t".to_string());
        args.push(table.to_string());
    }
    args.extend([
        "-F".to_string(),
        "c".to_string(),
        "--no-tablespaces".to_string(),
        "--no-unlogged-table-data".to_string(),
        "-f".to_string(),
        output.display().to_string(),
        "-v".to_string(),
    ]);
    args
}

/// Fixed restore argument contract.
fn restore_args(connection: &ConnectionConfig, input: &Path) -> Vec<String> {
    vec![
        "-h".to_string(),
        connection.host.clone(),
        "-U".to_string(),
        connection.user.clone(),
        "-p".to_string(),
        connection.port.to_string(),
        "-d".to_string(),
        connection.database.clone(),
        "-v".to_string(),
        "--clean".to_string(),
        "--if-exists".to_string(),
        "--no-comments".to_string(),
        "--no-tablespaces".to_string(),
        input.display().to_string(),
    ]
}

impl<'a> BackupOrchestrator<'a> {
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

    async fn run_tool(&self, program: &Path, args: Vec<String>) -> Result<ToolOutput, ToolingError> {
        let tool = program.display().to_string();
        let mut command = Command::new(program);
        command
            .args(&args)
            .env("PGPASSWORD", &self.connection.password)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let seconds = self.tooling.timeout.as_secs();
        let output = tokio::time::timeout(self.tooling.timeout, command.output())
            .await
            .map_err(|_| ToolingError::TimedOut {
                tool: tool.clone(),
                seconds,
            })?
            .map_err(|source| ToolingError::Spawn { tool, source })?;

        Ok(ToolOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn dump_to(
        &self,
        table: Option<&str>,
        output_path: PathBuf,
    ) -> CuratorResult<BackupDescriptor> {
        let args = dump_args(self.connection, table, &output_path);
        let output = self.run_tool(&self.tooling.pg_dump, args).await?;

        if output.exit_code != 0 {
            return Err(ToolingError::Failed {
                tool: self.tooling.pg_dump.display().to_string(),
                status: output.exit_code,
                output: output.combined(),
            }
            .into());
        }

        tracing::info!(path = %output_path.display(), "dump completed");
        Ok(BackupDescriptor {
            path: output_path,
            scope: match table {
                Some(table) => BackupScope::Table(table.to_string()),
                None => BackupScope::Database,
            },
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    /// Full custom-format dump of the whole database into a fresh
    /// timestamped subdirectory of `backups/`.
    pub async fn backup_database(&self) -> CuratorResult<BackupDescriptor> {
        let dir = storage::timestamp_dir(&self.layout.backups)?;
        let file = dir.join(format!(
            "backup_{}_{}.{BACKUP_EXTENSION}",
            self.connection.database,
            storage::dir_stamp(),
        ));
        self.dump_to(None, file).await
    }

    /// Dump of a single table into the given directory (the archive
    /// pipeline passes its own batch directory here).
    pub async fn backup_table(
        &self,
        table: &str,
        destination: &Path,
    ) -> CuratorResult<BackupDescriptor> {
        let file = destination.join(format!(
            "backup_{table}_{}.{BACKUP_EXTENSION}",
            storage::time_suffix(),
        ));
        self.dump_to(Some(table), file).await
    }

    /// Restores the database from a custom-format dump file.
    ///
    /// Existing tables are dropped first, best-effort: an individual drop
    /// failure is logged and the restore continues, letting the restore
    /// tool's `--clean --if-exists` handle the rest.
    pub async fn restore(&self, backup_file: &Path) -> CuratorResult<()> {
        if !backup_file.is_file() {
            return Err(ToolingError::MissingFile(backup_file.to_path_buf()).into());
        }
        let file_name = backup_file
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        validate_backup_upload(file_name)?;

        self.drop_existing_tables().await;

        let args = restore_args(self.connection, backup_file);
        let output = self.run_tool(&self.tooling.pg_restore, args).await?;
        let combined = output.combined();

        if restore_succeeded(output.exit_code, &combined) {
            if output.exit_code != 0 {
                tracing::warn!("restore reported only the benign configuration-parameter warning");
            }
            tracing::info!(path = %backup_file.display(), "restore completed");
            Ok(())
        } else {
            Err(ToolingError::Failed {
                tool: self.tooling.pg_restore.display().to_string(),
                status: output.exit_code,
                output: combined,
            }
            .into())
        }
    }

    async fn drop_existing_tables(&self) {
        let introspector = SchemaIntrospector::new(self.pool);
        let mutations = CascadeMutationEngine::new(self.pool);

        let tables = match introspector.list_tables().await {
            Ok(tables) => tables,
            Err(err) => {
                tracing::warn!(%err, "could not list tables before restore");
                return;
            }
        };
        for table in tables {
            if let Err(err) = mutations.drop_table(&table).await {
                tracing::warn!(table, %err, "could not drop table before restore");
            }
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn config() -> ConnectionConfig {
        ConnectionConfig {
            host: "dbhost".to_string(),
            port: 5433,
            database: "inventory".to_string(),
            user: "admin".to_string(),
            password: "s3cret".to_string(),
        }
    }

    #[test]
    fn test_should_build_dump_args_without_password() {
        let args = dump_args(&config(), None, Path::new("/tmp/out.backup"));
        assert_eq!(
            args,
            vec![
                "-h",
                "dbhost",
                "-U",
                "admin",
                "-p",
                "5433",
                "-d",
                "inventory",
                "-F",
                "c",
                "--no-tablespaces",
                "--no-unlogged-table-data",
                "-f",
                "/tmp/out.backup",
                "-v",
            ],
        );
        assert!(!args.iter().any(|a| a.contains("s3cret")));
    }

    #[test]
    fn test_should_scope_dump_args_to_single_table() {
        let args = dump_args(&config(), Some("orders"), Path::new("/tmp/orders.backup"));
        let t = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[t + 1], "orders");
    }

    #[test]
    fn test_should_build_restore_args_with_clean_flags() {
        let args = restore_args(&config(), Path::new("/tmp/in.backup"));
        for flag in ["--clean", "--if-exists", "--no-comments", "--no-tablespaces"] {
            assert!(args.iter().any(|a| a == flag), "missing {flag}");
        }
        assert_eq!(args.last().unwrap(), "/tmp/in.backup");
        assert!(!args.iter().any(|a| a.contains("s3cret")));
    }

    #[test]
    fn test_should_treat_zero_exit_as_success() {
        assert!(restore_succeeded(0, "pg_restore: done"));
    }

    #[test]
    fn test_should_treat_benign_warning_only_as_success() {
        let output = "pg_restore: error: could not execute query: ERROR:  \
                      unrecognized configuration parameter \"transaction_timeout\"\n\
                      Command was: SET transaction_timeout = 0;";
        assert!(restore_succeeded(1, output));
    }

    #[test]
    fn test_should_fail_when_other_fatal_errors_are_present() {
        let output = "pg_restore: error: could not execute query: ERROR:  \
                      unrecognized configuration parameter \"transaction_timeout\"\n\
                      pg_restore: error: could not execute query: ERROR: relation \"x\" already exists";
        assert!(!restore_succeeded(1, output));
    }

    #[test]
    fn test_should_fail_on_nonzero_exit_without_benign_warning() {
        assert!(!restore_succeeded(1, "pg_restore: error: connection failed"));
    }

    #[test]
    fn test_should_accept_backup_extension_case_insensitively() {
        assert!(validate_backup_upload("snapshot.backup").is_ok());
        assert!(validate_backup_upload("SNAPSHOT.BACKUP").is_ok());
    }

    #[test]
    fn test_should_reject_foreign_upload_extensions() {
        assert!(validate_backup_upload("dump.sql").is_err());
        assert!(validate_backup_upload("archive.tar.gz").is_err());
        assert!(validate_backup_upload("no_extension").is_err());
    }
}
