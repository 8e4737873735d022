use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// File extension of the custom-format dump files pg-curator produces and
/// accepts for restore.
pub const BACKUP_EXTENSION: &str = "backup";

/// What a dump invocation covered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackupScope {
    /// The whole database.
    Database,
    /// A single named table.
    Table(String),
}

/// Outcome of one external dump invocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackupDescriptor {
    /// Where the dump file was written.
    pub path: PathBuf,
    pub scope: BackupScope,
    /// Exit code of the dump utility.
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error (the dump tool logs progress here with `-v`).
    pub stderr: String,
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_should_serialize_backup_descriptor() {
        let descriptor = BackupDescriptor {
            path: PathBuf::from("backups/20240315_103045/backup_orders_103045.backup"),
            scope: BackupScope::Table("orders".to_string()),
            exit_code: 0,
            stdout: String::new(),
            stderr: "pg_dump: dumping contents of table \"public.orders\"".to_string(),
        };

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["exit_code"], 0);
        assert_eq!(json["scope"]["Table"], "orders");
    }
}
