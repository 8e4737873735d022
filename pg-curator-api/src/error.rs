use std::path::PathBuf;

use thiserror::Error;

/// pg-curator error type.
#[derive(Debug, Error)]
pub enum CuratorError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("Query error: {0}")]
    Query(#[from] QueryError),
    #[error("Tooling error: {0}")]
    Tooling(#[from] ToolingError),
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// pg-curator result type.
pub type CuratorResult<T> = Result<T, CuratorError>;

/// Errors raised while introspecting the database catalog.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The named table does not exist in the discovered schema.
    #[error("table not found: {0}")]
    TableNotFound(String),
    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Errors raised while executing statements against the store.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The store is unreachable; all subsequent steps abort.
    #[error("database unreachable: {0}")]
    Connection(String),
    /// A store-level constraint (unique, foreign key, not-null, check)
    /// rejected the statement. The whole unit of work has been rolled back.
    #[error("constraint violation [{code}]: {message}")]
    Constraint { code: String, message: String },
    #[error("statement failed: {0}")]
    Execution(#[source] sqlx::Error),
}

impl QueryError {
    /// Classifies a driver error into the pg-curator taxonomy.
    ///
    /// SQLSTATE class 23 (integrity constraint violation) maps to
    /// [`QueryError::Constraint`]; transport-level failures map to
    /// [`QueryError::Connection`]; everything else stays a generic
    /// execution error.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => {
                let code = db.code().map(|c| c.to_string()).unwrap_or_default();
                if code.starts_with("23") {
                    QueryError::Constraint {
                        code,
                        message: db.message().to_string(),
                    }
                } else {
                    QueryError::Execution(sqlx::Error::Database(db))
                }
            }
            sqlx::Error::Io(e) => QueryError::Connection(e.to_string()),
            sqlx::Error::Tls(e) => QueryError::Connection(e.to_string()),
            sqlx::Error::PoolTimedOut => {
                QueryError::Connection("connection pool timed out".to_string())
            }
            sqlx::Error::PoolClosed => QueryError::Connection("connection pool closed".to_string()),
            other => QueryError::Execution(other),
        }
    }
}

/// Errors raised by the external dump/restore tooling.
#[derive(Debug, Error)]
pub enum ToolingError {
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with status {status}: {output}")]
    Failed {
        tool: String,
        status: i32,
        output: String,
    },
    #[error("{tool} timed out after {seconds}s")]
    TimedOut { tool: String, seconds: u64 },
    #[error("backup file not found: {0}")]
    MissingFile(PathBuf),
    /// The upload contract requires the backup format's own extension.
    #[error("invalid backup file extension for {0}: expected .backup")]
    InvalidExtension(String),
}

/// Errors raised by the export pipeline.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Nothing to write: the table or result set has no rows.
    #[error("no rows to export")]
    Empty,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
