//! Prelude exposes all the types for the `pg-curator-api` crate.

pub use crate::archive::{
    ArchiveJob, ArchiveOutcome, ArchiveRecord, ArchiveStage, ArchiveStatus, FailureNote,
};
pub use crate::backup::{BACKUP_EXTENSION, BackupDescriptor, BackupScope};
pub use crate::config::{ConnectionConfig, StorageLayout, ToolingConfig};
pub use crate::error::{
    CuratorError, CuratorResult, ExportError, QueryError, SchemaError, ToolingError,
};
pub use crate::export::{ExportBatch, ExportFailure, ExportFile, ExportFormat};
pub use crate::mutation::{Dependency, SafeDeleteOutcome};
pub use crate::predicate::Predicate;
pub use crate::result_set::{ResultSet, RowImage};
pub use crate::schema::{ColumnDescriptor, ForeignKeyEdge};
pub use crate::value::SqlValue;
