//! Prelude exposes all the types for the `pg-curator-engine` crate,
//! including the shared `pg-curator-api` types.

pub use pg_curator_api::prelude::*;

pub use crate::archive::ArchiveOrchestrator;
pub use crate::backup::{BackupOrchestrator, validate_backup_upload};
pub use crate::curator::Curator;
pub use crate::executor::PredicateExecutor;
pub use crate::export::{EXPORT_ROW_LIMIT, ExportPipeline};
pub use crate::introspect::SchemaIntrospector;
pub use crate::mutation::CascadeMutationEngine;
