//! # pg-curator engine
//!
//! A schema-agnostic administration engine over a PostgreSQL database.
//! Given only a connection, it discovers tables, columns and foreign-key
//! relationships at runtime and uses that graph to perform safe and
//! cascading mutations, plus multi-step archive operations (backup + export
//! + drop) that tolerate partial failure across a batch of tables.
//!
//! The entry point is [`Curator`](crate::prelude::Curator), an explicitly
//! constructed service object that hands out component handles:
//!
//! - [`SchemaIntrospector`](crate::prelude::SchemaIntrospector) — catalog
//!   discovery (tables, columns, foreign-key edges);
//! - [`PredicateExecutor`](crate::prelude::PredicateExecutor) — the sole
//!   point of contact with the store for rows and counts;
//! - [`CascadeMutationEngine`](crate::prelude::CascadeMutationEngine) —
//!   insert, cascading update/delete, dependency-checked safe delete,
//!   table drops;
//! - [`BackupOrchestrator`](crate::prelude::BackupOrchestrator) — external
//!   dump/restore tooling;
//! - [`ExportPipeline`](crate::prelude::ExportPipeline) — table and query
//!   result materialisation into `.xlsx`/`.json` files;
//! - [`ArchiveOrchestrator`](crate::prelude::ArchiveOrchestrator) — the
//!   per-table backup → export → drop pipeline with independent per-table
//!   outcomes.

mod archive;
mod backup;
mod curator;
mod executor;
mod export;
mod introspect;
mod mutation;
pub mod prelude;
mod sql;
mod storage;
