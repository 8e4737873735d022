//! The service object tying the components together.
//!
//! A [`Curator`] is constructed explicitly and passed where it is needed;
//! there is no process-global instance. Each accessor hands out a cheap
//! borrowing component over the shared connection pool, so callers compose
//! operations without re-connecting.

use pg_curator_api::prelude::{
    ConnectionConfig, CuratorResult, QueryError, StorageLayout, ToolingConfig,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::archive::ArchiveOrchestrator;
use crate::backup::BackupOrchestrator;
use crate::executor::PredicateExecutor;
use crate::export::ExportPipeline;
use crate::introspect::SchemaIntrospector;
use crate::mutation::CascadeMutationEngine;
use crate::storage;

const MAX_CONNECTIONS: u32 = 5;

/// Administration service over one PostgreSQL database.
pub struct Curator {
    pool: PgPool,
    connection: ConnectionConfig,
    tooling: ToolingConfig,
    layout: StorageLayout,
}

impl Curator {
    /// Connects with default tooling and storage layout.
    pub async fn connect(connection: ConnectionConfig) -> CuratorResult<Self> {
        Self::connect_with(connection, ToolingConfig::default(), StorageLayout::default()).await
    }

    /// Connects with explicit tooling and storage layout, creating the
    /// storage directories up front.
    pub async fn connect_with(
        connection: ConnectionConfig,
        tooling: ToolingConfig,
        layout: StorageLayout,
    ) -> CuratorResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(&connection.url())
            .await
            .map_err(QueryError::from_sqlx)?;
        storage::ensure_layout(&layout)?;
        tracing::info!(
            host = %connection.host,
            database = %connection.database,
            "connected",
        );

        Ok(Self {
            pool,
            connection,
            tooling,
            layout,
        })
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// The connection parameters this service was built with.
    pub fn connection(&self) -> &ConnectionConfig {
        &self.connection
    }

    /// Catalog discovery.
    pub fn schema(&self) -> SchemaIntrospector<'_> {
        SchemaIntrospector::new(&self.pool)
    }

    /// Row fetching and ad-hoc statements.
    pub fn executor(&self) -> PredicateExecutor<'_> {
        PredicateExecutor::new(&self.pool)
    }

    /// Insert, cascading update/delete, safe delete, drops.
    pub fn mutations(&self) -> CascadeMutationEngine<'_> {
        CascadeMutationEngine::new(&self.pool)
    }

    /// External dump/restore tooling.
    pub fn backup(&self) -> BackupOrchestrator<'_> {
        BackupOrchestrator::new(&self.pool, &self.connection, &self.tooling, &self.layout)
    }

    /// Table and query exports.
    pub fn export(&self) -> ExportPipeline<'_> {
        ExportPipeline::new(&self.pool, &self.layout)
    }

    /// The backup → export → drop pipeline.
    pub fn archive(&self) -> ArchiveOrchestrator<'_> {
        ArchiveOrchestrator::new(&self.pool, &self.connection, &self.tooling, &self.layout)
    }

    /// Closes the pool. Dropping the service also releases connections;
    /// this just makes shutdown explicit.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
