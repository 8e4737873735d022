//! Runtime catalog discovery.
//!
//! Every call re-queries the standard `information_schema`/`pg_catalog`
//! views: the schema can change between calls, so nothing is cached and
//! every cascading operation pays its own discovery round-trip. Each call
//! returns an owned snapshot, so concurrent callers never share mutable
//! state.

use pg_curator_api::prelude::{ColumnDescriptor, ForeignKeyEdge, QueryError, SchemaError};
use sqlx::PgPool;
use sqlx::Row as _;

const LIST_TABLES: &str = "
    SELECT table_name
    FROM information_schema.tables
    WHERE table_schema = 'public'
      AND table_type = 'BASE TABLE'
    ORDER BY table_name
";

const TABLE_EXISTS: &str = "
    SELECT EXISTS (
        SELECT FROM information_schema.tables
        WHERE table_schema = 'public'
          AND table_name = $1
    )
";

const TABLE_COLUMNS: &str = "
    SELECT column_name, data_type, is_nullable, column_default
    FROM information_schema.columns
    WHERE table_schema = 'public'
      AND table_name = $1
    ORDER BY ordinal_position
";

const FOREIGN_KEYS: &str = "
    SELECT
        kcu.column_name AS child_column,
        ccu.table_name AS parent_table,
        ccu.column_name AS parent_column
    FROM information_schema.table_constraints AS tc
    JOIN information_schema.key_column_usage AS kcu
        ON tc.constraint_name = kcu.constraint_name
        AND tc.table_schema = kcu.table_schema
    JOIN information_schema.constraint_column_usage AS ccu
        ON ccu.constraint_name = tc.constraint_name
        AND ccu.table_schema = tc.table_schema
    WHERE tc.constraint_type = 'FOREIGN KEY'
      AND tc.table_schema = 'public'
      AND tc.table_name = $1
";

const REFERENCING_EDGES: &str = "
    SELECT
        tc.table_name AS child_table,
        kcu.column_name AS child_column,
        ccu.table_name AS parent_table,
        ccu.column_name AS parent_column
    FROM information_schema.table_constraints AS tc
    JOIN information_schema.key_column_usage AS kcu
        ON tc.constraint_name = kcu.constraint_name
        AND tc.table_schema = kcu.table_schema
    JOIN information_schema.constraint_column_usage AS ccu
        ON ccu.constraint_name = tc.constraint_name
        AND ccu.table_schema = tc.table_schema
    WHERE tc.constraint_type = 'FOREIGN KEY'
      AND tc.table_schema = 'public'
      AND ccu.table_name = $1
      AND ($2::text IS NULL OR ccu.column_name = $2)
";

/// Read-only catalog introspection over one connection pool.
#[derive(Clone, Copy)]
pub struct SchemaIntrospector<'a> {
    pool: &'a PgPool,
}

impl<'a> SchemaIntrospector<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All public-schema tables, alphabetical.
    pub async fn list_tables(&self) -> Result<Vec<String>, SchemaError> {
        let tables = sqlx::query_scalar::<_, String>(LIST_TABLES)
            .fetch_all(self.pool)
            .await
            .map_err(QueryError::from_sqlx)?;
        Ok(tables)
    }

    /// Whether the named table exists in the public schema.
    pub async fn table_exists(&self, table: &str) -> Result<bool, SchemaError> {
        let exists = sqlx::query_scalar::<_, bool>(TABLE_EXISTS)
            .bind(table)
            .fetch_one(self.pool)
            .await
            .map_err(QueryError::from_sqlx)?;
        Ok(exists)
    }

    /// Fails with [`SchemaError::TableNotFound`] when the table is absent.
    pub async fn require_table(&self, table: &str) -> Result<(), SchemaError> {
        if self.table_exists(table).await? {
            Ok(())
        } else {
            Err(SchemaError::TableNotFound(table.to_string()))
        }
    }

    /// Column definitions in physical column position order.
    pub async fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, SchemaError> {
        let rows = sqlx::query(TABLE_COLUMNS)
            .bind(table)
            .fetch_all(self.pool)
            .await
            .map_err(QueryError::from_sqlx)?;

        let columns = rows
            .iter()
            .map(|row| ColumnDescriptor {
                name: row.get("column_name"),
                data_type: row.get("data_type"),
                nullable: row.get::<String, _>("is_nullable") == "YES",
                default: row.get("column_default"),
            })
            .collect();
        Ok(columns)
    }

    /// Foreign-key edges where `table` is the child.
    pub async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyEdge>, SchemaError> {
        let rows = sqlx::query(FOREIGN_KEYS)
            .bind(table)
            .fetch_all(self.pool)
            .await
            .map_err(QueryError::from_sqlx)?;

        let edges = rows
            .iter()
            .map(|row| ForeignKeyEdge {
                child_table: table.to_string(),
                child_column: row.get("child_column"),
                parent_table: row.get("parent_table"),
                parent_column: row.get("parent_column"),
            })
            .collect();
        Ok(edges)
    }

    /// Foreign-key edges where `table` is the parent, i.e. the reverse
    /// lookup used by delete and safe delete. Optionally filtered to edges
    /// pointing at a single parent column.
    pub async fn referencing_edges(
        &self,
        table: &str,
        column: Option<&str>,
    ) -> Result<Vec<ForeignKeyEdge>, SchemaError> {
        let rows = sqlx::query(REFERENCING_EDGES)
            .bind(table)
            .bind(column)
            .fetch_all(self.pool)
            .await
            .map_err(QueryError::from_sqlx)?;

        let edges = rows
            .iter()
            .map(|row| ForeignKeyEdge {
                child_table: row.get("child_table"),
                child_column: row.get("child_column"),
                parent_table: row.get("parent_table"),
                parent_column: row.get("parent_column"),
            })
            .collect();
        Ok(edges)
    }

    /// Row count of one table.
    pub async fn count(&self, table: &str) -> Result<i64, SchemaError> {
        self.require_table(table).await?;
        let count = sqlx::query_scalar::<_, i64>(&crate::sql::count_rows(table))
            .fetch_one(self.pool)
            .await
            .map_err(QueryError::from_sqlx)?;
        Ok(count)
    }

    /// Total record count across every discovered table.
    pub async fn total_records(&self) -> Result<i64, SchemaError> {
        let mut total = 0i64;
        for table in self.list_tables().await? {
            total += self.count(&table).await?;
        }
        Ok(total)
    }
}
