//! Row fetching and the generic statement escape hatch.
//!
//! This is the sole point of contact with the store for result sets: the
//! mutation engine, export pipeline and archive orchestrator all fetch
//! through here. Values are always bound; identifiers are interpolated only
//! from names the introspector confirmed to exist.

use pg_curator_api::prelude::{CuratorResult, Predicate, QueryError, ResultSet, SqlValue};
use sqlx::PgPool;

use crate::sql;

/// Executes parameterized statements against named tables.
#[derive(Clone, Copy)]
pub struct PredicateExecutor<'a> {
    pool: &'a PgPool,
}

impl<'a> PredicateExecutor<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetches rows from a table, optionally filtered by a verbatim
    /// predicate and bounded by `LIMIT`/`OFFSET`.
    pub async fn fetch(
        &self,
        table: &str,
        predicate: Option<&Predicate>,
        limit: Option<i64>,
        offset: i64,
    ) -> CuratorResult<ResultSet> {
        let statement = sql::select_rows(table, predicate.map(Predicate::as_sql), limit.is_some());
        let query = sqlx::query(&statement);
        let rows = if let Some(limit) = limit {
            query.bind(limit).bind(offset)
        } else {
            query
        }
        .fetch_all(self.pool)
        .await
        .map_err(QueryError::from_sqlx)?;

        Ok(ResultSet::from_pg_rows(&rows)?)
    }

    /// Runs an ad-hoc statement and materialises whatever comes back.
    ///
    /// Statements that return no rows produce an empty set.
    pub async fn run_query(&self, statement: &str) -> CuratorResult<ResultSet> {
        let rows = sqlx::query(statement)
            .fetch_all(self.pool)
            .await
            .map_err(QueryError::from_sqlx)?;
        Ok(ResultSet::from_pg_rows(&rows)?)
    }

    /// Executes a parameterized write statement and returns the affected
    /// row count. The statement commits on success and the whole unit of
    /// work rolls back on any failure within it.
    pub async fn execute(&self, statement: &str, params: Vec<SqlValue>) -> CuratorResult<u64> {
        let mut query = sqlx::query(statement);
        for param in params {
            query = param.bind_to(query);
        }
        let result = query
            .execute(self.pool)
            .await
            .map_err(QueryError::from_sqlx)?;
        Ok(result.rows_affected())
    }
}
