//! Schema-aware cascading mutations.
//!
//! The foreign-key graph is rediscovered on every call, so mutations always
//! observe the current schema. Each write runs inside a single transaction:
//! commit on success, whole-call rollback on any failure.

use std::collections::BTreeMap;

use pg_curator_api::prelude::{
    CuratorError, CuratorResult, Dependency, Predicate, QueryError, SafeDeleteOutcome, SqlValue,
};
use sqlx::PgPool;

use crate::executor::PredicateExecutor;
use crate::introspect::SchemaIntrospector;
use crate::sql;

/// Update/delete engine driven by the discovered foreign-key graph.
#[derive(Clone, Copy)]
pub struct CascadeMutationEngine<'a> {
    pool: &'a PgPool,
}

/// Keeps only entries whose value is non-empty: an empty form value means
/// "leave this column alone", not "set it to the empty string".
fn non_empty_changes(values: &BTreeMap<String, String>) -> BTreeMap<&str, &str> {
    values
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect()
}

impl<'a> CascadeMutationEngine<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    fn introspector(&self) -> SchemaIntrospector<'a> {
        SchemaIntrospector::new(self.pool)
    }

    fn executor(&self) -> PredicateExecutor<'a> {
        PredicateExecutor::new(self.pool)
    }

    /// Looks up the declared type of a column within a snapshot, rejecting
    /// names the catalog does not know.
    fn declared_type<'c>(
        columns: &'c [pg_curator_api::prelude::ColumnDescriptor],
        table: &str,
        name: &str,
    ) -> CuratorResult<&'c str> {
        columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.data_type.as_str())
            .ok_or_else(|| {
                CuratorError::Validation(format!("unknown column {name} in table {table}"))
            })
    }

    /// Inserts one row and returns the generated `id`.
    ///
    /// String inputs are cast to each column's declared type from the
    /// catalog snapshot. No cascading behavior.
    pub async fn insert(
        &self,
        table: &str,
        values: &BTreeMap<String, String>,
    ) -> CuratorResult<SqlValue> {
        if values.is_empty() {
            return Err(CuratorError::Validation("no values to insert".to_string()));
        }
        self.introspector().require_table(table).await?;
        let columns = self.introspector().columns(table).await?;

        let mut insert_columns = Vec::with_capacity(values.len());
        for name in values.keys() {
            let data_type = Self::declared_type(&columns, table, name)?;
            insert_columns.push((name.as_str(), data_type));
        }

        let statement = sql::insert_returning_id(table, &insert_columns);
        let mut query = sqlx::query(&statement);
        for value in values.values() {
            query = query.bind(value.as_str());
        }
        let row = query
            .fetch_one(self.pool)
            .await
            .map_err(QueryError::from_sqlx)?;

        tracing::debug!(table, "inserted row");
        Ok(SqlValue::decode(&row, 0)?)
    }

    /// Update with foreign-key propagation.
    ///
    /// For every row matching the predicate: any changing foreign-key
    /// column first rewrites the *parent* table's referenced column from
    /// the old key value to the new one, then the row itself is updated,
    /// targeted by its full pre-image so exactly that physical row is hit
    /// even without a unique key.
    ///
    /// Note the propagation direction: the child's new key value is pushed
    /// onto the parent, not the conventional parent-to-children direction.
    /// This is the documented contract of the system and is preserved
    /// as-is.
    ///
    /// Returns `false` (without error) when no row matches; `true` when at
    /// least one row's own UPDATE affected a row.
    pub async fn update(
        &self,
        table: &str,
        new_values: &BTreeMap<String, String>,
        predicate: &Predicate,
    ) -> CuratorResult<bool> {
        let changes = non_empty_changes(new_values);
        if changes.is_empty() {
            return Err(CuratorError::Validation("no values to update".to_string()));
        }
        self.introspector().require_table(table).await?;
        let columns = self.introspector().columns(table).await?;

        let mut set_columns = Vec::with_capacity(changes.len());
        for name in changes.keys() {
            set_columns.push((*name, Self::declared_type(&columns, table, name)?));
        }

        let pre_images = self
            .executor()
            .fetch(table, Some(predicate), None, 0)
            .await?;
        if pre_images.is_empty() {
            return Ok(false);
        }

        let edges = self.introspector().foreign_keys(table).await?;

        let mut tx = self.pool.begin().await.map_err(QueryError::from_sqlx)?;
        let mut applied = false;

        for row in 0..pre_images.len() {
            for edge in &edges {
                let Some(new_value) = changes.get(edge.child_column.as_str()) else {
                    continue;
                };
                let Some(old_value) = pre_images.value(row, &edge.child_column) else {
                    continue;
                };
                // a NULL old key matches no parent row; nothing to rewrite
                if old_value.is_null() || old_value.display_string() == *new_value {
                    continue;
                }

                let data_type = Self::declared_type(&columns, table, &edge.child_column)?;
                let statement =
                    sql::parent_rekey(&edge.parent_table, &edge.parent_column, data_type);
                tracing::debug!(
                    parent = %edge.parent_table,
                    column = %edge.parent_column,
                    "rewriting referenced key",
                );
                let query = sqlx::query(&statement).bind(*new_value);
                old_value
                    .clone()
                    .bind_to(query)
                    .execute(&mut *tx)
                    .await
                    .map_err(QueryError::from_sqlx)?;
            }

            let preimage_columns: Vec<(&str, bool)> = pre_images
                .row_entries(row)
                .map(|(name, value)| (name, value.is_null()))
                .collect();
            let statement = sql::row_update(table, &set_columns, &preimage_columns);

            let mut query = sqlx::query(&statement);
            for value in changes.values() {
                query = query.bind(*value);
            }
            for (_, value) in pre_images.row_entries(row) {
                if !value.is_null() {
                    query = value.clone().bind_to(query);
                }
            }
            let result = query
                .execute(&mut *tx)
                .await
                .map_err(QueryError::from_sqlx)?;
            applied |= result.rows_affected() > 0;
        }

        tx.commit().await.map_err(QueryError::from_sqlx)?;
        Ok(applied)
    }

    /// Deletes matching rows and, first, every row in referencing tables
    /// whose foreign-key column points at them (one level deep, via the
    /// conventional `id` primary key).
    ///
    /// Returns `true` iff the final delete on `table` affected rows;
    /// referencing deletes may affect zero rows without being an error.
    pub async fn delete_cascade(&self, table: &str, predicate: &Predicate) -> CuratorResult<bool> {
        self.introspector().require_table(table).await?;
        let edges = self.introspector().referencing_edges(table, None).await?;

        let mut tx = self.pool.begin().await.map_err(QueryError::from_sqlx)?;
        for edge in &edges {
            let statement = sql::delete_dependents(
                &edge.child_table,
                &edge.child_column,
                table,
                predicate.as_sql(),
            );
            let result = sqlx::query(&statement)
                .execute(&mut *tx)
                .await
                .map_err(QueryError::from_sqlx)?;
            tracing::debug!(
                child = %edge.child_table,
                removed = result.rows_affected(),
                "cascaded delete into referencing table",
            );
        }

        let affected = sqlx::query(&sql::delete_rows(table, predicate.as_sql()))
            .execute(&mut *tx)
            .await
            .map_err(QueryError::from_sqlx)?
            .rows_affected();
        tx.commit().await.map_err(QueryError::from_sqlx)?;

        tracing::info!(table, affected, "cascading delete committed");
        Ok(affected > 0)
    }

    /// Dependency-checked delete: refuses to mutate anything while rows in
    /// referencing tables still point at the targeted rows, returning the
    /// full list of blocking tables with counts instead.
    pub async fn delete_safe(
        &self,
        table: &str,
        predicate: &Predicate,
    ) -> CuratorResult<SafeDeleteOutcome> {
        self.introspector().require_table(table).await?;
        let edges = self.introspector().referencing_edges(table, None).await?;

        let mut dependencies = Vec::new();
        for edge in &edges {
            let statement = sql::count_dependents(
                &edge.child_table,
                &edge.child_column,
                table,
                predicate.as_sql(),
            );
            let count = sqlx::query_scalar::<_, i64>(&statement)
                .fetch_one(self.pool)
                .await
                .map_err(QueryError::from_sqlx)?;
            if count > 0 {
                dependencies.push(Dependency {
                    table: edge.child_table.clone(),
                    count,
                });
            }
        }

        if !dependencies.is_empty() {
            return Ok(SafeDeleteOutcome::Blocked { dependencies });
        }

        let affected = sqlx::query(&sql::delete_rows(table, predicate.as_sql()))
            .execute(self.pool)
            .await
            .map_err(QueryError::from_sqlx)?
            .rows_affected();
        Ok(SafeDeleteOutcome::Deleted { affected })
    }

    /// DDL drop with store-level cascade so dependent constraints never
    /// block it. Dropping a table that does not exist is a success.
    pub async fn drop_table(&self, table: &str) -> CuratorResult<()> {
        sqlx::query(&sql::drop_table(table))
            .execute(self.pool)
            .await
            .map_err(QueryError::from_sqlx)?;
        tracing::info!(table, "dropped table");
        Ok(())
    }

    /// Drops every public-schema table. Aborts (and rolls back) on the
    /// first failure; returns how many tables were dropped.
    pub async fn reset_all_tables(&self) -> CuratorResult<usize> {
        let tables = self.introspector().list_tables().await?;
        if tables.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(QueryError::from_sqlx)?;
        sqlx::query("SET CONSTRAINTS ALL DEFERRED")
            .execute(&mut *tx)
            .await
            .map_err(QueryError::from_sqlx)?;
        for table in &tables {
            sqlx::query(&sql::drop_table(table))
                .execute(&mut *tx)
                .await
                .map_err(QueryError::from_sqlx)?;
            tracing::info!(table, "dropped table");
        }
        tx.commit().await.map_err(QueryError::from_sqlx)?;

        Ok(tables.len())
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_should_keep_only_non_empty_changes() {
        let mut values = BTreeMap::new();
        values.insert("customer_id".to_string(), "7".to_string());
        values.insert("note".to_string(), String::new());

        let changes = non_empty_changes(&values);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.get("customer_id"), Some(&"7"));
        assert!(!changes.contains_key("note"));
    }
}
