//! Text staging round-trip for ad-hoc query exports.
//!
//! Ad-hoc results can carry any mix of types; writing them through a
//! same-session temporary table with all-text columns normalises every
//! value to its text rendering before the file writers see it. The whole
//! round-trip is one transaction on one connection (temporary tables are
//! session-scoped): commit after the staging table is dropped again, and
//! any failure rolls the unit back, which also removes the staging table
//! before the connection returns to the pool.

use pg_curator_api::prelude::{CuratorResult, QueryError, ResultSet};
use sqlx::PgPool;

use crate::sql;
use crate::storage;

pub(crate) async fn normalize_through_staging(
    pool: &PgPool,
    set: &ResultSet,
) -> CuratorResult<ResultSet> {
    if set.is_empty() {
        return Ok(set.clone());
    }

    let staging = format!("temp_export_{}", storage::time_suffix());
    let mut tx = pool.begin().await.map_err(QueryError::from_sqlx)?;

    sqlx::query(&sql::create_staging_table(&staging, &set.columns))
        .execute(&mut *tx)
        .await
        .map_err(QueryError::from_sqlx)?;

    let insert = sql::insert_staging_row(&staging, &set.columns);
    for row in &set.rows {
        let mut query = sqlx::query(&insert);
        for value in row {
            query = if value.is_null() {
                query.bind(Option::<String>::None)
            } else {
                query.bind(value.display_string())
            };
        }
        query
            .execute(&mut *tx)
            .await
            .map_err(QueryError::from_sqlx)?;
    }

    let rows = sqlx::query(&sql::select_rows(&staging, None, false))
        .fetch_all(&mut *tx)
        .await
        .map_err(QueryError::from_sqlx)?;
    let normalized = ResultSet::from_pg_rows(&rows)?;

    sqlx::query(&sql::drop_table(&staging))
        .execute(&mut *tx)
        .await
        .map_err(QueryError::from_sqlx)?;
    tx.commit().await.map_err(QueryError::from_sqlx)?;

    Ok(normalized)
}
