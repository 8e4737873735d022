use sqlx::postgres::PgRow;
use sqlx::{Column as _, Row as _};

use crate::error::QueryError;
use crate::value::SqlValue;

/// A full pre-mutation row snapshot, in column order.
///
/// Used as the exact match key for per-row updates when no unique key is
/// guaranteed to exist.
pub type RowImage = Vec<SqlValue>;

/// A column-ordered materialised result set.
///
/// This is the unit the export pipeline consumes, and what the mutation
/// engine fetches pre-images as.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSet {
    /// Column names in physical order.
    pub columns: Vec<String>,
    /// One [`RowImage`] per fetched row.
    pub rows: Vec<RowImage>,
}

impl ResultSet {
    /// Decodes a set of driver rows into owned values.
    ///
    /// Column names are taken from the first row; an empty input produces an
    /// empty set with no columns.
    pub fn from_pg_rows(pg_rows: &[PgRow]) -> Result<Self, QueryError> {
        let Some(first) = pg_rows.first() else {
            return Ok(Self::default());
        };

        let columns: Vec<String> = first
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut rows = Vec::with_capacity(pg_rows.len());
        for pg_row in pg_rows {
            let mut row = Vec::with_capacity(columns.len());
            for index in 0..columns.len() {
                row.push(SqlValue::decode(pg_row, index)?);
            }
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the set holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Looks a cell up by column name within one row.
    pub fn value(&self, row: usize, column: &str) -> Option<&SqlValue> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(index)
    }

    /// Iterates one row as `(column, value)` pairs in column order.
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.rows[row].iter())
    }

    /// Renders the whole set as a JSON array of objects, preserving column
    /// order.
    pub fn to_json_rows(&self) -> serde_json::Value {
        let rows: Vec<serde_json::Value> = self
            .rows
            .iter()
            .map(|row| {
                let mut object = serde_json::Map::with_capacity(self.columns.len());
                for (column, value) in self.columns.iter().zip(row.iter()) {
                    object.insert(column.clone(), value.to_json());
                }
                serde_json::Value::Object(object)
            })
            .collect();
        serde_json::Value::Array(rows)
    }
}
