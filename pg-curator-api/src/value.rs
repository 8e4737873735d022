use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column as _, Postgres, Row as _, TypeInfo as _};

use crate::error::QueryError;

/// A dynamically typed SQL cell value.
///
/// The engine works against schemas it has never seen, so every row comes
/// back as a vector of these. A value can be decoded from a driver row,
/// bound back into a parameterized statement, rendered for JSON export or
/// rendered as its generic string form.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    /// `timestamp without time zone`.
    Timestamp(NaiveDateTime),
    /// `timestamp with time zone`, normalised to UTC.
    TimestampTz(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
    Uuid(uuid::Uuid),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
}

macro_rules! decode_as {
    ($row:expr, $index:expr, $ty:ty, $into:expr) => {
        $row.try_get::<Option<$ty>, _>($index)
            .map_err(QueryError::Execution)?
            .map($into)
            .unwrap_or(SqlValue::Null)
    };
}

impl SqlValue {
    /// Decodes the cell at `index` from a driver row, dispatching on the
    /// column's declared type.
    ///
    /// Unknown types fall back to their textual representation; a value the
    /// driver cannot render at all decodes as [`SqlValue::Null`].
    pub fn decode(row: &PgRow, index: usize) -> Result<SqlValue, QueryError> {
        let type_name = row.column(index).type_info().name().to_string();
        let value = match type_name.as_str() {
            "BOOL" => decode_as!(row, index, bool, SqlValue::Bool),
            "INT2" => decode_as!(row, index, i16, |v| SqlValue::Int(i64::from(v))),
            "INT4" => decode_as!(row, index, i32, |v| SqlValue::Int(i64::from(v))),
            "INT8" => decode_as!(row, index, i64, SqlValue::Int),
            "FLOAT4" => decode_as!(row, index, f32, |v| SqlValue::Float(f64::from(v))),
            "FLOAT8" => decode_as!(row, index, f64, SqlValue::Float),
            "NUMERIC" => decode_as!(row, index, Decimal, SqlValue::Decimal),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" => {
                decode_as!(row, index, String, SqlValue::Text)
            }
            "TIMESTAMP" => decode_as!(row, index, NaiveDateTime, SqlValue::Timestamp),
            "TIMESTAMPTZ" => {
                decode_as!(row, index, DateTime<Utc>, SqlValue::TimestampTz)
            }
            "DATE" => decode_as!(row, index, NaiveDate, SqlValue::Date),
            "TIME" => decode_as!(row, index, NaiveTime, SqlValue::Time),
            "UUID" => decode_as!(row, index, uuid::Uuid, SqlValue::Uuid),
            "JSON" | "JSONB" => decode_as!(row, index, serde_json::Value, SqlValue::Json),
            "BYTEA" => decode_as!(row, index, Vec<u8>, SqlValue::Bytes),
            _ => row
                .try_get_unchecked::<Option<String>, _>(index)
                .map(|v| v.map(SqlValue::Text).unwrap_or(SqlValue::Null))
                .unwrap_or(SqlValue::Null),
        };

        Ok(value)
    }

    /// Binds this value as the next parameter of a dynamic statement.
    pub fn bind_to<'q>(
        self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        match self {
            SqlValue::Null => query.bind(Option::<String>::None),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Int(v) => query.bind(v),
            SqlValue::Float(v) => query.bind(v),
            SqlValue::Decimal(v) => query.bind(v),
            SqlValue::Text(v) => query.bind(v),
            SqlValue::Timestamp(v) => query.bind(v),
            SqlValue::TimestampTz(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::Time(v) => query.bind(v),
            SqlValue::Uuid(v) => query.bind(v),
            SqlValue::Json(v) => query.bind(v),
            SqlValue::Bytes(v) => query.bind(v),
        }
    }

    /// Renders the value for JSON export.
    ///
    /// Timestamps become ISO-8601 strings; decimals keep their exact
    /// textual form; any other non-primitive value is rendered via its
    /// generic string form.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            SqlValue::Null => serde_json::Value::Null,
            SqlValue::Bool(v) => serde_json::Value::Bool(*v),
            SqlValue::Int(v) => serde_json::Value::from(*v),
            SqlValue::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(v.to_string())),
            SqlValue::Decimal(v) => serde_json::Value::String(v.to_string()),
            SqlValue::Text(v) => serde_json::Value::String(v.clone()),
            SqlValue::Timestamp(v) => {
                serde_json::Value::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            SqlValue::TimestampTz(v) => serde_json::Value::String(v.to_rfc3339()),
            SqlValue::Date(v) => serde_json::Value::String(v.format("%Y-%m-%d").to_string()),
            SqlValue::Time(v) => serde_json::Value::String(v.format("%H:%M:%S%.f").to_string()),
            SqlValue::Uuid(v) => serde_json::Value::String(v.to_string()),
            SqlValue::Json(v) => v.clone(),
            SqlValue::Bytes(v) => serde_json::Value::String(hex_form(v)),
        }
    }

    /// Generic string form, used for spreadsheet cells and the text-typed
    /// staging table. NULL renders as the empty string.
    pub fn display_string(&self) -> String {
        match self {
            SqlValue::Null => String::new(),
            SqlValue::Bool(v) => v.to_string(),
            SqlValue::Int(v) => v.to_string(),
            SqlValue::Float(v) => v.to_string(),
            SqlValue::Decimal(v) => v.to_string(),
            SqlValue::Text(v) => v.clone(),
            SqlValue::Timestamp(v) => v.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            SqlValue::TimestampTz(v) => v.to_rfc3339(),
            SqlValue::Date(v) => v.format("%Y-%m-%d").to_string(),
            SqlValue::Time(v) => v.format("%H:%M:%S%.f").to_string(),
            SqlValue::Uuid(v) => v.to_string(),
            SqlValue::Json(v) => v.to_string(),
            SqlValue::Bytes(v) => hex_form(v),
        }
    }

    /// Whether this value is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

/// PostgreSQL's text form for bytea (`\x` followed by lowercase hex).
fn hex_form(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
