//! Dynamic statement builders.
//!
//! Identifiers are always double-quoted and only ever come from names the
//! catalog confirmed to exist; values are always bound, never interpolated.
//! The one exception is the caller-supplied [`Predicate`](pg_curator_api::prelude::Predicate)
//! text, which is spliced verbatim after `WHERE` by contract.
//!
//! Caller-supplied values arrive as strings, so placeholders carry an
//! explicit `CAST` to the column's declared type from the catalog snapshot.

/// Double-quotes an identifier, escaping embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Types reported by the catalog that cannot be spelled in a `CAST`
/// expression. Their placeholders are left bare.
fn castable(data_type: &str) -> bool {
    !matches!(data_type, "ARRAY" | "USER-DEFINED" | "")
}

/// `CAST($n AS <type>)`, or a bare placeholder when the declared type
/// cannot be spelled.
fn cast_placeholder(index: usize, data_type: &str) -> String {
    if castable(data_type) {
        format!("CAST(${index} AS {data_type})")
    } else {
        format!("${index}")
    }
}

/// `SELECT *` over a table with an optional verbatim predicate; when
/// `paged` the statement takes `LIMIT $1 OFFSET $2`.
pub fn select_rows(table: &str, predicate: Option<&str>, paged: bool) -> String {
    let mut sql = format!("SELECT * FROM {}", quote_ident(table));
    if let Some(predicate) = predicate {
        sql.push_str(" WHERE ");
        sql.push_str(predicate);
    }
    if paged {
        sql.push_str(" LIMIT $1 OFFSET $2");
    }
    sql
}

/// `SELECT COUNT(*)` over a table.
pub fn count_rows(table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", quote_ident(table))
}

/// Parameterized INSERT returning the conventional `id` primary key.
pub fn insert_returning_id(table: &str, columns: &[(&str, &str)]) -> String {
    let names: Vec<String> = columns.iter().map(|(name, _)| quote_ident(name)).collect();
    let placeholders: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, (_, data_type))| cast_placeholder(i + 1, data_type))
        .collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING id",
        quote_ident(table),
        names.join(", "),
        placeholders.join(", "),
    )
}

/// Rewrites a parent table's referenced column from an old key value to a
/// new one: `UPDATE "parent" SET "col" = CAST($1 AS t) WHERE "col" = $2`.
pub fn parent_rekey(parent_table: &str, parent_column: &str, data_type: &str) -> String {
    let column = quote_ident(parent_column);
    format!(
        "UPDATE {} SET {} = {} WHERE {} = $2",
        quote_ident(parent_table),
        column,
        cast_placeholder(1, data_type),
        column,
    )
}

/// Per-row UPDATE targeting one physical row by its full pre-image.
///
/// `set_columns` are `(name, declared type)` pairs bound first;
/// `preimage_columns` are `(name, is_null)` pairs forming the WHERE clause.
/// NULL pre-image cells compare with `IS NULL` (no bind), everything else
/// with `=` and a typed bind, so exactly the snapshotted row is matched
/// even when the table has no unique key.
pub fn row_update(
    table: &str,
    set_columns: &[(&str, &str)],
    preimage_columns: &[(&str, bool)],
) -> String {
    let mut placeholder = 0usize;
    let set_clause: Vec<String> = set_columns
        .iter()
        .map(|(name, data_type)| {
            placeholder += 1;
            format!("{} = {}", quote_ident(name), cast_placeholder(placeholder, data_type))
        })
        .collect();

    let where_clause: Vec<String> = preimage_columns
        .iter()
        .map(|(name, is_null)| {
            if *is_null {
                format!("{} IS NULL", quote_ident(name))
            } else {
                placeholder += 1;
                format!("{} = ${placeholder}", quote_ident(name))
            }
        })
        .collect();

    format!(
        "UPDATE {} SET {} WHERE {}",
        quote_ident(table),
        set_clause.join(", "),
        where_clause.join(" AND "),
    )
}

/// Deletes rows in a referencing table whose foreign-key column matches the
/// `id` of any row selected by the predicate in the parent table.
///
/// A conventional `id` primary key is assumed on the parent side.
pub fn delete_dependents(
    child_table: &str,
    child_column: &str,
    parent_table: &str,
    predicate: &str,
) -> String {
    format!(
        "DELETE FROM {} WHERE {} IN (SELECT id FROM {} WHERE {})",
        quote_ident(child_table),
        quote_ident(child_column),
        quote_ident(parent_table),
        predicate,
    )
}

/// Counts rows in a referencing table that depend on the predicate-selected
/// parent rows. Same sub-select shape as [`delete_dependents`].
pub fn count_dependents(
    child_table: &str,
    child_column: &str,
    parent_table: &str,
    predicate: &str,
) -> String {
    format!(
        "SELECT COUNT(*) FROM {} WHERE {} IN (SELECT id FROM {} WHERE {})",
        quote_ident(child_table),
        quote_ident(child_column),
        quote_ident(parent_table),
        predicate,
    )
}

/// Deletes rows matching a verbatim predicate.
pub fn delete_rows(table: &str, predicate: &str) -> String {
    format!("DELETE FROM {} WHERE {}", quote_ident(table), predicate)
}

/// Idempotent DDL drop with store-level cascade.
pub fn drop_table(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {} CASCADE", quote_ident(table))
}

/// Same-session disposable staging table, all columns typed as text.
pub fn create_staging_table(name: &str, columns: &[String]) -> String {
    let defs: Vec<String> = columns
        .iter()
        .map(|column| format!("{} TEXT", quote_ident(column)))
        .collect();
    format!(
        "CREATE TEMPORARY TABLE {} ({})",
        quote_ident(name),
        defs.join(", "),
    )
}

/// Parameterized insert into the staging table.
pub fn insert_staging_row(name: &str, columns: &[String]) -> String {
    let names: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${i}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(name),
        names.join(", "),
        placeholders.join(", "),
    )
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_should_quote_and_escape_identifiers() {
        assert_eq!(quote_ident("orders"), "\"orders\"");
        assert_eq!(quote_ident("weird\"name"), "\"weird\"\"name\"");
    }

    #[test]
    fn test_should_build_plain_and_paged_selects() {
        assert_eq!(select_rows("orders", None, false), "SELECT * FROM \"orders\"");
        assert_eq!(
            select_rows("orders", Some("id = 3"), true),
            "SELECT * FROM \"orders\" WHERE id = 3 LIMIT $1 OFFSET $2",
        );
    }

    #[test]
    fn test_should_build_insert_with_typed_casts() {
        let sql = insert_returning_id(
            "orders",
            &[("customer_id", "integer"), ("note", "character varying")],
        );
        assert_eq!(
            sql,
            "INSERT INTO \"orders\" (\"customer_id\", \"note\") \
             VALUES (CAST($1 AS integer), CAST($2 AS character varying)) RETURNING id",
        );
    }

    #[test]
    fn test_should_leave_uncastable_types_as_bare_placeholders() {
        let sql = insert_returning_id("t", &[("tags", "ARRAY")]);
        assert_eq!(sql, "INSERT INTO \"t\" (\"tags\") VALUES ($1) RETURNING id");
    }

    #[test]
    fn test_should_build_parent_rekey_statement() {
        let sql = parent_rekey("customers", "id", "integer");
        assert_eq!(
            sql,
            "UPDATE \"customers\" SET \"id\" = CAST($1 AS integer) WHERE \"id\" = $2",
        );
    }

    #[test]
    fn test_should_build_row_update_with_preimage_where() {
        let sql = row_update(
            "orders",
            &[("customer_id", "integer")],
            &[("id", false), ("customer_id", false), ("note", true)],
        );
        assert_eq!(
            sql,
            "UPDATE \"orders\" SET \"customer_id\" = CAST($1 AS integer) \
             WHERE \"id\" = $2 AND \"customer_id\" = $3 AND \"note\" IS NULL",
        );
    }

    #[test]
    fn test_should_build_dependent_delete_with_id_subselect() {
        let sql = delete_dependents("orders", "customer_id", "customers", "id = 5");
        assert_eq!(
            sql,
            "DELETE FROM \"orders\" WHERE \"customer_id\" IN \
             (SELECT id FROM \"customers\" WHERE id = 5)",
        );
    }

    #[test]
    fn test_should_build_dependent_count_with_id_subselect() {
        let sql = count_dependents("orders", "customer_id", "customers", "id = 5");
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM \"orders\" WHERE \"customer_id\" IN \
             (SELECT id FROM \"customers\" WHERE id = 5)",
        );
    }

    #[test]
    fn test_should_build_cascading_drop() {
        assert_eq!(drop_table("old_logs"), "DROP TABLE IF EXISTS \"old_logs\" CASCADE");
    }

    #[test]
    fn test_should_build_text_typed_staging_table() {
        let sql = create_staging_table(
            "temp_export_103045",
            &["a".to_string(), "b".to_string()],
        );
        assert_eq!(
            sql,
            "CREATE TEMPORARY TABLE \"temp_export_103045\" (\"a\" TEXT, \"b\" TEXT)",
        );
    }

    #[test]
    fn test_should_build_staging_insert() {
        let sql = insert_staging_row("temp_export_103045", &["a".to_string(), "b".to_string()]);
        assert_eq!(
            sql,
            "INSERT INTO \"temp_export_103045\" (\"a\", \"b\") VALUES ($1, $2)",
        );
    }
}
