use serde::{Deserialize, Serialize};

/// Defines a column in a database table.
///
/// An immutable snapshot of the catalog state at query time; the engine
/// never caches these across calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// The name of the column.
    pub name: String,
    /// The declared SQL type of the column, as reported by the catalog
    /// (e.g. `integer`, `character varying`, `timestamp without time zone`).
    pub data_type: String,
    /// Indicates if this column can contain NULL values.
    pub nullable: bool,
    /// Default expression of the column, if any.
    pub default: Option<String>,
}

/// A directed foreign-key relationship discovered at runtime.
///
/// The child table holds a value that must match some row's
/// `parent_column` in `parent_table`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyEdge {
    /// Table holding the foreign key column (e.g. `orders`).
    pub child_table: String,
    /// Column holding the foreign key value (e.g. `customer_id`).
    pub child_column: String,
    /// Table the key points into (e.g. `customers`).
    pub parent_table: String,
    /// Referenced column in the parent table (e.g. `id`).
    pub parent_column: String,
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_should_create_foreign_key_edge() {
        let edge = ForeignKeyEdge {
            child_table: "orders".to_string(),
            child_column: "customer_id".to_string(),
            parent_table: "customers".to_string(),
            parent_column: "id".to_string(),
        };

        assert_eq!(edge.child_table, "orders");
        assert_eq!(edge.parent_table, "customers");
    }

    #[test]
    fn test_should_compare_column_descriptors() {
        let a = ColumnDescriptor {
            name: "id".to_string(),
            data_type: "integer".to_string(),
            nullable: false,
            default: Some("nextval('orders_id_seq'::regclass)".to_string()),
        };
        let b = a.clone();
        assert_eq!(a, b);
    }
}
