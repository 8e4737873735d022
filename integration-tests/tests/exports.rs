use integration_tests::TestDb;
use pg_curator_api::prelude::{ExportFormat, SqlValue};

#[tokio::test]
#[ignore = "requires a live PostgreSQL server"]
async fn test_should_export_table_as_spreadsheet_and_json() {
    let db = TestDb::connect().await.expect("failed to connect");
    db.seed_linked_tables().await.expect("failed to seed");

    let xlsx = db
        .curator
        .export()
        .export_table("orders", ExportFormat::Excel)
        .await
        .expect("failed to export xlsx");
    assert!(xlsx.path.is_file());
    assert!(xlsx.file_name.ends_with(".xlsx"));

    let json = db
        .curator
        .export()
        .export_table("orders", ExportFormat::Json)
        .await
        .expect("failed to export json");
    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json.path).unwrap()).unwrap();
    let rows = parsed.as_array().expect("rows array");
    assert_eq!(rows.len(), 3);
    // NULL note survives as JSON null
    assert!(rows.iter().any(|row| row["note"].is_null()));

    db.teardown().await.expect("failed to tear down");
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL server"]
async fn test_should_fail_single_export_of_empty_table() {
    let db = TestDb::connect().await.expect("failed to connect");
    db.seed_linked_tables().await.expect("failed to seed");
    db.curator
        .executor()
        .execute("DELETE FROM orders", Vec::new())
        .await
        .expect("failed to empty table");

    let err = db
        .curator
        .export()
        .export_table("orders", ExportFormat::Json)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no rows to export"));

    db.teardown().await.expect("failed to tear down");
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL server"]
async fn test_should_write_combined_export_and_skip_missing_table() {
    let db = TestDb::connect().await.expect("failed to connect");
    db.seed_linked_tables().await.expect("failed to seed");

    let batch = db
        .curator
        .export()
        .export_tables(
            &[
                "orders".to_string(),
                "no_such_table".to_string(),
                "customers".to_string(),
            ],
            ExportFormat::Json,
        )
        .await
        .expect("run should survive one missing table");

    assert_eq!(batch.exported.len(), 1);
    assert_eq!(batch.failed.len(), 1);
    assert_eq!(batch.failed[0].table, "no_such_table");
    assert!(!batch.is_complete());

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&batch.exported[0].path).unwrap()).unwrap();
    assert_eq!(parsed["orders"].as_array().unwrap().len(), 3);
    assert_eq!(parsed["customers"].as_array().unwrap().len(), 2);
    assert!(parsed.get("no_such_table").is_none());

    db.teardown().await.expect("failed to tear down");
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL server"]
async fn test_should_fail_export_when_no_requested_table_exists() {
    let db = TestDb::connect().await.expect("failed to connect");
    db.seed_linked_tables().await.expect("failed to seed");

    let err = db
        .curator
        .export()
        .export_tables(&["ghost_a".to_string(), "ghost_b".to_string()], ExportFormat::Json)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("table not found"));

    db.teardown().await.expect("failed to tear down");
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL server"]
async fn test_should_export_ad_hoc_query_result() {
    let db = TestDb::connect().await.expect("failed to connect");
    db.seed_linked_tables().await.expect("failed to seed");

    let json = db
        .curator
        .export()
        .export_query(
            "SELECT c.name, COUNT(o.id) AS order_count \
             FROM customers c LEFT JOIN orders o ON o.customer_id = c.id \
             GROUP BY c.name ORDER BY c.name",
            ExportFormat::Json,
        )
        .await
        .expect("failed to export query as json");

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json.path).unwrap()).unwrap();
    let rows = parsed.as_array().expect("rows array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "Alice");
    assert_eq!(rows[0]["order_count"], 2);

    // the spreadsheet path goes through the text staging round-trip
    let xlsx = db
        .curator
        .export()
        .export_query("SELECT id, note FROM orders ORDER BY id", ExportFormat::Excel)
        .await
        .expect("failed to export query as xlsx");
    assert!(xlsx.path.is_file());

    db.teardown().await.expect("failed to tear down");
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL server"]
async fn test_should_leave_no_staging_table_on_any_session() {
    let db = TestDb::connect().await.expect("failed to connect");
    db.seed_linked_tables().await.expect("failed to seed");

    // successful round-trip drops its staging table before committing
    db.curator
        .export()
        .export_query("SELECT id, note FROM orders ORDER BY id", ExportFormat::Excel)
        .await
        .expect("failed to export query as xlsx");

    // a failing round-trip rolls its whole transaction back, staging
    // table included: the duplicate alias is a valid query result but an
    // impossible staging table definition
    db.curator
        .export()
        .export_query("SELECT 1 AS dup, 2 AS dup", ExportFormat::Excel)
        .await
        .expect_err("duplicate column names must fail the staged export");

    let leftovers = db
        .curator
        .executor()
        .run_query(
            "SELECT COUNT(*) AS leftovers FROM pg_class WHERE relname LIKE 'temp_export_%'",
        )
        .await
        .expect("failed to inspect pg_class");
    assert_eq!(leftovers.value(0, "leftovers"), Some(&SqlValue::Int(0)));

    db.teardown().await.expect("failed to tear down");
}
