use integration_tests::TestDb;

#[tokio::test]
#[ignore = "requires a live PostgreSQL server"]
async fn test_should_discover_tables_and_columns() {
    let db = TestDb::connect().await.expect("failed to connect");
    db.seed_linked_tables().await.expect("failed to seed");

    let tables = db.curator.schema().list_tables().await.expect("failed to list tables");
    assert!(tables.contains(&"customers".to_string()));
    assert!(tables.contains(&"orders".to_string()));

    let columns = db
        .curator
        .schema()
        .columns("orders")
        .await
        .expect("failed to read columns");
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "customer_id", "note"]);
    assert!(columns.iter().find(|c| c.name == "note").unwrap().nullable);

    db.teardown().await.expect("failed to tear down");
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL server"]
async fn test_should_discover_foreign_keys_in_both_directions() {
    let db = TestDb::connect().await.expect("failed to connect");
    db.seed_linked_tables().await.expect("failed to seed");

    let edges = db
        .curator
        .schema()
        .foreign_keys("orders")
        .await
        .expect("failed to read foreign keys");
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].child_column, "customer_id");
    assert_eq!(edges[0].parent_table, "customers");
    assert_eq!(edges[0].parent_column, "id");

    let referencing = db
        .curator
        .schema()
        .referencing_edges("customers", None)
        .await
        .expect("failed to read referencing edges");
    assert_eq!(referencing.len(), 1);
    assert_eq!(referencing[0].child_table, "orders");

    db.teardown().await.expect("failed to tear down");
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL server"]
async fn test_should_fail_on_missing_table() {
    let db = TestDb::connect().await.expect("failed to connect");

    let err = db.curator.schema().count("no_such_table").await.unwrap_err();
    assert!(err.to_string().contains("table not found"));
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL server"]
async fn test_should_sum_total_records_across_tables() {
    let db = TestDb::connect().await.expect("failed to connect");
    db.seed_linked_tables().await.expect("failed to seed");

    let total = db
        .curator
        .schema()
        .total_records()
        .await
        .expect("failed to count records");
    // 2 customers + 3 orders, plus whatever else lives in the database
    assert!(total >= 5);

    db.teardown().await.expect("failed to tear down");
}
