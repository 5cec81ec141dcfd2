//! Catalog introspection against the in-memory backend.

use firebird_sync::testing::fixtures::{source_config, target_config, SOURCE_HOST, TARGET_HOST};
use firebird_sync::testing::{MemoryConnector, MemoryServer, TestColumn, TestTable};
use firebird_sync::{ColumnInfo, ErrorKind, SchemaIntrospector};
use std::sync::Arc;

fn introspector(server: &MemoryServer) -> SchemaIntrospector<MemoryConnector> {
    SchemaIntrospector::new(Arc::new(
        MemoryConnector::new().with_server(SOURCE_HOST, server.clone()),
    ))
}

fn column(name: &str, column_type: &str, nullable: bool) -> ColumnInfo {
    ColumnInfo {
        name: name.to_string(),
        column_type: column_type.to_string(),
        nullable,
    }
}

#[tokio::test]
async fn test_tables_sorted_without_system_tables_or_views() {
    let server = MemoryServer::new()
        .with_table(TestTable::new("ORDERS").column(TestColumn::integer("ID")))
        .with_table(TestTable::new("CUSTOMERS").column(TestColumn::integer("ID")))
        .with_table(TestTable::new("MON$ATTACHMENTS").system())
        .with_table(TestTable::new("V_ORDERS").view())
        .with_table(TestTable::new("   "));

    let result = introspector(&server).list_tables(&source_config()).await;

    assert!(result.success);
    assert_eq!(result.error, None);
    assert_eq!(result.table_names(), vec!["CUSTOMERS", "ORDERS"]);
    assert_eq!(server.open_connections(), 0);
}

#[tokio::test]
async fn test_tables_sorted_regardless_of_catalog_order() {
    let server = MemoryServer::new()
        .with_table(TestTable::new("ZONES"))
        .with_table(TestTable::new("ACCOUNTS"))
        .with_table(TestTable::new("INVOICES"))
        .with_catalog_order(&["ZONES", "INVOICES", "ACCOUNTS"]);

    let result = introspector(&server).list_tables(&source_config()).await;

    assert!(result.success);
    assert_eq!(result.table_names(), vec!["ACCOUNTS", "INVOICES", "ZONES"]);
}

#[tokio::test]
async fn test_columns_follow_field_position() {
    let server = MemoryServer::new().with_table(
        TestTable::new("ORDERS")
            .column(TestColumn::double("AMOUNT").at_position(5))
            .column(TestColumn::integer("ID").not_null())
            .column(TestColumn::varchar("NOTE", 200).at_position(3)),
    );

    let result = introspector(&server).list_tables(&source_config()).await;

    assert_eq!(
        result.tables[0].columns,
        vec![
            column("ID", "INTEGER", false),
            column("NOTE", "VARCHAR(200)", true),
            column("AMOUNT", "DOUBLE", true),
        ]
    );
}

#[tokio::test]
async fn test_canonical_types() {
    let server = MemoryServer::new().with_table(
        TestTable::new("TYPES")
            .column(TestColumn::raw("S", 7, Some(2), Some(0)))
            .column(TestColumn::bigint("B"))
            .column(TestColumn::raw("F", 10, Some(4), None))
            .column(TestColumn::raw("D", 12, Some(4), None))
            .column(TestColumn::raw("T", 13, Some(4), None))
            .column(TestColumn::timestamp("TS"))
            .column(TestColumn::raw("C", 14, Some(10), Some(1)))
            .column(TestColumn::raw("FIXED", 14, Some(10), None))
            .column(TestColumn::varchar("V", 50))
            .column(TestColumn::blob("BL").sub_type(1))
            .column(TestColumn::raw("X", 999, Some(10), None))
            .column(TestColumn::raw("Y", 999, None, None)),
    );

    let result = introspector(&server).list_tables(&source_config()).await;

    let types: Vec<&str> = result.tables[0]
        .columns
        .iter()
        .map(|c| c.column_type.as_str())
        .collect();
    assert_eq!(
        types,
        vec![
            "SMALLINT",
            "BIGINT",
            "FLOAT",
            "DATE",
            "TIME",
            "TIMESTAMP",
            "CHAR",
            "VARCHAR(10)",
            "VARCHAR(50)",
            "BLOB",
            "TYPE_999(10)",
            "TYPE_999",
        ]
    );
}

#[tokio::test]
async fn test_table_without_fields_has_no_columns() {
    let server = MemoryServer::new().with_table(TestTable::new("EMPTY"));

    let result = introspector(&server).list_tables(&source_config()).await;

    assert!(result.success);
    assert_eq!(result.tables.len(), 1);
    assert!(result.tables[0].columns.is_empty());
}

#[tokio::test]
async fn test_permission_error_discards_tables() {
    let message = "no permission for read/select access to TABLE RDB$RELATIONS";
    let server = MemoryServer::new().with_table(TestTable::new("ORDERS"));
    server.deny_catalog(message);

    let result = introspector(&server).list_tables(&source_config()).await;

    assert!(!result.success);
    assert!(result.tables.is_empty());
    assert_eq!(result.error.as_deref(), Some(message));
    assert_eq!(result.error_kind, Some(ErrorKind::CatalogQuery));
    assert_eq!(server.open_connections(), 0);
}

#[tokio::test]
async fn test_unreachable_server() {
    let introspector = SchemaIntrospector::new(Arc::new(MemoryConnector::new()));

    let result = introspector.list_tables(&source_config()).await;

    assert!(!result.success);
    assert!(result.tables.is_empty());
    assert_eq!(result.error_kind, Some(ErrorKind::Connection));
}

#[tokio::test]
async fn test_pair_fails_independently() {
    let source = MemoryServer::new().with_table(TestTable::new("ORDERS"));
    let target = MemoryServer::new();
    target.deny_catalog("no permission");
    let connector = MemoryConnector::new()
        .with_server(SOURCE_HOST, source)
        .with_server(TARGET_HOST, target);

    let response = SchemaIntrospector::new(Arc::new(connector))
        .list_tables_pair(&source_config(), &target_config())
        .await;

    assert_eq!(response.server_a.host, SOURCE_HOST);
    assert!(response.server_a.result.success);
    assert!(!response.server_b.result.success);

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["serverA"]["host"], SOURCE_HOST);
    assert_eq!(json["serverA"]["tables"][0]["name"], "ORDERS");
    assert_eq!(json["serverB"]["error"], "no permission");
}
