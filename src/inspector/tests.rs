use super::*;
use serde_json::json;

fn map(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(m) => m,
        other => panic!("fixture must be an object, got {}", other),
    }
}

fn config(db_type: DatabaseType) -> ConnectionConfig {
    ConnectionConfig {
        db_type,
        host: "localhost".to_string(),
        port: 3306,
        username: "root".to_string(),
        password: "pw".to_string(),
        database: Some("shop".to_string()),
        ssl_mode: None,
        schema: None,
    }
}

#[test]
fn mysql_schema_comes_from_the_database_name() {
    let cfg = config(DatabaseType::MySQL);
    assert_eq!(working_schema(&cfg).unwrap(), "shop");

    let mut bare = cfg;
    bare.database = None;
    assert!(working_schema(&bare).is_err());
}

#[test]
fn postgres_schema_defaults_to_public() {
    let mut cfg = config(DatabaseType::PostgreSQL);
    cfg.database = Some("app".to_string());
    assert_eq!(working_schema(&cfg).unwrap(), "public");

    cfg.schema = Some("reporting".to_string());
    assert_eq!(working_schema(&cfg).unwrap(), "reporting");
}

#[test]
fn shapes_table_descriptor_from_catalog_row() {
    let row = map(json!({
        "table_name": "orders",
        "table_type": "BASE TABLE",
        "engine": "InnoDB",
        "row_estimate": 1520,
        "table_comment": "customer orders"
    }));

    let table = shape_table(&row);
    assert_eq!(table.name, "orders");
    assert_eq!(table.table_type, "BASE TABLE");
    assert_eq!(table.engine.as_deref(), Some("InnoDB"));
    assert_eq!(table.row_estimate, Some(1520));
    assert_eq!(table.comment.as_deref(), Some("customer orders"));
}

#[test]
fn empty_and_missing_table_fields_become_none() {
    let row = map(json!({
        "table_name": "v_orders",
        "table_type": "VIEW",
        "engine": null,
        "table_comment": ""
    }));

    let table = shape_table(&row);
    assert!(table.engine.is_none());
    assert!(table.row_estimate.is_none());
    assert!(table.comment.is_none());
}

#[test]
fn mysql_auto_increment_comes_from_extra() {
    let row = map(json!({
        "column_name": "id",
        "data_type": "bigint",
        "column_type": "bigint unsigned",
        "is_nullable": "NO",
        "column_key": "PRI",
        "extra": "auto_increment",
        "column_default": null
    }));

    let column = shape_column(&DatabaseType::MySQL, &row);
    assert_eq!(column.name, "id");
    assert!(column.is_primary_key);
    assert!(column.is_auto_increment);
    assert!(!column.is_nullable);
    assert!(column.column_default.is_none());
}

#[test]
fn postgres_auto_increment_comes_from_nextval_default() {
    let row = map(json!({
        "column_name": "id",
        "data_type": "integer",
        "column_type": "integer",
        "is_nullable": "NO",
        "column_key": "PRI",
        "extra": "",
        "column_default": "nextval('orders_id_seq'::regclass)"
    }));

    let column = shape_column(&DatabaseType::PostgreSQL, &row);
    assert!(column.is_auto_increment);
    assert_eq!(
        column.column_default.as_deref(),
        Some("nextval('orders_id_seq'::regclass)")
    );
}

#[test]
fn numeric_precision_and_scale_survive_string_decoding() {
    let row = map(json!({
        "column_name": "price",
        "data_type": "decimal",
        "column_type": "decimal(10,2)",
        "is_nullable": "YES",
        "column_key": "",
        "extra": "",
        "column_default": null,
        "numeric_precision": "10",
        "numeric_scale": 2
    }));

    let column = shape_column(&DatabaseType::MySQL, &row);
    assert!(column.is_nullable);
    assert!(!column.is_primary_key);
    assert_eq!(column.numeric_precision, Some(10));
    assert_eq!(column.numeric_scale, Some(2));
}

#[test]
fn shapes_foreign_key_with_classification() {
    let row = map(json!({
        "constraint_name": "fk_orders_customer",
        "table_name": "orders",
        "column_name": "customer_id",
        "referenced_table": "customers",
        "referenced_column": "id",
        "update_rule": "CASCADE",
        "delete_rule": "CASCADE"
    }));

    let fk = shape_foreign_key(&row);
    assert_eq!(fk.constraint_name, "fk_orders_customer");
    assert_eq!(fk.referenced_table, "customers");
    assert_eq!(fk.relationship_type, "strong_dependency");
    assert_eq!(fk.relationship_strength, "strong");
}

#[test]
fn shapes_index_with_mixed_flag_encodings() {
    let numeric = map(json!({
        "index_name": "idx_email",
        "column_name": "email",
        "non_unique": 0,
        "index_type": "BTREE",
        "cardinality": 4200
    }));
    let idx = shape_index(&numeric);
    assert_eq!(idx.name, "idx_email");
    assert!(!idx.non_unique);
    assert_eq!(idx.cardinality, Some(4200));

    let boolean = map(json!({
        "index_name": "idx_created",
        "column_name": "created_at",
        "non_unique": true,
        "index_type": "btree",
        "cardinality": null
    }));
    let idx = shape_index(&boolean);
    assert!(idx.non_unique);
    assert!(idx.cardinality.is_none());
}

#[tokio::test]
async fn execute_query_rejects_writes_before_connecting() {
    let inspector = SchemaInspector::new();
    inspector
        .register_connection("shop", "mysql://root:pw@localhost/shop")
        .await
        .unwrap();

    let err = inspector
        .execute_query("shop", "DELETE FROM orders", &[], None)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Validation { .. }));
}

#[tokio::test]
async fn execute_query_rejects_structured_params() {
    let inspector = SchemaInspector::new();
    inspector
        .register_connection("shop", "mysql://root:pw@localhost/shop")
        .await
        .unwrap();

    let err = inspector
        .execute_query("shop", "SELECT * FROM orders WHERE id = ?", &[json!([1, 2])], None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("scalars"));
}

#[tokio::test]
async fn operations_against_unknown_alias_fail_fast() {
    let inspector = SchemaInspector::new();
    assert!(inspector.list_tables("nope").await.is_err());
    assert!(inspector.execute_query("nope", "SELECT 1", &[], None).await.is_err());
    assert!(inspector.list_aliases().await.is_empty());
}

#[test]
fn quoted_table_names_are_unwrapped_before_catalog_binding() {
    let inspector = SchemaInspector::new();

    let name = inspector
        .checked_identifier("`1users`", IdentifierKind::Table)
        .unwrap();
    assert_eq!(name, "1users");
    let query = catalog::column_query(&DatabaseType::MySQL, "shop", &name);
    assert_eq!(query.params, vec!["shop", "1users"]);

    let name = inspector
        .checked_identifier("\"my table\"", IdentifierKind::Table)
        .unwrap();
    assert_eq!(name, "my table");

    // Bare names pass through untouched.
    let name = inspector
        .checked_identifier("orders", IdentifierKind::Table)
        .unwrap();
    assert_eq!(name, "orders");
}

#[tokio::test]
async fn inspect_table_rejects_malformed_identifiers() {
    let inspector = SchemaInspector::new();
    inspector
        .register_connection("shop", "mysql://root:pw@localhost/shop")
        .await
        .unwrap();

    let err = inspector
        .inspect_table("shop", "orders; DROP TABLE users")
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Validation { .. }));
}

#[tokio::test]
async fn query_information_schema_rejects_unknown_catalog_table() {
    let inspector = SchemaInspector::new();
    inspector
        .register_connection("shop", "mysql://root:pw@localhost/shop")
        .await
        .unwrap();

    assert!(inspector
        .query_information_schema("shop", "pg_shadow", &[], None)
        .await
        .is_err());
}
