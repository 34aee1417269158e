use super::*;

#[test]
fn detect_dialect_from_scheme() {
    assert_eq!(
        detect_dialect("mysql://root:pw@localhost/shop").unwrap(),
        DatabaseType::MySQL
    );
    assert_eq!(
        detect_dialect("postgresql://app:pw@db/app").unwrap(),
        DatabaseType::PostgreSQL
    );
    assert_eq!(
        detect_dialect("postgres://app:pw@db/app").unwrap(),
        DatabaseType::PostgreSQL
    );
    assert!(detect_dialect("oracle://x:y@z/w").is_err());
}

#[test]
fn mysql_table_list_uses_information_schema_with_bind() {
    let q = table_list_query(&DatabaseType::MySQL, "shop");
    assert!(q.sql.contains("INFORMATION_SCHEMA.TABLES"));
    assert!(q.sql.contains("TABLE_SCHEMA = ?"));
    assert_eq!(q.params, vec!["shop"]);
}

#[test]
fn postgres_table_list_defaults_are_caller_supplied() {
    let q = table_list_query(&DatabaseType::PostgreSQL, "public");
    assert!(q.sql.contains("information_schema.tables"));
    assert!(q.sql.contains("$1"));
    assert_eq!(q.params, vec!["public"]);
}

#[test]
fn column_query_orders_by_ordinal_position() {
    for db in [DatabaseType::MySQL, DatabaseType::PostgreSQL] {
        let q = column_query(&db, "public", "users");
        assert!(q.sql.to_uppercase().contains("ORDINAL_POSITION"));
        assert_eq!(q.params, vec!["public", "users"]);
    }
}

#[test]
fn postgres_column_query_derives_primary_key_flag() {
    let q = column_query(&DatabaseType::PostgreSQL, "public", "users");
    assert!(q.sql.contains("PRIMARY KEY"));
    assert!(q.sql.contains("'PRI'"));
}

#[test]
fn foreign_key_query_scopes_to_table_when_given() {
    let scoped = foreign_key_query(&DatabaseType::MySQL, "shop", Some("orders"));
    assert!(scoped.sql.contains("kcu.TABLE_NAME = ?"));
    assert_eq!(scoped.params, vec!["shop", "orders"]);

    let whole_schema = foreign_key_query(&DatabaseType::MySQL, "shop", None);
    assert!(!whole_schema.sql.contains("kcu.TABLE_NAME = ?"));
    assert_eq!(whole_schema.params, vec!["shop"]);
}

#[test]
fn foreign_key_query_exposes_referential_rules() {
    for db in [DatabaseType::MySQL, DatabaseType::PostgreSQL] {
        let q = foreign_key_query(&db, "public", Some("orders"));
        let upper = q.sql.to_uppercase();
        assert!(upper.contains("UPDATE_RULE"));
        assert!(upper.contains("DELETE_RULE"));
    }
}

#[test]
fn postgres_index_query_joins_pg_catalog() {
    let q = index_query(&DatabaseType::PostgreSQL, "public", "users");
    for view in ["pg_class", "pg_index", "pg_attribute", "pg_am"] {
        assert!(q.sql.contains(view), "missing {}", view);
    }
}

#[test]
fn mysql_index_query_reads_statistics_cardinality() {
    let q = index_query(&DatabaseType::MySQL, "shop", "users");
    assert!(q.sql.contains("INFORMATION_SCHEMA.STATISTICS"));
    assert!(q.sql.contains("CARDINALITY"));
}

#[test]
fn catalog_table_parse() {
    assert_eq!(CatalogTable::parse("COLUMNS").unwrap(), CatalogTable::Columns);
    assert_eq!(CatalogTable::parse("tables").unwrap(), CatalogTable::Tables);
    assert!(CatalogTable::parse("VIEWS").is_err());
}

#[test]
fn information_schema_query_rejects_lowercase_filter_keys() {
    let err = information_schema_query(
        &DatabaseType::MySQL,
        CatalogTable::Columns,
        &[("table_name".to_string(), "users".to_string())],
        100,
    );
    assert!(err.is_err());
}

#[test]
fn information_schema_query_binds_filter_values() {
    let q = information_schema_query(
        &DatabaseType::MySQL,
        CatalogTable::Columns,
        &[("TABLE_NAME".to_string(), "users".to_string())],
        100,
    )
    .unwrap();
    assert!(q.sql.contains("TABLE_NAME = ?"));
    assert!(q.sql.ends_with("LIMIT 100"));
    assert_eq!(q.params, vec!["users"]);
}

#[test]
fn information_schema_query_lowercases_for_postgres() {
    let q = information_schema_query(
        &DatabaseType::PostgreSQL,
        CatalogTable::Routines,
        &[("ROUTINE_NAME".to_string(), "f".to_string())],
        10,
    )
    .unwrap();
    assert!(q.sql.contains("information_schema.routines"));
    assert!(q.sql.contains("routine_name = $1"));
}

#[test]
fn cascade_both_ways_is_a_strong_dependency() {
    let class = classify_relationship("CASCADE", "CASCADE");
    assert_eq!(class.relationship_type, "strong_dependency");
    assert_eq!(class.relationship_strength, "strong");
}

#[test]
fn set_null_is_an_optional_reference() {
    let class = classify_relationship("NO ACTION", "SET NULL");
    assert_eq!(class.relationship_type, "optional_reference");
    assert_eq!(class.relationship_strength, "weak");
}

#[test]
fn restrict_rules_classify_protective_medium() {
    let class = classify_relationship("RESTRICT", "RESTRICT");
    assert_eq!(class.relationship_type, "protective");
    assert_eq!(class.relationship_strength, "medium");

    let no_action = classify_relationship("NO ACTION", "NO ACTION");
    assert_eq!(no_action.relationship_type, "protective");
    assert_eq!(no_action.relationship_strength, "weak");
}

#[test]
fn unknown_rules_fall_through() {
    let class = classify_relationship("", "SET DEFAULT");
    assert_eq!(class.relationship_type, "unknown");
    assert_eq!(class.relationship_strength, "weak");
}
