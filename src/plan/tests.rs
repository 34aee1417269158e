use super::*;

#[test]
fn pg_plan_traversal_is_preorder_with_issue_detection() {
    let payload = serde_json::json!([
        {
            "Plan": {
                "Node Type": "Seq Scan",
                "Relation Name": "orders",
                "Total Cost": 120.0,
                "Plans": [
                    {
                        "Node Type": "Index Scan",
                        "Relation Name": "users",
                        "Total Cost": 5.0
                    }
                ]
            }
        }
    ]);

    let summary = analyze_plan(&DatabaseType::PostgreSQL, &payload);
    assert_eq!(summary.operations, vec!["Seq Scan", "Index Scan"]);
    assert_eq!(summary.potential_issues, vec!["full table scan on orders"]);
    assert_eq!(summary.cost, Some(120.0));
}

#[test]
fn pg_plan_accepts_bare_object_root() {
    let payload = serde_json::json!({
        "Plan": {
            "Node Type": "Index Only Scan",
            "Relation Name": "users",
            "Total Cost": 3.2
        }
    });

    let summary = analyze_plan(&DatabaseType::PostgreSQL, &payload);
    assert_eq!(summary.operations, vec!["Index Only Scan"]);
    assert!(summary.potential_issues.is_empty());
    assert_eq!(summary.cost, Some(3.2));
}

#[test]
fn pg_seq_scan_without_relation_name_still_flags() {
    let payload = serde_json::json!([{ "Plan": { "Node Type": "Seq Scan" } }]);
    let summary = analyze_plan(&DatabaseType::PostgreSQL, &payload);
    assert_eq!(summary.potential_issues, vec!["full table scan on unknown"]);
}

#[test]
fn mysql_query_cost_reads_nested_string_json() {
    let payload = serde_json::json!({
        "query_block": {
            "cost_info": {
                "query_cost": "42.75"
            }
        }
    });
    assert_eq!(parse_mysql_query_cost(&payload), Some(42.75));
}

#[test]
fn mysql_plan_finds_tables_at_any_nesting() {
    let payload = serde_json::json!({
        "query_block": {
            "cost_info": { "query_cost": "310.50" },
            "nested_loop": [
                {
                    "table": {
                        "table_name": "orders",
                        "access_type": "ALL"
                    }
                },
                {
                    "table": {
                        "table_name": "users",
                        "access_type": "eq_ref",
                        "key": "PRIMARY"
                    }
                }
            ]
        }
    });

    let summary = analyze_plan(&DatabaseType::MySQL, &payload);
    assert_eq!(summary.operations, vec!["ALL", "eq_ref"]);
    assert_eq!(summary.potential_issues, vec!["full table scan on orders"]);
    assert_eq!(summary.cost, Some(310.5));
}

#[test]
fn mysql_plan_descends_into_subqueries() {
    let payload = serde_json::json!({
        "query_block": {
            "table": {
                "table_name": "t",
                "access_type": "range",
                "attached_subqueries": [
                    {
                        "query_block": {
                            "table": {
                                "table_name": "inner_t",
                                "access_type": "ALL"
                            }
                        }
                    }
                ]
            }
        }
    });

    let summary = analyze_plan(&DatabaseType::MySQL, &payload);
    assert_eq!(summary.operations, vec!["range", "ALL"]);
    assert_eq!(summary.potential_issues, vec!["full table scan on inner_t"]);
}

#[test]
fn unrecognized_plan_degrades_to_raw_value() {
    let payload = serde_json::json!("EXPLAIN output the driver failed to encode");

    let summary = analyze_plan(&DatabaseType::MySQL, &payload);
    assert!(summary.cost.is_none());
    assert!(summary.operations.is_empty());
    assert!(summary.potential_issues.is_empty());
    assert_eq!(summary.raw_plan, payload);

    let pg = analyze_plan(&DatabaseType::PostgreSQL, &payload);
    assert!(pg.cost.is_none());
    assert!(pg.operations.is_empty());
}

#[test]
fn traversal_depth_is_bounded() {
    // Build a plan nested far past the cap; the walk must return, not overflow.
    let mut node = serde_json::json!({ "table": { "access_type": "ALL", "table_name": "deep" } });
    for _ in 0..300 {
        node = serde_json::json!({ "nested": node });
    }
    let summary = analyze_plan(&DatabaseType::MySQL, &node);
    assert!(summary.operations.is_empty());
}
