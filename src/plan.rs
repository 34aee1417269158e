// =====================================================
// EXECUTION PLAN ANALYSIS
// =====================================================
//
// Reduces the dialect-specific EXPLAIN JSON to a flat summary: estimated
// cost, the physical operations in pre-order, and anything that looks like a
// performance problem (currently full table scans). PostgreSQL plans are a
// regular Plan/Plans tree; MySQL plans nest differently per query shape, so
// that side is a generic descent over the whole value looking for `table`
// nodes. Traversal depth is capped so a pathological plan cannot recurse
// without bound.

use serde_json::Value;

use crate::db_types::{DatabaseType, PlanSummary};

const MAX_PLAN_DEPTH: usize = 100;

/// Interprets a raw EXPLAIN payload. Never fails: a plan that cannot be
/// understood comes back with empty summary fields and the raw value intact.
pub fn analyze_plan(db_type: &DatabaseType, raw_plan: &Value) -> PlanSummary {
    let mut summary = PlanSummary {
        cost: None,
        operations: Vec::new(),
        potential_issues: Vec::new(),
        raw_plan: raw_plan.clone(),
    };

    match db_type {
        DatabaseType::PostgreSQL => {
            if let Some(root) = pg_root_node(raw_plan) {
                summary.cost = root.get("Total Cost").and_then(Value::as_f64);
                walk_pg_node(root, 0, &mut summary);
            }
        }
        DatabaseType::MySQL => {
            summary.cost = parse_mysql_query_cost(raw_plan);
            walk_mysql_value(raw_plan, 0, &mut summary);
        }
    }

    summary
}

/// EXPLAIN (FORMAT JSON) yields an array whose first element holds `Plan`;
/// a bare object with `Plan` is accepted too.
fn pg_root_node(raw_plan: &Value) -> Option<&Value> {
    match raw_plan {
        Value::Array(items) => items.first().and_then(|item| item.get("Plan")),
        Value::Object(_) => raw_plan.get("Plan"),
        _ => None,
    }
}

fn walk_pg_node(node: &Value, depth: usize, summary: &mut PlanSummary) {
    if depth > MAX_PLAN_DEPTH {
        return;
    }
    if let Some(node_type) = node.get("Node Type").and_then(Value::as_str) {
        summary.operations.push(node_type.to_string());
        if node_type == "Seq Scan" {
            let relation = node
                .get("Relation Name")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            summary
                .potential_issues
                .push(format!("full table scan on {}", relation));
        }
    }
    if let Some(children) = node.get("Plans").and_then(Value::as_array) {
        for child in children {
            walk_pg_node(child, depth + 1, summary);
        }
    }
}

/// MySQL reports `query_cost` as a string inside `query_block.cost_info`.
pub(crate) fn parse_mysql_query_cost(raw_plan: &Value) -> Option<f64> {
    let cost = raw_plan.get("query_block")?.get("cost_info")?.get("query_cost")?;
    match cost {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// The plan shape varies by query type (joins, subqueries, unions all nest
/// differently), so every object value is inspected for a `table` entry.
fn walk_mysql_value(value: &Value, depth: usize, summary: &mut PlanSummary) {
    if depth > MAX_PLAN_DEPTH {
        return;
    }
    match value {
        Value::Object(map) => {
            if let Some(table) = map.get("table").filter(|t| t.is_object()) {
                record_mysql_table(table, summary);
            }
            for child in map.values() {
                walk_mysql_value(child, depth + 1, summary);
            }
        }
        Value::Array(items) => {
            for child in items {
                walk_mysql_value(child, depth + 1, summary);
            }
        }
        _ => {}
    }
}

fn record_mysql_table(table: &Value, summary: &mut PlanSummary) {
    if let Some(access_type) = table.get("access_type").and_then(Value::as_str) {
        summary.operations.push(access_type.to_string());
        if access_type == "ALL" {
            let name = table
                .get("table_name")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            summary
                .potential_issues
                .push(format!("full table scan on {}", name));
        }
    }
}

#[cfg(test)]
mod tests;
