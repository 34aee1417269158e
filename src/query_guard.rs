// =====================================================
// QUERY SAFETY GUARD
// Read-only whitelist, injection screening, complexity scoring
// =====================================================
//
// Heuristic, layered filter over free-form SQL. No single pattern check is
// sound on its own, so the guard runs several independent ones in a fixed
// order: forbidden keywords, forbidden functions, leading-token whitelist,
// injection patterns, resource bounds. All checks run against the normalized
// (comment-stripped, whitespace-collapsed, uppercased) form of the query.

use regex::Regex;
use std::sync::LazyLock;

use crate::db_types::{DatabaseType, QueryComplexity, ValidationResult};
use crate::sql_utils::normalize_query;

const MAX_QUERY_LEN: usize = 10_000;
const MAX_OPEN_PARENS: usize = 50;

static FORBIDDEN_KEYWORD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // A mutating or administrative keyword anywhere in the statement, not just
    // as the first token: a CTE or a stacked statement can smuggle one in.
    Regex::new(
        r"(?x)\b(
            INSERT|UPDATE|DELETE|REPLACE|MERGE
            |CREATE|ALTER|DROP|TRUNCATE|RENAME
            |GRANT|REVOKE|SET|USE
            |BEGIN|COMMIT|ROLLBACK|SAVEPOINT|START
            |LOCK|UNLOCK
            |CALL|EXEC|EXECUTE|LOAD|KILL|SHUTDOWN|COPY|DO
            |HANDLER|PREPARE|DEALLOCATE|VACUUM|REINDEX|CLUSTER
        )\b",
    )
    .unwrap()
});

const FORBIDDEN_FUNCTIONS: [&str; 8] = [
    "LOAD_FILE",
    "INTO OUTFILE",
    "INTO DUMPFILE",
    "SYSTEM",
    "BENCHMARK",
    "PG_READ_FILE",
    "PG_LS_DIR",
    "PG_EXECUTE",
];

const ALLOWED_LEADING_KEYWORDS: [&str; 11] = [
    "SELECT", "SHOW", "DESCRIBE", "DESC", "EXPLAIN", "ANALYZE", "CHECK", "CHECKSUM", "OPTIMIZE",
    "WITH", "VALUES",
];

static INJECTION_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r";\s*(SELECT|WITH|UNION|VALUES|SHOW|DESCRIBE|EXPLAIN)\b").unwrap(),
            "stacked statement detected",
        ),
        (
            Regex::new(r"\bUNION\s+(ALL\s+)?SELECT\b").unwrap(),
            "UNION-based injection pattern detected",
        ),
        (
            Regex::new(r"'\s*OR\s*'[^']*'\s*=\s*'").unwrap(),
            "quote-based tautology detected",
        ),
        (
            Regex::new(r"\bOR\s+\d+\s*=\s*\d+").unwrap(),
            "numeric tautology detected",
        ),
        (
            Regex::new(r"(\|\|\s*0X[0-9A-F]+|0X[0-9A-F]+\s*\|\||CONCAT\s*\(\s*0X[0-9A-F]+)")
                .unwrap(),
            "hex-encoded concatenation detected",
        ),
        (
            Regex::new(r"\b(SLEEP|BENCHMARK)\s*\(").unwrap(),
            "time-based probing detected",
        ),
    ]
});

static MYSQL_SCHEMA_PROBE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"INFORMATION_SCHEMA\.[A-Z0-9_]+\s+(WHERE|AND|OR)\b").unwrap()
});

static LEADING_WILDCARD_LIKE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bLIKE\s+'%").unwrap());

static COMMA_JOIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bFROM\s+[A-Z0-9_$`".]+\s*,\s*[A-Z0-9_$`".]+"#).unwrap()
});

static JOIN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bJOIN\b").unwrap());
static SELECT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bSELECT\b").unwrap());
static AGGREGATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(COUNT|SUM|AVG|MIN|MAX)\s*\(").unwrap());

/// Classifies a raw SQL string as safe to execute or rejected. Rejection
/// reports the first failing check; acceptance may carry advisory warnings.
pub fn validate_query(sql: &str, db_type: &DatabaseType) -> ValidationResult {
    let normalized = normalize_query(sql);
    if normalized.is_empty() {
        return ValidationResult::invalid("query is empty");
    }

    if let Some(m) = FORBIDDEN_KEYWORD_REGEX.find(&normalized) {
        return ValidationResult::invalid(format!(
            "query contains forbidden keyword {}",
            m.as_str()
        ));
    }

    for func in FORBIDDEN_FUNCTIONS {
        if normalized.contains(func) {
            return ValidationResult::invalid(format!(
                "query references forbidden function or clause {}",
                func
            ));
        }
    }

    let leading = normalized.split_whitespace().next().unwrap_or("");
    if !ALLOWED_LEADING_KEYWORDS.contains(&leading) {
        return ValidationResult::invalid(format!(
            "only read-only statements are allowed; '{}' is not a permitted starting keyword",
            leading
        ));
    }

    for (pattern, reason) in INJECTION_PATTERNS.iter() {
        if pattern.is_match(&normalized) {
            return ValidationResult::invalid(*reason);
        }
    }
    if *db_type == DatabaseType::MySQL && MYSQL_SCHEMA_PROBE_REGEX.is_match(&normalized) {
        return ValidationResult::invalid("information_schema probing pattern detected");
    }

    if sql.len() > MAX_QUERY_LEN {
        return ValidationResult::invalid(format!(
            "query exceeds {} characters ({})",
            MAX_QUERY_LEN,
            sql.len()
        ));
    }
    if sql.matches('(').count() > MAX_OPEN_PARENS {
        return ValidationResult::invalid(format!(
            "query nesting exceeds {} opening parentheses",
            MAX_OPEN_PARENS
        ));
    }

    ValidationResult::ok_with_warnings(collect_warnings(&normalized))
}

fn collect_warnings(normalized: &str) -> Vec<String> {
    let mut warnings = Vec::new();
    if normalized.contains("SELECT *") {
        warnings.push("SELECT * returns every column; project only what you need".to_string());
    }
    if normalized.contains("ORDER BY") && !normalized.contains("LIMIT") {
        warnings.push("ORDER BY without LIMIT may sort an unbounded result set".to_string());
    }
    if LEADING_WILDCARD_LIKE_REGEX.is_match(normalized) {
        warnings.push("leading-wildcard LIKE pattern prevents index use".to_string());
    }
    if COMMA_JOIN_REGEX.is_match(normalized) && !normalized.contains(" WHERE ") {
        warnings.push("comma-style join without WHERE produces a cross product".to_string());
    }
    warnings
}

/// True for a plain single-table SELECT without joins, subqueries or grouping.
pub fn is_simple_read_query(sql: &str) -> bool {
    let normalized = normalize_query(sql);
    normalized.starts_with("SELECT")
        && SELECT_REGEX.find_iter(&normalized).count() == 1
        && !JOIN_REGEX.is_match(&normalized)
        && !normalized.contains("UNION")
        && !normalized.contains("GROUP BY")
        && !normalized.contains("HAVING")
}

/// Weighted structural score bucketed into low / medium / high.
pub fn query_complexity(sql: &str) -> QueryComplexity {
    let normalized = normalize_query(sql);

    let joins = JOIN_REGEX.find_iter(&normalized).count();
    let subselects = SELECT_REGEX.find_iter(&normalized).count().saturating_sub(1);
    let aggregates = AGGREGATE_REGEX.find_iter(&normalized).count();

    let mut score = joins * 2 + subselects + aggregates;
    if normalized.contains("ORDER BY") {
        score += 1;
    }
    if normalized.contains("GROUP BY") {
        score += 2;
    }
    if normalized.contains("HAVING") {
        score += 1;
    }

    match score {
        0..=2 => QueryComplexity::Low,
        3..=6 => QueryComplexity::Medium,
        _ => QueryComplexity::High,
    }
}
