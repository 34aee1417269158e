// =====================================================
// INPUT SANITIZATION AND IDENTIFIER VALIDATION
// =====================================================

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::db_types::ValidationResult;

const MAX_IDENTIFIER_LEN: usize = 64;

static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$-]*$").unwrap());

/// What kind of identifier is being validated; only affects error wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Database,
    Table,
    Column,
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentifierKind::Database => write!(f, "database"),
            IdentifierKind::Table => write!(f, "table"),
            IdentifierKind::Column => write!(f, "column"),
        }
    }
}

/// Strips the NUL character and all control characters except tab, newline and
/// carriage return, then trims surrounding whitespace. Total: any input maps
/// to some output.
pub fn sanitize_input(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn is_quoted(name: &str, quote: char) -> bool {
    name.len() >= 3 && name.starts_with(quote) && name.ends_with(quote)
}

/// Accepts a bare name matching the identifier grammar, or a name fully
/// wrapped in backticks or double quotes. Length is capped either way.
pub fn validate_identifier(name: &str, kind: IdentifierKind) -> ValidationResult {
    if name.is_empty() {
        return ValidationResult::invalid(format!("{} name must not be empty", kind));
    }
    if name.len() > MAX_IDENTIFIER_LEN {
        return ValidationResult::invalid(format!(
            "{} name exceeds {} characters ({})",
            kind,
            MAX_IDENTIFIER_LEN,
            name.len()
        ));
    }
    if IDENTIFIER_REGEX.is_match(name) {
        return ValidationResult::ok();
    }
    if is_quoted(name, '`') || is_quoted(name, '"') {
        let inner = &name[1..name.len() - 1];
        if !inner.contains('\0') && !inner.is_empty() {
            return ValidationResult::ok();
        }
    }
    ValidationResult::invalid(format!(
        "invalid {} name '{}': expected [A-Za-z_][A-Za-z0-9_$-]* or a quoted identifier",
        kind, name
    ))
}

/// Removes the backtick or double-quote wrapping from an identifier that
/// already passed validation. Catalog views store bare names, so the quotes
/// must come off before the name is bound as a parameter. Bare names pass
/// through unchanged.
pub fn unquote_identifier(name: &str) -> &str {
    if is_quoted(name, '`') || is_quoted(name, '"') {
        &name[1..name.len() - 1]
    } else {
        name
    }
}

/// A connection URL must parse, use a supported scheme and carry host,
/// username and password. Checked before any alias is registered.
pub fn validate_connection_url(url: &str) -> ValidationResult {
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(e) => return ValidationResult::invalid(format!("malformed connection URL: {}", e)),
    };

    match parsed.scheme() {
        "mysql" | "postgresql" | "postgres" => {}
        other => {
            return ValidationResult::invalid(format!(
                "unsupported scheme '{}': expected mysql, postgresql or postgres",
                other
            ))
        }
    }

    if parsed.host_str().map_or(true, |h| h.is_empty()) {
        return ValidationResult::invalid("connection URL is missing a hostname");
    }
    if parsed.username().is_empty() {
        return ValidationResult::invalid("connection URL is missing a username");
    }
    match parsed.password() {
        Some(p) if !p.is_empty() => {}
        _ => return ValidationResult::invalid("connection URL is missing a password"),
    }

    ValidationResult::ok()
}

#[cfg(test)]
mod tests;
