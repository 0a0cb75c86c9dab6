//! SQL identifier sanitization
//!
//! Every identifier (table name, column name, routine name) that ends up in
//! SQL text goes through this module. Values never do; they are always bound
//! as parameters. This is the single chokepoint that keeps caller-supplied
//! names out of the statement text unquoted.

use regex::Regex;

/// Validate a caller-supplied identifier.
///
/// Rules:
/// - Must start with a lowercase letter
/// - May contain lowercase letters, digits, and underscores
///
/// Reserved keywords are allowed because identifiers are always
/// double-quoted when emitted; the charset restriction exists so a quoted
/// identifier can never smuggle statement syntax past the quoting.
pub fn validate_identifier(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Identifier cannot be empty".to_string());
    }

    let re = Regex::new(r"^[a-z][a-z0-9_]*$").unwrap();
    if !re.is_match(name) {
        return Err(format!(
            "Identifier '{}' is invalid. Must start with a lowercase letter and contain only lowercase letters, numbers, and underscores.",
            name
        ));
    }

    Ok(())
}

/// Quote an identifier for use in SQL text, doubling any embedded quotes
pub fn quote_identifier(identifier: &str) -> String {
    let escaped = identifier.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Validate and quote in one step. All statement-building paths use this.
pub fn safe_identifier(name: &str) -> Result<String, String> {
    validate_identifier(name)?;
    Ok(quote_identifier(name))
}
