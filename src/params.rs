//! Filter-grammar parser
//!
//! Turns a table's query-string pairs into a `QueryDescriptor`. The grammar
//! is `column=op.value` for predicates plus the reserved keys `select`,
//! `order`, `limit`, `offset`, `on_conflict`, and `head`.
//!
//! Keys whose value carries an unrecognized operator prefix are dropped, not
//! rejected; the grammar stays forward compatible with operators this build
//! does not know. Malformed reserved-key values (a non-numeric `limit`, a
//! negative `offset`) are validation errors and never reach the database.
//!
//! Known limitation: values inside `in.(a,b,c)` cannot themselves contain
//! commas; there is no escaping in the list form.

use crate::descriptor::{Filter, FilterOp, FilterValue, OrderDirection, QueryDescriptor};
use crate::error::{GatewayError, Result};

/// Query-string keys with reserved meaning; everything else is a predicate
const RESERVED_KEYS: &[&str] = &["select", "order", "limit", "offset", "on_conflict", "head"];

/// Parse query-string pairs for `table` into a descriptor.
///
/// Pair order is preserved in `filters`, which fixes the parameter order of
/// the generated SQL.
pub fn parse_query(table: &str, pairs: &[(String, String)]) -> Result<QueryDescriptor> {
    let mut desc = QueryDescriptor::new(table);

    for (key, raw) in pairs {
        match key.as_str() {
            "select" => {
                desc.select = Some(raw.clone());
            }
            "order" => {
                desc.order = Some(parse_order(raw));
            }
            "limit" => {
                desc.limit = Some(parse_page_bound("limit", raw)?);
            }
            "offset" => {
                desc.offset = Some(parse_page_bound("offset", raw)?);
            }
            "on_conflict" => {
                desc.on_conflict = raw
                    .split(',')
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "head" => {
                desc.head = raw == "true";
            }
            column => {
                if let Some(filter) = parse_filter(column, raw)? {
                    desc.filters.push(filter);
                } else {
                    log::debug!("dropping filter '{}={}': unrecognized operator", column, raw);
                }
            }
        }
    }

    Ok(desc)
}

/// `column.desc` / `column.asc`; a trailing segment other than literal
/// `desc` means ascending
fn parse_order(raw: &str) -> (String, OrderDirection) {
    match raw.rsplit_once('.') {
        Some((column, "desc")) => (column.to_string(), OrderDirection::Desc),
        Some((column, _)) => (column.to_string(), OrderDirection::Asc),
        None => (raw.to_string(), OrderDirection::Asc),
    }
}

fn parse_page_bound(key: &str, raw: &str) -> Result<i64> {
    let n: i64 = raw.parse().map_err(|_| {
        GatewayError::validation(format!("{} must be a non-negative integer, got '{}'", key, raw))
    })?;
    if n < 0 {
        return Err(GatewayError::validation(format!(
            "{} must be a non-negative integer, got '{}'",
            key, raw
        )));
    }
    Ok(n)
}

/// Parse one `op.payload` predicate value. Returns `Ok(None)` when the
/// operator prefix is unrecognized (the key is dropped).
fn parse_filter(column: &str, raw: &str) -> Result<Option<Filter>> {
    let Some((prefix, payload)) = raw.split_once('.') else {
        return Ok(None);
    };
    let Some(op) = FilterOp::from_prefix(prefix) else {
        return Ok(None);
    };

    let value = match op {
        FilterOp::Is => match payload {
            "null" => FilterValue::Null,
            "not.null" => FilterValue::NotNull,
            other => {
                return Err(GatewayError::validation(format!(
                    "is filter on '{}' supports only 'null' or 'not.null', got '{}'",
                    column, other
                )));
            }
        },
        FilterOp::In => {
            let inner = payload
                .strip_prefix('(')
                .and_then(|p| p.strip_suffix(')'))
                .ok_or_else(|| {
                    GatewayError::validation(format!(
                        "in filter on '{}' expects a parenthesized list, got '{}'",
                        column, payload
                    ))
                })?;
            if inner.is_empty() {
                // Defined behavior: an empty set matches nothing
                FilterValue::Set(Vec::new())
            } else {
                FilterValue::Set(inner.split(',').map(str::to_string).collect())
            }
        }
        _ => FilterValue::Text(payload.to_string()),
    };

    Ok(Some(Filter::new(column, op, value)))
}

/// Whether a query-string key has reserved meaning (is not a filter column)
pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}
