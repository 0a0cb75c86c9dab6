//! SQL statement assembly
//!
//! Turns a `QueryDescriptor` plus an operation kind into a parameterized SQL
//! string and an ordered parameter list. Identifiers go through the sanitize
//! chokepoint; values are only ever bound, never spliced into the text.
//!
//! Parameter indexing is 1-based and strictly sequential in the order clauses
//! are emitted. For UPDATE, SET-clause parameters precede WHERE-clause
//! parameters.

use serde_json::Value;

use crate::descriptor::{FilterOp, FilterValue, QueryDescriptor};
use crate::error::{GatewayError, Result};
use crate::sql::sanitize::safe_identifier;

/// A SQL string plus the values to bind, in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<BindValue>,
}

/// A value destined for a `$n` placeholder.
///
/// Filter values arrive as query-string text and bind as text; body values
/// arrive as JSON and bind according to their JSON type so the engine can
/// coerce them into the column type.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    Json(Value),
}

impl BindValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(0.0)),
            },
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Json(other.clone()),
        }
    }
}

fn ident(name: &str) -> Result<String> {
    safe_identifier(name).map_err(GatewayError::validation)
}

/// Comparison token for an operator; `In` and `Is` have dedicated clause forms
fn comparison_sql(op: FilterOp) -> &'static str {
    match op {
        FilterOp::Eq => "=",
        FilterOp::Neq => "!=",
        FilterOp::Gt => ">",
        FilterOp::Gte => ">=",
        FilterOp::Lt => "<",
        FilterOp::Lte => "<=",
        FilterOp::Like => "LIKE",
        FilterOp::Ilike => "ILIKE",
        FilterOp::In | FilterOp::Is => unreachable!("handled by clause form"),
    }
}

/// Build the AND-joined WHERE body from the descriptor's filters.
///
/// Comparisons use the text-cast form (`"col"::text = $n::text`) so columns
/// of any type compare uniformly against query-string values. Returns the
/// clause (empty when there are no filters) and the bound values; `next`
/// tracks the next free placeholder index.
fn build_where(desc: &QueryDescriptor, next: &mut usize) -> Result<(String, Vec<BindValue>)> {
    let mut clauses = Vec::new();
    let mut params = Vec::new();

    for filter in &desc.filters {
        let column = ident(&filter.column)?;
        match (&filter.op, &filter.value) {
            (FilterOp::Is, FilterValue::Null) => {
                clauses.push(format!("{} IS NULL", column));
            }
            (FilterOp::Is, FilterValue::NotNull) => {
                clauses.push(format!("{} IS NOT NULL", column));
            }
            (FilterOp::In, FilterValue::Set(values)) => {
                if values.is_empty() {
                    // Empty set matches nothing; no parameters
                    clauses.push("FALSE".to_string());
                } else {
                    let placeholders: Vec<String> = values
                        .iter()
                        .map(|v| {
                            params.push(BindValue::Text(v.clone()));
                            let p = format!("${}::text", *next);
                            *next += 1;
                            p
                        })
                        .collect();
                    clauses.push(format!(
                        "{}::text IN ({})",
                        column,
                        placeholders.join(", ")
                    ));
                }
            }
            (op, FilterValue::Text(value)) if op.is_comparison() => {
                params.push(BindValue::Text(value.clone()));
                clauses.push(format!(
                    "{}::text {} ${}::text",
                    column,
                    comparison_sql(*op),
                    *next
                ));
                *next += 1;
            }
            (op, value) => {
                return Err(GatewayError::validation(format!(
                    "filter on '{}' has mismatched operator {:?} and value {:?}",
                    filter.column, op, value
                )));
            }
        }
    }

    Ok((clauses.join(" AND "), params))
}

/// Column projection: `*` or a validated, quoted comma list
fn projection(select: Option<&str>) -> Result<String> {
    match select {
        None => Ok("*".to_string()),
        Some(s) if s.trim() == "*" => Ok("*".to_string()),
        Some(s) => {
            let cols: Vec<String> = s
                .split(',')
                .map(|c| ident(c.trim()))
                .collect::<Result<_>>()?;
            if cols.is_empty() {
                return Err(GatewayError::validation("empty column projection"));
            }
            Ok(cols.join(", "))
        }
    }
}

/// `SELECT <cols> FROM "t" [WHERE ...] [ORDER BY ...] [LIMIT $n] [OFFSET $n]`
pub fn build_select(desc: &QueryDescriptor) -> Result<Statement> {
    let table = ident(&desc.table)?;
    let cols = projection(desc.select.as_deref())?;
    let mut next = 1;

    let mut sql = format!("SELECT {} FROM {}", cols, table);
    let (where_body, mut params) = build_where(desc, &mut next)?;
    if !where_body.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_body);
    }

    if let Some((column, direction)) = &desc.order {
        sql.push_str(&format!(" ORDER BY {} {}", ident(column)?, direction.as_sql()));
    }
    if let Some(limit) = desc.limit {
        sql.push_str(&format!(" LIMIT ${}", next));
        params.push(BindValue::Int(limit));
        next += 1;
    }
    if let Some(offset) = desc.offset {
        sql.push_str(&format!(" OFFSET ${}", next));
        params.push(BindValue::Int(offset));
    }

    Ok(Statement { sql, params })
}

/// `SELECT COUNT(*)` sharing the filter clause only; projection, ordering,
/// and pagination do not apply
pub fn build_count(desc: &QueryDescriptor) -> Result<Statement> {
    let table = ident(&desc.table)?;
    let mut next = 1;

    let mut sql = format!("SELECT COUNT(*) FROM {}", table);
    let (where_body, params) = build_where(desc, &mut next)?;
    if !where_body.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_body);
    }

    Ok(Statement { sql, params })
}

/// One parameterized INSERT per record. When the descriptor carries conflict
/// columns, appends `ON CONFLICT (...) DO UPDATE SET ...`, or `DO NOTHING`
/// when every payload column is also a conflict column.
pub fn build_insert(
    desc: &QueryDescriptor,
    rows: &[&serde_json::Map<String, Value>],
) -> Result<Vec<Statement>> {
    let table = ident(&desc.table)?;

    let conflict_cols: Vec<String> = desc
        .on_conflict
        .iter()
        .map(|c| ident(c))
        .collect::<Result<_>>()?;

    rows.iter()
        .map(|row| {
            if row.is_empty() {
                return Err(GatewayError::validation("cannot insert an empty record"));
            }

            let mut columns = Vec::new();
            let mut placeholders = Vec::new();
            let mut params = Vec::new();
            for (i, (name, value)) in row.iter().enumerate() {
                columns.push(ident(name)?);
                placeholders.push(format!("${}", i + 1));
                params.push(BindValue::from_json(value));
            }

            let mut sql = format!(
                "INSERT INTO {} AS t ({}) VALUES ({})",
                table,
                columns.join(", "),
                placeholders.join(", ")
            );

            if !conflict_cols.is_empty() {
                let updates: Vec<String> = columns
                    .iter()
                    .filter(|c| !conflict_cols.contains(c))
                    .map(|c| format!("{} = EXCLUDED.{}", c, c))
                    .collect();
                if updates.is_empty() {
                    sql.push_str(&format!(
                        " ON CONFLICT ({}) DO NOTHING",
                        conflict_cols.join(", ")
                    ));
                } else {
                    sql.push_str(&format!(
                        " ON CONFLICT ({}) DO UPDATE SET {}",
                        conflict_cols.join(", "),
                        updates.join(", ")
                    ));
                }
            }

            if desc.return_representation {
                sql.push_str(" RETURNING to_jsonb(t) AS row");
            }

            Ok(Statement { sql, params })
        })
        .collect()
}

/// `UPDATE ... SET ... WHERE ...`; rejects a descriptor with zero filters so
/// an unfiltered update can never reach the engine
pub fn build_update(
    desc: &QueryDescriptor,
    patch: &serde_json::Map<String, Value>,
) -> Result<Statement> {
    if desc.filters.is_empty() {
        return Err(GatewayError::validation(
            "update requires at least one filter",
        ));
    }
    if patch.is_empty() {
        return Err(GatewayError::validation("update requires a non-empty body"));
    }

    let table = ident(&desc.table)?;
    let mut next = 1;
    let mut params = Vec::new();

    // SET parameters come first, WHERE parameters after
    let mut sets = Vec::new();
    for (name, value) in patch {
        sets.push(format!("{} = ${}", ident(name)?, next));
        params.push(BindValue::from_json(value));
        next += 1;
    }

    let (where_body, where_params) = build_where(desc, &mut next)?;
    params.extend(where_params);

    let mut sql = format!(
        "UPDATE {} AS t SET {} WHERE {}",
        table,
        sets.join(", "),
        where_body
    );
    if desc.return_representation {
        sql.push_str(" RETURNING to_jsonb(t) AS row");
    }

    Ok(Statement { sql, params })
}

/// `DELETE FROM ... WHERE ...`; rejects zero filters. Always returns the
/// deleted rows (the response shape for deletes is a row array).
pub fn build_delete(desc: &QueryDescriptor) -> Result<Statement> {
    if desc.filters.is_empty() {
        return Err(GatewayError::validation(
            "delete requires at least one filter",
        ));
    }

    let table = ident(&desc.table)?;
    let mut next = 1;
    let (where_body, params) = build_where(desc, &mut next)?;

    let sql = format!(
        "DELETE FROM {} AS t WHERE {} RETURNING to_jsonb(t) AS row",
        table, where_body
    );

    Ok(Statement { sql, params })
}

/// Named-argument call against a registered routine.
///
/// The function name must appear in `allowed`; caller-supplied names never
/// reach the SQL text without passing the registry and the identifier
/// chokepoint. Argument values bind according to their JSON type.
pub fn build_rpc(
    function: &str,
    args: &serde_json::Map<String, Value>,
    allowed: &[String],
) -> Result<Statement> {
    if !allowed.iter().any(|f| f == function) {
        return Err(GatewayError::validation(format!(
            "function '{}' is not registered for RPC",
            function
        )));
    }
    let name = ident(function)?;

    let mut params = Vec::new();
    let mut named = Vec::new();
    for (i, (arg, value)) in args.iter().enumerate() {
        named.push(format!("{} := ${}", ident(arg)?, i + 1));
        params.push(BindValue::from_json(value));
    }

    let sql = format!(
        "SELECT to_jsonb(r) AS row FROM {}({}) AS r",
        name,
        named.join(", ")
    );

    Ok(Statement { sql, params })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Filter, OrderDirection};
    use serde_json::json;

    fn desc_with_filters(filters: Vec<Filter>) -> QueryDescriptor {
        let mut desc = QueryDescriptor::new("students");
        desc.filters = filters;
        desc
    }

    fn text_filter(column: &str, op: FilterOp, value: &str) -> Filter {
        Filter::new(column, op, FilterValue::Text(value.to_string()))
    }

    fn obj(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    // =========================================================================
    // build_select Tests
    // =========================================================================

    #[test]
    fn test_select_star_no_filters() {
        let stmt = build_select(&QueryDescriptor::new("students")).unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM \"students\"");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_select_projection() {
        let mut desc = QueryDescriptor::new("students");
        desc.select = Some("id,student_name".to_string());
        let stmt = build_select(&desc).unwrap();
        assert_eq!(stmt.sql, "SELECT \"id\", \"student_name\" FROM \"students\"");
    }

    #[test]
    fn test_select_projection_rejects_bad_column() {
        let mut desc = QueryDescriptor::new("students");
        desc.select = Some("id,name; DROP TABLE students".to_string());
        assert!(build_select(&desc).is_err());
    }

    #[test]
    fn test_select_value_is_bound_not_inlined() {
        let desc = desc_with_filters(vec![text_filter("grade_level", FilterOp::Eq, "Grade 5")]);
        let stmt = build_select(&desc).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM \"students\" WHERE \"grade_level\"::text = $1::text"
        );
        assert!(!stmt.sql.contains("Grade 5"));
        assert_eq!(stmt.params, vec![BindValue::Text("Grade 5".to_string())]);
    }

    #[test]
    fn test_select_all_comparison_operators() {
        for (op, token) in [
            (FilterOp::Eq, "="),
            (FilterOp::Neq, "!="),
            (FilterOp::Gt, ">"),
            (FilterOp::Gte, ">="),
            (FilterOp::Lt, "<"),
            (FilterOp::Lte, "<="),
            (FilterOp::Like, "LIKE"),
            (FilterOp::Ilike, "ILIKE"),
        ] {
            let desc = desc_with_filters(vec![text_filter("score", op, "90")]);
            let stmt = build_select(&desc).unwrap();
            assert!(
                stmt.sql
                    .contains(&format!("\"score\"::text {} $1::text", token)),
                "missing operator {} in: {}",
                token,
                stmt.sql
            );
            assert_eq!(stmt.params.len(), 1);
        }
    }

    #[test]
    fn test_select_filters_are_anded_in_order() {
        let desc = desc_with_filters(vec![
            text_filter("grade_level", FilterOp::Eq, "Grade 5"),
            text_filter("score", FilterOp::Gte, "60"),
        ]);
        let stmt = build_select(&desc).unwrap();
        assert!(stmt.sql.contains(
            "\"grade_level\"::text = $1::text AND \"score\"::text >= $2::text"
        ));
        assert_eq!(
            stmt.params,
            vec![
                BindValue::Text("Grade 5".to_string()),
                BindValue::Text("60".to_string())
            ]
        );
    }

    #[test]
    fn test_select_in_arity() {
        let desc = desc_with_filters(vec![Filter::new(
            "grade_level",
            FilterOp::In,
            FilterValue::Set(vec!["a".to_string(), "b".to_string(), "c".to_string()]),
        )]);
        let stmt = build_select(&desc).unwrap();
        assert!(stmt.sql.contains("\"grade_level\"::text IN ($1::text, $2::text, $3::text)"));
        assert_eq!(stmt.params.len(), 3);
    }

    #[test]
    fn test_select_in_empty_set_matches_nothing() {
        let desc = desc_with_filters(vec![Filter::new(
            "grade_level",
            FilterOp::In,
            FilterValue::Set(Vec::new()),
        )]);
        let stmt = build_select(&desc).unwrap();
        assert!(stmt.sql.contains("WHERE FALSE"));
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_select_is_null_no_params() {
        let desc = desc_with_filters(vec![Filter::new("email", FilterOp::Is, FilterValue::Null)]);
        let stmt = build_select(&desc).unwrap();
        assert!(stmt.sql.contains("\"email\" IS NULL"));
        assert!(stmt.params.is_empty());

        let desc = desc_with_filters(vec![Filter::new(
            "email",
            FilterOp::Is,
            FilterValue::NotNull,
        )]);
        let stmt = build_select(&desc).unwrap();
        assert!(stmt.sql.contains("\"email\" IS NOT NULL"));
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_select_in_with_text_value_rejected() {
        // A hand-built descriptor can pair In with a scalar value; that is
        // a validation error, never a panic
        let desc = desc_with_filters(vec![Filter::new(
            "grade_level",
            FilterOp::In,
            FilterValue::Text("Grade 5".to_string()),
        )]);
        let err = build_select(&desc).unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert!(err.to_string().contains("mismatched"));
    }

    #[test]
    fn test_select_mismatched_operator_value_rejected() {
        let desc = desc_with_filters(vec![Filter::new(
            "email",
            FilterOp::Is,
            FilterValue::Text("null".to_string()),
        )]);
        assert_eq!(build_select(&desc).unwrap_err().http_status(), 400);

        let desc = desc_with_filters(vec![Filter::new(
            "grade_level",
            FilterOp::Eq,
            FilterValue::Set(vec!["a".to_string()]),
        )]);
        assert_eq!(build_select(&desc).unwrap_err().http_status(), 400);
    }

    #[test]
    fn test_select_order_limit_offset() {
        let mut desc = desc_with_filters(vec![text_filter("grade_level", FilterOp::Eq, "Grade 5")]);
        desc.order = Some(("student_name".to_string(), OrderDirection::Asc));
        desc.limit = Some(25);
        desc.offset = Some(50);

        let stmt = build_select(&desc).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM \"students\" WHERE \"grade_level\"::text = $1::text \
             ORDER BY \"student_name\" ASC LIMIT $2 OFFSET $3"
        );
        assert_eq!(
            stmt.params,
            vec![
                BindValue::Text("Grade 5".to_string()),
                BindValue::Int(25),
                BindValue::Int(50)
            ]
        );
    }

    #[test]
    fn test_select_order_desc() {
        let mut desc = QueryDescriptor::new("students");
        desc.order = Some(("score".to_string(), OrderDirection::Desc));
        let stmt = build_select(&desc).unwrap();
        assert!(stmt.sql.ends_with("ORDER BY \"score\" DESC"));
    }

    #[test]
    fn test_select_rejects_bad_table() {
        let desc = QueryDescriptor::new("students; DROP TABLE students");
        assert!(build_select(&desc).is_err());
    }

    #[test]
    fn test_select_rejects_bad_order_column() {
        let mut desc = QueryDescriptor::new("students");
        desc.order = Some(("name\"; --".to_string(), OrderDirection::Asc));
        assert!(build_select(&desc).is_err());
    }

    // =========================================================================
    // build_count Tests
    // =========================================================================

    #[test]
    fn test_count_shares_where_only() {
        let mut desc = desc_with_filters(vec![text_filter("grade_level", FilterOp::Eq, "Grade 5")]);
        desc.order = Some(("student_name".to_string(), OrderDirection::Asc));
        desc.limit = Some(25);
        desc.select = Some("id".to_string());

        let stmt = build_count(&desc).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT COUNT(*) FROM \"students\" WHERE \"grade_level\"::text = $1::text"
        );
        assert_eq!(stmt.params.len(), 1);
    }

    // =========================================================================
    // build_insert Tests
    // =========================================================================

    #[test]
    fn test_insert_single() {
        let mut desc = QueryDescriptor::new("classes");
        desc.return_representation = true;
        let row = obj(json!({"grade_level": "Grade 5", "name": "Math 101"}));
        let stmts = build_insert(&desc, &[&row]).unwrap();

        assert_eq!(stmts.len(), 1);
        assert_eq!(
            stmts[0].sql,
            "INSERT INTO \"classes\" AS t (\"grade_level\", \"name\") VALUES ($1, $2) \
             RETURNING to_jsonb(t) AS row"
        );
        assert_eq!(stmts[0].params.len(), 2);
        assert!(!stmts[0].sql.contains("Math 101"));
    }

    #[test]
    fn test_insert_batch_one_statement_per_record() {
        let desc = QueryDescriptor::new("classes");
        let a = obj(json!({"name": "Math"}));
        let b = obj(json!({"name": "Science"}));
        let stmts = build_insert(&desc, &[&a, &b]).unwrap();
        assert_eq!(stmts.len(), 2);
        assert!(!stmts[0].sql.contains("RETURNING"));
    }

    #[test]
    fn test_insert_empty_record_rejected() {
        let desc = QueryDescriptor::new("classes");
        let row = obj(json!({}));
        assert!(build_insert(&desc, &[&row]).is_err());
    }

    #[test]
    fn test_insert_typed_params() {
        let desc = QueryDescriptor::new("classes");
        let row = obj(json!({"capacity": 30, "name": "Math", "open": true, "room": null}));
        let stmts = build_insert(&desc, &[&row]).unwrap();
        assert_eq!(
            stmts[0].params,
            vec![
                BindValue::Int(30),
                BindValue::Text("Math".to_string()),
                BindValue::Bool(true),
                BindValue::Null
            ]
        );
    }

    #[test]
    fn test_upsert_do_update() {
        let mut desc = QueryDescriptor::new("students");
        desc.on_conflict = vec!["email".to_string()];
        let row = obj(json!({"email": "a@school.edu", "student_name": "Ana"}));
        let stmts = build_insert(&desc, &[&row]).unwrap();
        assert!(stmts[0].sql.contains(
            "ON CONFLICT (\"email\") DO UPDATE SET \"student_name\" = EXCLUDED.\"student_name\""
        ));
    }

    #[test]
    fn test_upsert_all_conflict_columns_do_nothing() {
        let mut desc = QueryDescriptor::new("students");
        desc.on_conflict = vec!["email".to_string()];
        let row = obj(json!({"email": "a@school.edu"}));
        let stmts = build_insert(&desc, &[&row]).unwrap();
        assert!(stmts[0].sql.contains("ON CONFLICT (\"email\") DO NOTHING"));
        assert!(!stmts[0].sql.contains("DO UPDATE"));
    }

    #[test]
    fn test_insert_rejects_bad_column() {
        let desc = QueryDescriptor::new("classes");
        let row = obj(json!({"name\"; --": "x"}));
        assert!(build_insert(&desc, &[&row]).is_err());
    }

    // =========================================================================
    // build_update Tests
    // =========================================================================

    #[test]
    fn test_update_set_params_precede_where_params() {
        let mut desc = desc_with_filters(vec![text_filter("id", FilterOp::Eq, "7")]);
        desc.return_representation = false;
        let patch = obj(json!({"score": 95, "student_name": "Ana"}));
        let stmt = build_update(&desc, &patch).unwrap();

        assert_eq!(
            stmt.sql,
            "UPDATE \"students\" AS t SET \"score\" = $1, \"student_name\" = $2 \
             WHERE \"id\"::text = $3::text"
        );
        assert_eq!(
            stmt.params,
            vec![
                BindValue::Int(95),
                BindValue::Text("Ana".to_string()),
                BindValue::Text("7".to_string())
            ]
        );
    }

    #[test]
    fn test_update_with_representation() {
        let mut desc = desc_with_filters(vec![text_filter("id", FilterOp::Eq, "7")]);
        desc.return_representation = true;
        let patch = obj(json!({"score": 95}));
        let stmt = build_update(&desc, &patch).unwrap();
        assert!(stmt.sql.ends_with("RETURNING to_jsonb(t) AS row"));
    }

    #[test]
    fn test_update_zero_filters_rejected() {
        let desc = QueryDescriptor::new("students");
        let patch = obj(json!({"score": 95}));
        let err = build_update(&desc, &patch).unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn test_update_empty_patch_rejected() {
        let desc = desc_with_filters(vec![text_filter("id", FilterOp::Eq, "7")]);
        assert!(build_update(&desc, &obj(json!({}))).is_err());
    }

    // =========================================================================
    // build_delete Tests
    // =========================================================================

    #[test]
    fn test_delete_returns_rows() {
        let desc = desc_with_filters(vec![text_filter("id", FilterOp::Eq, "7")]);
        let stmt = build_delete(&desc).unwrap();
        assert_eq!(
            stmt.sql,
            "DELETE FROM \"students\" AS t WHERE \"id\"::text = $1::text \
             RETURNING to_jsonb(t) AS row"
        );
    }

    #[test]
    fn test_delete_zero_filters_rejected() {
        let err = build_delete(&QueryDescriptor::new("students")).unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    // =========================================================================
    // build_rpc Tests
    // =========================================================================

    fn registry(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rpc_named_arguments() {
        let args = obj(json!({"class_id": 3, "student": "Ana"}));
        let stmt = build_rpc("enroll_student", &args, &registry(&["enroll_student"])).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT to_jsonb(r) AS row FROM \"enroll_student\"(\"class_id\" := $1, \"student\" := $2) AS r"
        );
        assert_eq!(
            stmt.params,
            vec![BindValue::Int(3), BindValue::Text("Ana".to_string())]
        );
    }

    #[test]
    fn test_rpc_no_arguments() {
        let args = obj(json!({}));
        let stmt = build_rpc("class_roster", &args, &registry(&["class_roster"])).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT to_jsonb(r) AS row FROM \"class_roster\"() AS r"
        );
    }

    #[test]
    fn test_rpc_unregistered_function_rejected() {
        let args = obj(json!({}));
        let err = build_rpc("pg_sleep", &args, &registry(&["class_roster"])).unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn test_rpc_bad_argument_name_rejected() {
        let args = obj(json!({"a\" := 1); DROP TABLE x; --": 1}));
        assert!(build_rpc("class_roster", &args, &registry(&["class_roster"])).is_err());
    }

    // =========================================================================
    // BindValue Tests
    // =========================================================================

    #[test]
    fn test_bind_value_from_json() {
        assert_eq!(BindValue::from_json(&json!(null)), BindValue::Null);
        assert_eq!(BindValue::from_json(&json!(true)), BindValue::Bool(true));
        assert_eq!(BindValue::from_json(&json!(42)), BindValue::Int(42));
        assert_eq!(BindValue::from_json(&json!(1.5)), BindValue::Float(1.5));
        assert_eq!(
            BindValue::from_json(&json!("x")),
            BindValue::Text("x".to_string())
        );
        assert_eq!(
            BindValue::from_json(&json!({"a": 1})),
            BindValue::Json(json!({"a": 1}))
        );
    }
}
