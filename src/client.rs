//! Client query builder
//!
//! A chainable builder that mirrors the server's filter grammar exactly, so
//! client code cannot drift from what the parser accepts. The builder is
//! lazy: nothing is serialized until `build()` or `execute()` is called, so
//! chained calls can arrive in any order.
//!
//! Results come back as `{data, error}` values rather than `Err` returns;
//! callers check `error` on every call. `single()` and `maybe_single()`
//! post-process a result set into a zero-or-one-row contract.
//!
//! The grammar deliberately has no `not` operator, so there is no `not()`
//! method; negation is limited to `neq` and `not_null`. Likewise `is` only
//! accepts null tests, exposed as `is_null()` / `not_null()`.

use serde_json::Value;

use crate::gateway::{Gateway, WriteOutcome};
use crate::params::parse_query;

/// Client session state. The bearer token is carried explicitly here, never
/// in process-wide state.
#[derive(Debug, Clone)]
pub struct Client {
    base: String,
    token: Option<String>,
}

impl Client {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            token: None,
        }
    }

    /// Attach a bearer token sent with every request built from this client
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Start a query against a table
    pub fn from(&self, table: impl Into<String>) -> TableQuery {
        TableQuery {
            base: self.base.clone(),
            token: self.token.clone(),
            table: table.into(),
            verb: Verb::Select,
            params: Vec::new(),
            body: None,
            count_exact: false,
            cardinality: Cardinality::Many,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Select,
    Insert,
    Update,
    Upsert,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cardinality {
    Many,
    Single,
    MaybeSingle,
}

/// Serialized request produced by a builder chain
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParts {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Outcome of an executed query. Never a panic or an `Err`: failures land in
/// `error` with `data` left as `None`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct QueryResult {
    pub data: Option<Value>,
    pub error: Option<String>,
    pub count: Option<i64>,
    pub status: u16,
}

impl QueryResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    fn failure(status: u16, message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
            count: None,
            status,
        }
    }
}

/// One pending query against one table
#[derive(Debug, Clone)]
pub struct TableQuery {
    base: String,
    token: Option<String>,
    table: String,
    verb: Verb,
    params: Vec<(String, String)>,
    body: Option<Value>,
    count_exact: bool,
    cardinality: Cardinality,
}

impl TableQuery {
    /// Set or replace a query-string entry; one entry per key, so repeating
    /// a filter on the same column overwrites the earlier one
    fn set_param(mut self, key: &str, value: String) -> Self {
        if let Some(entry) = self.params.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value;
        } else {
            self.params.push((key.to_string(), value));
        }
        self
    }

    fn filter(self, column: &str, prefix: &str, value: &str) -> Self {
        self.set_param(column, format!("{}.{}", prefix, value))
    }

    // -- grammar mirror -------------------------------------------------

    pub fn select(self, columns: &str) -> Self {
        self.set_param("select", columns.to_string())
    }

    pub fn eq(self, column: &str, value: &str) -> Self {
        self.filter(column, "eq", value)
    }

    pub fn neq(self, column: &str, value: &str) -> Self {
        self.filter(column, "neq", value)
    }

    pub fn gt(self, column: &str, value: &str) -> Self {
        self.filter(column, "gt", value)
    }

    pub fn gte(self, column: &str, value: &str) -> Self {
        self.filter(column, "gte", value)
    }

    pub fn lt(self, column: &str, value: &str) -> Self {
        self.filter(column, "lt", value)
    }

    pub fn lte(self, column: &str, value: &str) -> Self {
        self.filter(column, "lte", value)
    }

    pub fn like(self, column: &str, pattern: &str) -> Self {
        self.filter(column, "like", pattern)
    }

    pub fn ilike(self, column: &str, pattern: &str) -> Self {
        self.filter(column, "ilike", pattern)
    }

    /// `in.(a,b,c)` — values must not themselves contain commas (the list
    /// form has no escaping)
    pub fn in_<I, S>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list: Vec<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();
        self.set_param(column, format!("in.({})", list.join(",")))
    }

    pub fn is_null(self, column: &str) -> Self {
        self.set_param(column, "is.null".to_string())
    }

    pub fn not_null(self, column: &str) -> Self {
        self.set_param(column, "is.not.null".to_string())
    }

    pub fn order(self, column: &str) -> Self {
        self.set_param("order", format!("{}.asc", column))
    }

    pub fn order_desc(self, column: &str) -> Self {
        self.set_param("order", format!("{}.desc", column))
    }

    pub fn limit(self, n: i64) -> Self {
        self.set_param("limit", n.to_string())
    }

    /// Inclusive row range; also requests an exact count so the caller can
    /// paginate
    pub fn range(self, from: i64, to: i64) -> Self {
        self.count_exact()
            .set_param("offset", from.to_string())
            .set_param("limit", (to - from + 1).to_string())
    }

    pub fn count_exact(mut self) -> Self {
        self.count_exact = true;
        self
    }

    // -- write verbs ----------------------------------------------------

    pub fn insert(mut self, body: Value) -> Self {
        self.verb = Verb::Insert;
        self.body = Some(body);
        self
    }

    pub fn update(mut self, patch: Value) -> Self {
        self.verb = Verb::Update;
        self.body = Some(patch);
        self
    }

    /// Insert with merge-duplicates resolution keyed on `on_conflict`
    /// (comma-separated column list)
    pub fn upsert(mut self, body: Value, on_conflict: &str) -> Self {
        self.verb = Verb::Upsert;
        self.body = Some(body);
        self.set_param("on_conflict", on_conflict.to_string())
    }

    pub fn delete(mut self) -> Self {
        self.verb = Verb::Delete;
        self
    }

    // -- cardinality ----------------------------------------------------

    /// Require exactly one row; zero or multiple rows becomes an error
    pub fn single(mut self) -> Self {
        self.cardinality = Cardinality::Single;
        self
    }

    /// Zero rows yields `data: None` without an error; multiple rows is
    /// still an error
    pub fn maybe_single(mut self) -> Self {
        self.cardinality = Cardinality::MaybeSingle;
        self
    }

    // -- serialization --------------------------------------------------

    /// Serialize the chain into request parts. This is the only place the
    /// query string, method, headers, and body are assembled.
    pub fn build(&self) -> RequestParts {
        let method = match self.verb {
            Verb::Select => "GET",
            Verb::Insert | Verb::Upsert => "POST",
            Verb::Update => "PATCH",
            Verb::Delete => "DELETE",
        };

        let mut headers = Vec::new();
        if let Some(token) = &self.token {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        let mut prefer = Vec::new();
        if self.count_exact {
            prefer.push("count=exact");
        }
        if matches!(self.verb, Verb::Insert | Verb::Update | Verb::Upsert) {
            prefer.push("return=representation");
        }
        if self.verb == Verb::Upsert {
            prefer.push("resolution=merge-duplicates");
        }
        if !prefer.is_empty() {
            headers.push(("Prefer".to_string(), prefer.join(", ")));
        }

        RequestParts {
            method,
            path: format!("{}/{}", self.base, self.table),
            query: self.params.clone(),
            headers,
            body: self.body.clone(),
        }
    }

    /// Execute in-process against a gateway: serialize, re-parse through the
    /// server grammar, build, run. Returns a `{data, error}` result instead
    /// of propagating errors.
    pub async fn execute(self, gateway: &Gateway) -> QueryResult {
        let parts = self.build();
        let prefer = prefer_tokens(&parts.headers);

        let mut desc = match parse_query(&self.table, &parts.query) {
            Ok(desc) => desc,
            Err(err) => return QueryResult::failure(err.http_status(), err.to_string()),
        };
        desc.count_exact = prefer.iter().any(|t| t == "count=exact");
        desc.return_representation = prefer.iter().any(|t| t == "return=representation");
        if !prefer.iter().any(|t| t == "resolution=merge-duplicates") {
            desc.on_conflict.clear();
        }

        match self.verb {
            Verb::Select => match gateway.select(&desc).await {
                Ok(result) => self.shape_rows(result.rows, result.total),
                Err(err) => QueryResult::failure(err.http_status(), err.to_string()),
            },
            Verb::Insert | Verb::Upsert => {
                let body = match &parts.body {
                    Some(body) => body,
                    None => return QueryResult::failure(400, "insert requires a body"),
                };
                match gateway.insert(&desc, body).await {
                    Ok(outcome) => write_result(outcome),
                    Err(err) => QueryResult::failure(err.http_status(), err.to_string()),
                }
            }
            Verb::Update => {
                let patch = match &parts.body {
                    Some(body) => body,
                    None => return QueryResult::failure(400, "update requires a body"),
                };
                match gateway.update(&desc, patch).await {
                    Ok(outcome) => write_result(outcome),
                    Err(err) => QueryResult::failure(err.http_status(), err.to_string()),
                }
            }
            Verb::Delete => match gateway.delete(&desc).await {
                Ok(rows) => QueryResult {
                    data: Some(Value::Array(rows)),
                    error: None,
                    count: None,
                    status: 200,
                },
                Err(err) => QueryResult::failure(err.http_status(), err.to_string()),
            },
        }
    }

    fn shape_rows(&self, mut rows: Vec<Value>, total: Option<i64>) -> QueryResult {
        let data = match self.cardinality {
            Cardinality::Many => Some(Value::Array(rows)),
            Cardinality::Single => match rows.len() {
                1 => Some(rows.remove(0)),
                n => {
                    return QueryResult::failure(
                        406,
                        format!("expected exactly one row, got {}", n),
                    );
                }
            },
            Cardinality::MaybeSingle => match rows.len() {
                0 => None,
                1 => Some(rows.remove(0)),
                n => {
                    return QueryResult::failure(
                        406,
                        format!("expected at most one row, got {}", n),
                    );
                }
            },
        };
        QueryResult {
            data,
            error: None,
            count: total,
            status: 200,
        }
    }
}

fn prefer_tokens(headers: &[(String, String)]) -> Vec<String> {
    headers
        .iter()
        .filter(|(name, _)| name.eq_ignore_ascii_case("prefer"))
        .flat_map(|(_, value)| value.split(','))
        .map(|token| token.trim().to_string())
        .collect()
}

fn write_result(outcome: WriteOutcome) -> QueryResult {
    match outcome {
        WriteOutcome::Representation(data) => QueryResult {
            data: Some(data),
            error: None,
            count: None,
            status: 200,
        },
        WriteOutcome::Ack { count } => QueryResult {
            data: Some(serde_json::json!({"success": true})),
            error: None,
            count: count.map(|c| c as i64),
            status: 200,
        },
    }
}
