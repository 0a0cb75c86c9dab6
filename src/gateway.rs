//! Query execution gateway
//!
//! Executes built statements against a shared connection pool and shapes the
//! responses. Tables are opaque to the gateway; every row comes back as
//! `to_jsonb` of the matched record, so no per-table types exist anywhere in
//! this crate.
//!
//! Each request issues one statement, or two when an exact count is
//! requested. The pair is not wrapped in a transaction, so the count can race
//! concurrent writes; that is accepted for pagination display.

use sqlx::{PgPool, Row};

use crate::config::GatewayConfig;
use crate::descriptor::QueryDescriptor;
use crate::error::{GatewayError, Result};
use crate::sql::build::{
    BindValue, Statement, build_count, build_delete, build_insert, build_rpc, build_select,
    build_update,
};

/// Rows plus optional count metadata for a select
#[derive(Debug, Clone, serde::Serialize)]
pub struct SelectResult {
    pub rows: Vec<serde_json::Value>,
    /// Exact total matching the filter clause, when requested
    pub total: Option<i64>,
    /// `start-end/total` range, when an exact count was requested
    pub content_range: Option<String>,
}

/// Result of an insert or update
#[derive(Debug, Clone)]
pub enum WriteOutcome {
    /// Affected rows, echoed back (`Prefer: return=representation`)
    Representation(serde_json::Value),
    /// Lightweight acknowledgement; `count` is set for updates
    Ack { count: Option<u64> },
}

/// Bind one `BindValue` onto a sqlx query. A macro because `Query` and
/// `QueryAs` share `.bind()` without a common trait.
macro_rules! bind_value {
    ($query:expr, $param:expr) => {
        match $param {
            BindValue::Text(s) => $query.bind(s.clone()),
            BindValue::Int(i) => $query.bind(*i),
            BindValue::Float(f) => $query.bind(*f),
            BindValue::Bool(b) => $query.bind(*b),
            BindValue::Null => $query.bind(None::<String>),
            BindValue::Json(v) => $query.bind(v.clone()),
        }
    };
}

/// REST-to-SQL execution gateway over a shared `PgPool`
#[derive(Clone)]
pub struct Gateway {
    pool: PgPool,
    config: GatewayConfig,
}

impl Gateway {
    /// Connect to the configured database and create a gateway
    pub async fn new(config: GatewayConfig) -> Result<Self> {
        let pool = PgPool::connect(&config.database_url)
            .await
            .map_err(|e| GatewayError::connection(format!("Database connection failed: {}", e)))?;
        Ok(Self { pool, config })
    }

    /// Create a gateway from an existing pool
    pub fn from_pool(pool: PgPool, config: GatewayConfig) -> Self {
        Self { pool, config }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Execute a select described by `desc`.
    ///
    /// `head` mode runs only the count query. `count_exact` runs the count
    /// alongside the row query and attaches a `start-end/total` range.
    pub async fn select(&self, desc: &QueryDescriptor) -> Result<SelectResult> {
        let mut desc = desc.clone();
        self.apply_limits(&mut desc);

        let total = if desc.count_exact || desc.head {
            let stmt = build_count(&desc)?;
            Some(self.fetch_count(&stmt).await?)
        } else {
            None
        };

        if desc.head {
            return Ok(SelectResult {
                rows: Vec::new(),
                total,
                content_range: None,
            });
        }

        let stmt = build_select(&desc)?;
        // Ordering and pagination stay inside the subquery; the wrapper only
        // converts each matched record to jsonb.
        let wrapped = format!("SELECT to_jsonb(t) AS row FROM ({}) AS t", stmt.sql);
        let rows = self.fetch_rows(&wrapped, &stmt.params).await?;

        let content_range =
            total.map(|t| content_range(desc.offset.unwrap_or(0), rows.len(), t));

        Ok(SelectResult {
            rows,
            total,
            content_range,
        })
    }

    /// Insert one record or a batch. The response mirrors the input shape
    /// when representation is requested: object in, object out.
    pub async fn insert(
        &self,
        desc: &QueryDescriptor,
        body: &serde_json::Value,
    ) -> Result<WriteOutcome> {
        let records = collect_records(body)?;
        let stmts = build_insert(desc, &records)?;

        if desc.return_representation {
            let mut returned = Vec::new();
            for stmt in &stmts {
                returned.extend(self.fetch_rows(&stmt.sql, &stmt.params).await?);
            }
            let data = if body.is_object() {
                returned.into_iter().next().unwrap_or(serde_json::Value::Null)
            } else {
                serde_json::Value::Array(returned)
            };
            Ok(WriteOutcome::Representation(data))
        } else {
            for stmt in &stmts {
                self.execute(&stmt.sql, &stmt.params).await?;
            }
            Ok(WriteOutcome::Ack { count: None })
        }
    }

    /// Update rows matching the descriptor's filters. A descriptor with zero
    /// filters is rejected before any SQL is issued.
    pub async fn update(
        &self,
        desc: &QueryDescriptor,
        patch: &serde_json::Value,
    ) -> Result<WriteOutcome> {
        let patch = patch
            .as_object()
            .ok_or_else(|| GatewayError::validation("update body must be a JSON object"))?;
        let stmt = build_update(desc, patch)?;

        if desc.return_representation {
            let rows = self.fetch_rows(&stmt.sql, &stmt.params).await?;
            Ok(WriteOutcome::Representation(serde_json::Value::Array(rows)))
        } else {
            let count = self.execute(&stmt.sql, &stmt.params).await?;
            Ok(WriteOutcome::Ack { count: Some(count) })
        }
    }

    /// Delete rows matching the descriptor's filters and return them. Zero
    /// filters is rejected; zero matches returns an empty array, not an
    /// error.
    pub async fn delete(&self, desc: &QueryDescriptor) -> Result<Vec<serde_json::Value>> {
        let stmt = build_delete(desc)?;
        self.fetch_rows(&stmt.sql, &stmt.params).await
    }

    /// Invoke a registered routine with named JSON arguments
    pub async fn rpc(
        &self,
        function: &str,
        args: &serde_json::Value,
    ) -> Result<Vec<serde_json::Value>> {
        let args = args
            .as_object()
            .ok_or_else(|| GatewayError::validation("rpc body must be a JSON object"))?;
        let stmt = build_rpc(function, args, &self.config.rpc_routines)?;
        self.fetch_rows(&stmt.sql, &stmt.params).await
    }

    fn apply_limits(&self, desc: &mut QueryDescriptor) {
        if desc.limit.is_none() {
            desc.limit = self.config.default_limit;
        }
        if let (Some(limit), Some(max)) = (desc.limit, self.config.max_limit) {
            desc.limit = Some(limit.min(max));
        }
    }

    async fn fetch_rows(
        &self,
        sql: &str,
        params: &[BindValue],
    ) -> Result<Vec<serde_json::Value>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_value!(query, param);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get::<serde_json::Value, _>("row").map_err(Into::into))
            .collect()
    }

    async fn fetch_count(&self, stmt: &Statement) -> Result<i64> {
        let mut query = sqlx::query_as::<_, (i64,)>(&stmt.sql);
        for param in &stmt.params {
            query = bind_value!(query, param);
        }
        let (count,) = query.fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn execute(&self, sql: &str, params: &[BindValue]) -> Result<u64> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_value!(query, param);
        }
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

/// Insert bodies are one object or an array of objects
fn collect_records(body: &serde_json::Value) -> Result<Vec<&serde_json::Map<String, serde_json::Value>>> {
    match body {
        serde_json::Value::Object(record) => Ok(vec![record]),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_object().ok_or_else(|| {
                    GatewayError::validation("insert array entries must be JSON objects")
                })
            })
            .collect(),
        _ => Err(GatewayError::validation(
            "insert body must be a JSON object or an array of objects",
        )),
    }
}

/// `Content-Range` value: `start-end/total`, or `*/total` when the page is
/// empty
fn content_range(start: i64, page_len: usize, total: i64) -> String {
    if page_len == 0 {
        format!("*/{}", total)
    } else {
        format!("{}-{}/{}", start, start + page_len as i64 - 1, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_range_basic() {
        assert_eq!(content_range(0, 25, 112), "0-24/112");
        assert_eq!(content_range(50, 25, 112), "50-74/112");
        assert_eq!(content_range(100, 12, 112), "100-111/112");
    }

    #[test]
    fn test_content_range_empty_page() {
        assert_eq!(content_range(200, 0, 112), "*/112");
        assert_eq!(content_range(0, 0, 0), "*/0");
    }

    #[test]
    fn test_collect_records_object() {
        let body = json!({"name": "Math 101"});
        let records = collect_records(&body).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_collect_records_array() {
        let body = json!([{"name": "Math"}, {"name": "Science"}]);
        let records = collect_records(&body).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_collect_records_rejects_scalar() {
        assert!(collect_records(&json!("nope")).is_err());
        assert!(collect_records(&json!(42)).is_err());
        assert!(collect_records(&json!([1, 2])).is_err());
    }
}
