//! HTTP surface
//!
//! Table-generic REST endpoints under `/rest/v1`:
//!
//! - `GET /rest/v1/{table}` - select with the query-string filter grammar
//! - `POST /rest/v1/{table}` - insert one record or an array; `Prefer:
//!   resolution=merge-duplicates` plus `?on_conflict=...` turns it into an
//!   upsert
//! - `PATCH /rest/v1/{table}` - update matching filters (rejected with no
//!   filters)
//! - `DELETE /rest/v1/{table}` - delete matching filters (rejected with no
//!   filters)
//! - `POST /rest/v1/rpc/{function}` - invoke a registered routine
//! - `GET /rest/v1/health` - health check
//!
//! Errors always use one envelope shape: `{"error": {"message": "..."}}`.

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError, delete, get, patch, post, web};
use serde_json::json;

use crate::error::GatewayError;
use crate::gateway::{Gateway, WriteOutcome};
use crate::params::parse_query;

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        log::warn!("request rejected: {}", self);
        HttpResponse::build(self.status_code()).json(json!({
            "error": { "message": self.to_string() }
        }))
    }
}

/// Parsed `Prefer` request header tokens
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Prefer {
    count_exact: bool,
    representation: bool,
    merge_duplicates: bool,
}

fn prefer(req: &HttpRequest) -> Prefer {
    let mut parsed = Prefer::default();
    for value in req.headers().get_all("prefer") {
        let Ok(value) = value.to_str() else { continue };
        for token in value.split(',') {
            match token.trim() {
                "count=exact" => parsed.count_exact = true,
                "return=representation" => parsed.representation = true,
                "resolution=merge-duplicates" => parsed.merge_duplicates = true,
                _ => {}
            }
        }
    }
    parsed
}

/// Register all gateway routes. The RPC route is registered before the
/// table routes so `rpc` is never treated as a table name.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/rest/v1")
            .route("/health", web::get().to(health))
            .service(invoke_rpc)
            .service(select_rows)
            .service(insert_rows)
            .service(update_rows)
            .service(delete_rows),
    );
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[get("/{table}")]
async fn select_rows(
    gateway: web::Data<Gateway>,
    table: web::Path<String>,
    query: web::Query<Vec<(String, String)>>,
    req: HttpRequest,
) -> Result<HttpResponse, GatewayError> {
    let pairs = query.into_inner();
    let mut desc = parse_query(&table, &pairs)?;
    desc.count_exact = prefer(&req).count_exact;

    let result = gateway.select(&desc).await?;

    if desc.head {
        return Ok(HttpResponse::Ok().json(json!({ "count": result.total })));
    }

    let mut response = HttpResponse::Ok();
    if let Some(range) = &result.content_range {
        response.insert_header(("Content-Range", range.as_str()));
    }
    Ok(response.json(&result.rows))
}

#[post("/{table}")]
async fn insert_rows(
    gateway: web::Data<Gateway>,
    table: web::Path<String>,
    query: web::Query<Vec<(String, String)>>,
    body: web::Json<serde_json::Value>,
    req: HttpRequest,
) -> Result<HttpResponse, GatewayError> {
    let pairs = query.into_inner();
    let preferred = prefer(&req);

    let mut desc = parse_query(&table, &pairs)?;
    desc.return_representation = preferred.representation;
    // on_conflict only takes effect under merge-duplicates resolution
    if !preferred.merge_duplicates {
        desc.on_conflict.clear();
    }

    match gateway.insert(&desc, &body).await? {
        WriteOutcome::Representation(data) => Ok(HttpResponse::Created().json(data)),
        WriteOutcome::Ack { .. } => Ok(HttpResponse::Created().json(json!({ "success": true }))),
    }
}

#[patch("/{table}")]
async fn update_rows(
    gateway: web::Data<Gateway>,
    table: web::Path<String>,
    query: web::Query<Vec<(String, String)>>,
    body: web::Json<serde_json::Value>,
    req: HttpRequest,
) -> Result<HttpResponse, GatewayError> {
    let pairs = query.into_inner();
    let mut desc = parse_query(&table, &pairs)?;
    desc.return_representation = prefer(&req).representation;

    match gateway.update(&desc, &body).await? {
        WriteOutcome::Representation(data) => Ok(HttpResponse::Ok().json(data)),
        WriteOutcome::Ack { count } => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "count": count,
        }))),
    }
}

#[delete("/{table}")]
async fn delete_rows(
    gateway: web::Data<Gateway>,
    table: web::Path<String>,
    query: web::Query<Vec<(String, String)>>,
) -> Result<HttpResponse, GatewayError> {
    let pairs = query.into_inner();
    let desc = parse_query(&table, &pairs)?;
    let rows = gateway.delete(&desc).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[post("/rpc/{function}")]
async fn invoke_rpc(
    gateway: web::Data<Gateway>,
    function: web::Path<String>,
    body: web::Json<serde_json::Value>,
) -> Result<HttpResponse, GatewayError> {
    let rows = gateway.rpc(&function, &body).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::test::TestRequest;

    // =========================================================================
    // Prefer Header Tests
    // =========================================================================

    #[test]
    fn test_prefer_empty() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(prefer(&req), Prefer::default());
    }

    #[test]
    fn test_prefer_single_token() {
        let req = TestRequest::default()
            .insert_header(("Prefer", "count=exact"))
            .to_http_request();
        let p = prefer(&req);
        assert!(p.count_exact);
        assert!(!p.representation);
    }

    #[test]
    fn test_prefer_combined_tokens() {
        let req = TestRequest::default()
            .insert_header(("Prefer", "return=representation, resolution=merge-duplicates"))
            .to_http_request();
        let p = prefer(&req);
        assert!(p.representation);
        assert!(p.merge_duplicates);
        assert!(!p.count_exact);
    }

    #[test]
    fn test_prefer_unknown_tokens_ignored() {
        let req = TestRequest::default()
            .insert_header(("Prefer", "wait=60, count=exact"))
            .to_http_request();
        assert!(prefer(&req).count_exact);
    }

    // =========================================================================
    // Error Envelope Tests
    // =========================================================================

    #[actix_web::test]
    async fn test_validation_error_envelope() {
        let err = GatewayError::validation("limit must be a non-negative integer, got 'lots'");
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(
            body["error"]["message"]
                .as_str()
                .unwrap()
                .contains("limit must be a non-negative integer")
        );
    }

    #[actix_web::test]
    async fn test_unauthorized_error_envelope() {
        let err = GatewayError::unauthorized("missing bearer token");
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
