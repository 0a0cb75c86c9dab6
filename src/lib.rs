//! # tabrest
//!
//! A table-generic REST-to-SQL gateway for PostgreSQL.
//!
//! This crate translates a small query-string grammar (`column=eq.value`,
//! `order=name.asc`, `limit=25`, ...) into parameterized SQL and executes it
//! against an ambient relational schema it treats opaquely. A matching
//! chainable client builder produces the same grammar, so client and server
//! can never drift apart.
//!
//! ## Features
//!
//! - **Filter grammar**: `eq`, `neq`, `gt`, `gte`, `lt`, `lte`, `like`,
//!   `ilike`, `in`, `is` predicates, ANDed per request
//! - **Projection, ordering, pagination**: `select`, `order`, `limit`,
//!   `offset` reserved keys
//! - **Upsert**: `ON CONFLICT ... DO UPDATE / DO NOTHING` keyed by an
//!   `on_conflict` column set
//! - **Exact counts**: `Prefer: count=exact` yields a
//!   `Content-Range: start-end/total` header; `head=true` returns the count
//!   alone
//! - **RPC**: named-argument calls against an explicit allow-list of
//!   registered routines
//! - **SQL injection prevention**: all identifiers are validated and quoted
//!   through one chokepoint; values are always bound parameters
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tabrest::{Client, Gateway, GatewayConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GatewayConfig::builder("postgres://localhost/school")
//!         .max_limit(1000)
//!         .register_rpc("class_roster")
//!         .build();
//!     let gateway = Gateway::new(config).await?;
//!
//!     let client = Client::new("/rest/v1");
//!     let result = client
//!         .from("students")
//!         .eq("grade_level", "Grade 5")
//!         .order("student_name")
//!         .limit(25)
//!         .execute(&gateway)
//!         .await;
//!
//!     if let Some(error) = result.error {
//!         eprintln!("query failed: {}", error);
//!     } else {
//!         println!("{:?}", result.data);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## HTTP surface
//!
//! The `http` module exposes the same operations as actix-web routes under
//! `/rest/v1`; see `configure_routes`. The binary in `src/main.rs` wires a
//! pool and the routes into a server configured from the environment.
//!
//! ## Consistency
//!
//! A request issues at most two independent statements (rows + count) with
//! no shared snapshot; under concurrent writes the count can disagree with
//! the page. Each request builds a fresh `QueryDescriptor`; nothing is
//! cached across requests.

pub mod client;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod gateway;
pub mod http;
pub mod params;
pub mod sql;

// Re-export main types for convenience
pub use client::{Client, QueryResult, RequestParts, TableQuery};
pub use config::{GatewayConfig, GatewayConfigBuilder};
pub use descriptor::{Filter, FilterOp, FilterValue, OrderDirection, QueryDescriptor};
pub use error::{GatewayError, Result};
pub use gateway::{Gateway, SelectResult, WriteOutcome};
pub use params::parse_query;

// Re-export SQL utilities for advanced users
pub use sql::build::{BindValue, Statement};
pub use sql::sanitize::{quote_identifier, safe_identifier, validate_identifier};
