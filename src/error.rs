//! Error types for gateway operations

use thiserror::Error;

/// Errors that can occur while translating or executing a query
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// HTTP status code this error maps to.
    ///
    /// Grammar and validation failures are client errors; everything the
    /// engine rejects surfaces as a 500 with the engine message attached.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Json(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Sql(_) | Self::Connection(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
