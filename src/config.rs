//! Configuration for the gateway
//!
//! Provides a builder pattern for configuring the REST-to-SQL gateway.

/// Configuration for the gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// PostgreSQL database URL
    pub database_url: String,
    /// Limit applied when a request specifies none (None = unlimited)
    pub default_limit: Option<i64>,
    /// Hard cap on any requested limit (None = uncapped)
    pub max_limit: Option<i64>,
    /// Allow-list of server-side routines callable through the RPC endpoint.
    /// A function name not in this list is rejected before any SQL is built.
    pub rpc_routines: Vec<String>,
}

impl GatewayConfig {
    /// Create a new configuration builder
    pub fn builder(database_url: impl Into<String>) -> GatewayConfigBuilder {
        GatewayConfigBuilder::new(database_url)
    }

    /// Whether `function` is a registered RPC routine
    pub fn is_registered_rpc(&self, function: &str) -> bool {
        self.rpc_routines.iter().any(|f| f == function)
    }
}

/// Builder for GatewayConfig
#[derive(Debug)]
pub struct GatewayConfigBuilder {
    database_url: String,
    default_limit: Option<i64>,
    max_limit: Option<i64>,
    rpc_routines: Vec<String>,
}

impl GatewayConfigBuilder {
    /// Create a new builder with the database URL
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            default_limit: None,
            max_limit: None,
            rpc_routines: Vec::new(),
        }
    }

    /// Set the limit applied when a request specifies none
    pub fn default_limit(mut self, limit: i64) -> Self {
        self.default_limit = Some(limit);
        self
    }

    /// Cap every requested limit at this value
    pub fn max_limit(mut self, limit: i64) -> Self {
        self.max_limit = Some(limit);
        self
    }

    /// Register a server-side routine as callable through the RPC endpoint
    pub fn register_rpc(mut self, function: impl Into<String>) -> Self {
        self.rpc_routines.push(function.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> GatewayConfig {
        GatewayConfig {
            database_url: self.database_url,
            default_limit: self.default_limit,
            max_limit: self.max_limit,
            rpc_routines: self.rpc_routines,
        }
    }
}
