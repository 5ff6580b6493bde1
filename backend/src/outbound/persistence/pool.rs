//! Connection settings shared by every per-database pool.

use std::fmt;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use zeroize::Zeroizing;

const DEFAULT_SCHEMA: &str = "dbo";

/// Server coordinates and pool limits.
///
/// Only the database name differs between pools; everything else is shared.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use hybrid_engine::outbound::persistence::PgPoolConfig;
///
/// let config = PgPoolConfig::new("db.internal", 5432, "engine", "secret")
///     .with_max_connections(20)
///     .with_statement_timeout(Duration::from_secs(15));
/// assert_eq!(config.schema(), "dbo");
/// ```
#[derive(Clone)]
pub struct PgPoolConfig {
    host: String,
    port: u16,
    user: String,
    password: Zeroizing<String>,
    schema: String,
    max_connections: u32,
    min_connections: u32,
    acquire_timeout: Duration,
    idle_timeout: Duration,
    statement_timeout: Duration,
}

impl fmt::Debug for PgPoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgPoolConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("schema", &self.schema)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("idle_timeout", &self.idle_timeout)
            .field("statement_timeout", &self.statement_timeout)
            .finish()
    }
}

impl PgPoolConfig {
    /// Create a configuration with defaults:
    /// - schema `dbo`
    /// - 10 connections max, none kept idle
    /// - 5 s acquire timeout, 30 s idle timeout, 30 s statement timeout
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: Zeroizing::new(password.into()),
            schema: DEFAULT_SCHEMA.to_owned(),
            max_connections: 10,
            min_connections: 0,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(30),
            statement_timeout: Duration::from_secs(30),
        }
    }

    /// Schema used for procedure names without one.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn with_min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// How long a call waits for a free connection.
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Server-side limit applied to every statement.
    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Connection options for `database`.
    pub fn connect_options(&self, database: &str) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(self.password.as_str())
            .database(database)
            .application_name("hybrid-engine")
            .options([(
                "statement_timeout",
                format!("{}ms", self.statement_timeout.as_millis()),
            )])
    }

    /// Pool limits shared by every database.
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections.min(self.max_connections))
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(Some(self.idle_timeout))
    }
}
