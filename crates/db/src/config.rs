//! Database configuration loading.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::SessionError;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// Load from `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS` and
    /// `DATABASE_ACQUIRE_TIMEOUT_SECS`.
    ///
    /// Returns `None` when `DATABASE_URL` is unset.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let url = lookup("DATABASE_URL").filter(|u| !u.trim().is_empty())?;
        let mut config = Self::new(url);

        if let Some(raw) = lookup("DATABASE_MAX_CONNECTIONS") {
            match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => config.max_connections = n,
                _ => tracing::warn!(
                    value = %raw,
                    default = DEFAULT_MAX_CONNECTIONS,
                    "invalid DATABASE_MAX_CONNECTIONS; using default"
                ),
            }
        }

        if let Some(raw) = lookup("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => config.acquire_timeout = Duration::from_secs(secs),
                Err(_) => tracing::warn!(
                    value = %raw,
                    default_secs = DEFAULT_ACQUIRE_TIMEOUT.as_secs(),
                    "invalid DATABASE_ACQUIRE_TIMEOUT_SECS; using default"
                ),
            }
        }

        Some(config)
    }

    /// Open a connection pool.
    pub async fn connect(&self) -> Result<PgPool, SessionError> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect(&self.url)
            .await
            .map_err(|e| SessionError::Database(format!("failed to connect: {e}")))
    }
}
