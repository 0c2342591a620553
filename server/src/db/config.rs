use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::borrow::Cow;
use std::str::FromStr;
use std::time::Duration;

use crate::config::ConfigError;

/// Database configuration with `Cow` for flexible string handling
#[derive(Debug, Clone)]
pub struct DbConfig<'a> {
    pub url: Cow<'a, str>,
    pub max_connections: u32,
    /// How long a connection waits for another writer's lock
    pub busy_timeout: Duration,
}

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

impl<'a> DbConfig<'a> {
    /// Create new database configuration
    pub fn new(url: impl Into<Cow<'a, str>>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Configuration for a private in-memory database.
    ///
    /// An in-memory SQLite database lives as long as its connection, so the
    /// pool is pinned to a single connection that never expires.
    pub fn in_memory() -> Self {
        Self {
            url: Cow::Borrowed("sqlite::memory:"),
            max_connections: 1,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Set max connections
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set busy timeout
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    fn is_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    /// Open the connection pool described by this configuration
    pub async fn connect(&self) -> Result<SqlitePool, sqlx::Error> {
        let mut options = SqliteConnectOptions::from_str(&self.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout);

        let mut pool = SqlitePoolOptions::new().max_connections(self.max_connections);
        if self.is_memory() {
            pool = pool.idle_timeout(None).max_lifetime(None);
        } else {
            // readers keep going while a writer holds the lock
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        pool.connect_with(options).await
    }

    /// Read configuration from environment variables with fallback
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://care_registry.db".to_string());
        let max_connections = match std::env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "DB_MAX_CONNECTIONS",
                value: raw,
            })?,
            Err(_) => 5,
        };
        let busy_timeout = match std::env::var("DB_BUSY_TIMEOUT_MS") {
            Ok(raw) => raw
                .parse()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::Invalid {
                    key: "DB_BUSY_TIMEOUT_MS",
                    value: raw,
                })?,
            Err(_) => DEFAULT_BUSY_TIMEOUT,
        };

        Ok(Self::new(url)
            .with_max_connections(max_connections)
            .with_busy_timeout(busy_timeout))
    }
}

impl<'a> Default for DbConfig<'a> {
    fn default() -> Self {
        Self {
            url: Cow::Borrowed("sqlite://care_registry.db"),
            max_connections: 5,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}
