use std::net::SocketAddr;

use thiserror::Error;

use crate::db::DbConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Process configuration, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_filter: String,
    pub db: DbConfig<'static>,
}

impl AppConfig {
    /// Build the configuration from environment variables.
    ///
    /// `BIND_ADDR` defaults to `0.0.0.0:3000` and `RUST_LOG` to `info`; see
    /// [`DbConfig::from_env`] for the database variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = match std::env::var("BIND_ADDR") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: raw,
            })?,
            Err(_) => SocketAddr::from(([0, 0, 0, 0], 3000)),
        };
        let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());

        Ok(Self {
            bind_addr,
            log_filter,
            db: DbConfig::from_env()?,
        })
    }
}
