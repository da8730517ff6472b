//! Configuration management for the store.

use std::env;

/// Store configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Upper bound of the connection pool
    pub max_connections: u32,
    /// Apply pending migrations on connect
    pub run_migrations: bool,
}

impl Config {
    /// Load configuration from environment variables, reading a `.env` file
    /// first when one is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::MissingDatabaseUrl)?;

        let max_connections = lookup("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidMaxConnections)?;

        let run_migrations = match lookup("RUN_MIGRATIONS").as_deref() {
            None => true,
            Some("1") | Some("true") | Some("yes") => true,
            Some("0") | Some("false") | Some("no") => false,
            Some(other) => return Err(ConfigError::InvalidRunMigrations(other.to_string())),
        };

        Ok(Self {
            database_url,
            max_connections,
            run_migrations,
        })
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL environment variable is required")]
    MissingDatabaseUrl,

    #[error("Invalid DB_MAX_CONNECTIONS value")]
    InvalidMaxConnections,

    #[error("Invalid RUN_MIGRATIONS value: {0}")]
    InvalidRunMigrations(String),
}
