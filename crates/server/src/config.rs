//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required (postgres backend)
//! - `CAMPUS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `CAMPUS_STORE` - Store backend, `postgres` or `memory` (default: postgres)
//! - `CAMPUS_HOST` - Bind address (default: 127.0.0.1)
//! - `CAMPUS_PORT` - Listen port (default: 5000)
//! - `CAMPUS_BASE_URL` - Public URL of the API (default: <http://localhost:5000>)
//! - `CAMPUS_CORS_ORIGIN` - Origin of the frontend (default: <http://localhost:5173>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate, 0.0-1.0 (default: 0.0)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which store implementation backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// `PostgreSQL` via sqlx.
    Postgres,
    /// Process-local maps; data is lost on restart.
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("expected 'postgres' or 'memory', got '{other}'")),
        }
    }
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Store backend selection
    pub store: StoreBackend,
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the API
    pub base_url: String,
    /// Frontend origin allowed by CORS
    pub cors_origin: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced by Sentry
    pub sentry_traces_sample_rate: f32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let store = get_env_or_default("CAMPUS_STORE", "postgres")
            .parse::<StoreBackend>()
            .map_err(|e| ConfigError::InvalidEnvVar("CAMPUS_STORE".to_string(), e))?;
        let database_url = match store {
            StoreBackend::Postgres => Some(get_database_url("CAMPUS_DATABASE_URL")?),
            StoreBackend::Memory => None,
        };
        let host = get_env_or_default("CAMPUS_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("CAMPUS_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("CAMPUS_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("CAMPUS_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("CAMPUS_BASE_URL", "http://localhost:5000");
        let cors_origin = get_env_or_default("CAMPUS_CORS_ORIGIN", "http://localhost:5173");

        Ok(Self {
            store,
            database_url,
            host,
            port,
            base_url,
            cors_origin,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Configuration for tests and local runs: in-memory store, default ports.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            store: StoreBackend::Memory,
            database_url: None,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 5000,
            base_url: "http://localhost:5000".to_string(),
            cors_origin: "http://localhost:5173".to_string(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must be marked `Secure`.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a sample rate in `0.0..=1.0`.
fn get_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    parse_rate(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e))
}

fn parse_rate(raw: &str) -> Result<f32, String> {
    let rate = raw.trim().parse::<f32>().map_err(|e| e.to_string())?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("must be between 0.0 and 1.0 (got {rate})"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parse() {
        assert_eq!(
            "postgres".parse::<StoreBackend>().unwrap(),
            StoreBackend::Postgres
        );
        assert_eq!(" Memory ".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("mongo".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_parse_rate() {
        assert!((parse_rate("0.25").unwrap() - 0.25).abs() < f32::EPSILON);
        assert!(parse_rate("1.5").is_err());
        assert!(parse_rate("-0.1").is_err());
        assert!(parse_rate("often").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig::in_memory();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 5000);
    }

    #[test]
    fn test_secure_cookies_follow_base_url() {
        let mut config = ServerConfig::in_memory();
        assert!(!config.secure_cookies());

        config.base_url = "https://campus.example.edu".to_string();
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let mut config = ServerConfig::in_memory();
        config.database_url = Some(SecretString::from("postgres://campus:hunter2@db/campus"));

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
    }
}
