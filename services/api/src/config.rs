//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use axum::http::HeaderValue;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub database_name: String,
    pub db_max_pool_size: u32,
    pub db_min_pool_size: u32,
    pub db_connect_timeout: Duration,
    pub db_server_selection_timeout: Duration,
    pub log_level: Level,
    /// Deployment name reported by `/health` (`development`, `production`, ...).
    pub environment: String,
    pub images_path: PathBuf,
    /// Empty means any origin is allowed.
    pub cors_allowed_origins: Vec<HeaderValue>,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window: Duration,
    pub body_limit_bytes: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address: SocketAddr = parse_or(&lookup, "BIND_ADDRESS", "0.0.0.0:8000".parse().ok())?;
        let body_limit_bytes: usize = parse_or(&lookup, "BODY_LIMIT_BYTES", Some(10 * 1024 * 1024))?;
        let environment = lookup("APP_ENV").unwrap_or_else(|| "development".to_string());
        let images_path = lookup("IMAGES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./images"));

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Database Settings ---
        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;
        let database_name = lookup("DATABASE_NAME").unwrap_or_else(|| "lessons_db".to_string());
        let db_max_pool_size: u32 = parse_or(&lookup, "DB_MAX_POOL_SIZE", Some(10))?;
        let db_min_pool_size: u32 = parse_or(&lookup, "DB_MIN_POOL_SIZE", Some(0))?;
        if db_max_pool_size == 0 || db_min_pool_size > db_max_pool_size {
            return Err(ConfigError::InvalidValue(
                "DB_MIN_POOL_SIZE".to_string(),
                format!(
                    "pool bounds {}..={} are not a valid range",
                    db_min_pool_size, db_max_pool_size
                ),
            ));
        }
        let db_connect_timeout =
            Duration::from_secs(parse_or(&lookup, "DB_CONNECT_TIMEOUT_SECS", Some(10))?);
        let db_server_selection_timeout = Duration::from_secs(parse_or(
            &lookup,
            "DB_SERVER_SELECTION_TIMEOUT_SECS",
            Some(5),
        )?);

        // --- HTTP Hardening ---
        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .transpose()?
            .unwrap_or_default();
        let rate_limit_max_requests: u32 = parse_or(&lookup, "RATE_LIMIT_MAX_REQUESTS", Some(100))?;
        let rate_limit_window_secs: u64 = parse_or(&lookup, "RATE_LIMIT_WINDOW_SECS", Some(15 * 60))?;
        if rate_limit_max_requests == 0 || rate_limit_window_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "RATE_LIMIT_WINDOW_SECS".to_string(),
                "the rate limit window and request count must be positive".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            database_url,
            database_name,
            db_max_pool_size,
            db_min_pool_size,
            db_connect_timeout,
            db_server_selection_timeout,
            log_level,
            environment,
            images_path,
            cors_allowed_origins,
            rate_limit_max_requests,
            rate_limit_window: Duration::from_secs(rate_limit_window_secs),
            body_limit_bytes,
        })
    }
}

/// Parses `name` when set, falling back to `default` when it is not.
fn parse_or<F, T>(lookup: &F, name: &str, default: Option<T>) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        None => default.ok_or_else(|| ConfigError::MissingVar(name.to_string())),
    }
}

fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| {
                ConfigError::InvalidValue("CORS_ALLOWED_ORIGINS".to_string(), e.to_string())
            })
        })
        .collect()
}
