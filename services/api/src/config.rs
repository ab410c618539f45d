//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use qa_community_core::domain::UserId;
use std::net::SocketAddr;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// When present the PostgreSQL store is used, otherwise the in-memory one.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub log_level: Level,
    pub seed_sample_data: bool,
    /// Identity assumed for requests that carry no `x-user-id` header.
    pub demo_user_id: UserId,
    pub cors_origin: String,
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

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // --- Server and Database Settings ---
        let default_bind = "0.0.0.0:3000".parse::<SocketAddr>().ok();
        let bind_address = parse_or(&lookup, "BIND_ADDRESS", default_bind)?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let db_max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", Some(5))?;

        let log_level = parse_or(&lookup, "RUST_LOG", Some(Level::INFO))?;

        // --- Demo Behaviour ---
        let seed_sample_data = match lookup("SEED_SAMPLE_DATA") {
            None => true,
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "SEED_SAMPLE_DATA".to_string(),
                    format!("'{}' is not a boolean", raw),
                )
            })?,
        };
        let demo_user_id = parse_or(&lookup, "DEMO_USER_ID", Some(1))?;

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());

        Ok(Self {
            bind_address,
            database_url,
            db_max_connections,
            log_level,
            seed_sample_data,
            demo_user_id,
            cors_origin,
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: Option<T>,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match (lookup(name), default) {
        (Some(raw), _) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("'{}': {}", raw, e))),
        (None, Some(value)) => Ok(value),
        (None, None) => Err(ConfigError::InvalidValue(
            name.to_string(),
            "no value and no default".to_string(),
        )),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000".parse().unwrap());
        assert!(config.database_url.is_none());
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.log_level, Level::INFO);
        assert!(config.seed_sample_data);
        assert_eq!(config.demo_user_id, 1);
        assert_eq!(config.cors_origin, "http://localhost:5173");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = config_from(&[
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("DATABASE_URL", "postgres://localhost/qa"),
            ("RUST_LOG", "debug"),
            ("SEED_SAMPLE_DATA", "off"),
            ("DEMO_USER_ID", "3"),
        ])
        .unwrap();
        assert_eq!(config.bind_address.port(), 8080);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/qa"));
        assert_eq!(config.log_level, Level::DEBUG);
        assert!(!config.seed_sample_data);
        assert_eq!(config.demo_user_id, 3);
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        let config = config_from(&[("DATABASE_URL", "  ")]).unwrap();
        assert!(config.database_url.is_none());
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let err = config_from(&[("DEMO_USER_ID", "abc")]).unwrap_err();
        assert!(err.to_string().contains("DEMO_USER_ID"));

        let err = config_from(&[("SEED_SAMPLE_DATA", "maybe")]).unwrap_err();
        assert!(err.to_string().contains("SEED_SAMPLE_DATA"));

        assert!(config_from(&[("RUST_LOG", "chatty")]).is_err());
        assert!(config_from(&[("BIND_ADDRESS", "localhost")]).is_err());
    }
}
