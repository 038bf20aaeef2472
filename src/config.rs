//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use serde::Deserialize;
use std::net::Ipv4Addr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0),
            port: 3000,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
        }
    }
}

/// Settings for the per-request introspection connections
#[derive(Debug, Clone, Deserialize)]
pub struct IntrospectionConfig {
    pub max_pool_size: usize,
    pub connect_timeout_secs: u64,
    /// Only count rows when the request is scoped by schema or include list
    pub row_count_requires_scope: bool,
}

impl Default for IntrospectionConfig {
    fn default() -> Self {
        Self {
            max_pool_size: 2,
            connect_timeout_secs: 10,
            row_count_requires_scope: true,
        }
    }
}

impl IntrospectionConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Complete application settings
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub introspection: IntrospectionConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        let server = ServerConfig {
            host: env_parse("HOST").unwrap_or_else(|| ServerConfig::default().host),
            port: env_parse("PORT").unwrap_or_else(|| ServerConfig::default().port),
        };

        let cors = CorsConfig {
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|s| parse_origins(&s))
                .unwrap_or_else(|| CorsConfig::default().allowed_origins),
        };

        let defaults = IntrospectionConfig::default();
        let introspection = IntrospectionConfig {
            max_pool_size: env_parse("INTROSPECT_MAX_POOL_SIZE").unwrap_or(defaults.max_pool_size),
            connect_timeout_secs: env_parse("INTROSPECT_CONNECT_TIMEOUT_SECS")
                .unwrap_or(defaults.connect_timeout_secs),
            row_count_requires_scope: env_parse("ROW_COUNT_REQUIRES_SCOPE")
                .unwrap_or(defaults.row_count_requires_scope),
        };

        if introspection.max_pool_size == 0 {
            return Err(ConfigError::InvalidValue(
                "INTROSPECT_MAX_POOL_SIZE must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            server,
            cors,
            introspection,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
