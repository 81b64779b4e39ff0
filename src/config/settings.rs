//! Application settings loaded from a dotenv file and the process environment.

use std::env;
use std::time::Duration;

use super::constants::{
    DEFAULT_DB_HOST, DEFAULT_DB_NAME, DEFAULT_DB_PASSWORD, DEFAULT_DB_PORT, DEFAULT_DB_USER,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, ENV_DATABASE_URL,
    ENV_DB_HOST, ENV_DB_NAME, ENV_DB_PASSWORD, ENV_DB_PORT, ENV_DB_USER, ENV_REQUEST_TIMEOUT_SECS,
    ENV_SERVER_HOST, ENV_SERVER_PORT,
};
use crate::errors::{AppError, AppResult};

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Config {
    /// Load configuration from a dotenv file layered under the process environment.
    ///
    /// With an explicit `path` the file must exist. Without one, `./.env` is
    /// read when present. Variables already set in the environment are never
    /// overwritten by the file, so the environment takes precedence.
    pub fn load(path: Option<&str>) -> AppResult<Self> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| {
                    AppError::internal(format!("Failed to read config file {}: {}", path, e))
                })?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }

        Ok(Self::from_env())
    }

    /// Load configuration from environment variables only.
    pub fn from_env() -> Self {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_source<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = get(ENV_DATABASE_URL).unwrap_or_else(|| {
            format!(
                "postgres://{}:{}@{}:{}/{}",
                get(ENV_DB_USER).unwrap_or_else(|| DEFAULT_DB_USER.to_string()),
                get(ENV_DB_PASSWORD).unwrap_or_else(|| DEFAULT_DB_PASSWORD.to_string()),
                get(ENV_DB_HOST).unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
                get(ENV_DB_PORT)
                    .and_then(|v| v.parse::<u16>().ok())
                    .unwrap_or(DEFAULT_DB_PORT),
                get(ENV_DB_NAME).unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            )
        });

        Self {
            database_url,
            server_host: get(ENV_SERVER_HOST).unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            server_port: get(ENV_SERVER_PORT)
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
            request_timeout_secs: get(ENV_REQUEST_TIMEOUT_SECS)
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Per-request deadline applied by the HTTP layer.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
