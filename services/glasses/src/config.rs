//! Application Configuration Module
//!
//! Loads runtime settings from the environment (and a local `.env` file when
//! present) and validates them before anything else starts.

use std::env;

use boardcast_backend::DEFAULT_BASE_URL;
use boardcast_core::DeliveryMode;
use secrecy::SecretString;
use tracing::Level;

pub const DEFAULT_PACKAGE_NAME: &str = "com.boardcast.glasses";
pub const DEFAULT_PORT: u16 = 3000;

/// Holds the application's runtime configuration.
#[derive(Debug)]
pub struct Config {
    /// Base URL of the chess backend.
    pub backend_url: String,
    /// Identifier this app registers with on the device platform.
    pub package_name: String,
    /// Port the platform would call back on.
    pub port: u16,
    /// Credential for the device platform. Never logged.
    pub api_key: SecretString,
    /// How move events reach the wearer.
    pub delivery_mode: DeliveryMode,
    /// The logging level for the application.
    pub log_level: Level,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
    #[error("Invalid PORT value: {0}")]
    InvalidPort(String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// *   `MENTRA_API_KEY`: credential for the device platform. Required.
    /// *   `BACKEND_URL`: (Optional) chess backend base URL. Defaults to
    ///     `http://localhost:8000`.
    /// *   `PACKAGE_NAME`: (Optional) app identifier on the platform.
    /// *   `PORT`: (Optional) callback port. Defaults to 3000.
    /// *   `DELIVERY_MODE`: (Optional) `push` or `ondemand`. Defaults to push.
    /// *   `RUST_LOG`: (Optional) log level. Defaults to `INFO`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = var("MENTRA_API_KEY")
            .ok_or_else(|| ConfigError::MissingVar("MENTRA_API_KEY must be set".to_string()))?;

        let backend_url = var("BACKEND_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let backend_url = backend_url.trim_end_matches('/').to_string();

        let package_name = var("PACKAGE_NAME").unwrap_or_else(|| DEFAULT_PACKAGE_NAME.to_string());

        let port = match var("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let mode = var("DELIVERY_MODE").unwrap_or_else(|| "push".to_string());
        let delivery_mode = match mode.to_lowercase().as_str() {
            "ondemand" | "on-demand" => DeliveryMode::OnDemand,
            // The push stream is the default for "push" and anything else.
            _ => DeliveryMode::PushStream,
        };

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            backend_url,
            package_name,
            port,
            api_key: SecretString::from(api_key),
            delivery_mode,
            log_level,
        })
    }
}
