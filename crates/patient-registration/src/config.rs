//! Configuration for the registration service.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Record storage configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Email delivery configuration
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Registration policy
    #[serde(default)]
    pub registration: RegistrationConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Enable persistence (if false, records are in-memory only)
    #[serde(default)]
    pub persist: bool,

    /// Path to the JSON snapshot file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    /// Mail relay base URL; emails are only logged when unset
    #[serde(default)]
    pub relay_url: Option<String>,

    /// Bearer token for the mail relay
    #[serde(default)]
    pub api_token: Option<String>,

    /// Sender address
    #[serde(default = "default_sender")]
    pub sender: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationConfig {
    /// Incorrect pincodes allowed before a registration is blocked
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Number of digits in generated pincodes
    #[serde(default = "default_pincode_digits")]
    pub pincode_digits: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Global requests per minute
    #[serde(default = "default_global_rpm")]
    pub global_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            persist: false,
            path: default_store_path(),
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            relay_url: None,
            api_token: None,
            sender: default_sender(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl NotifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            pincode_digits: default_pincode_digits(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_per_minute: default_global_rpm(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

fn default_store_path() -> PathBuf {
    PathBuf::from("/data/registrations.json")
}

fn default_sender() -> String {
    "no-reply@registration.local".into()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    5
}

fn default_pincode_digits() -> u32 {
    6
}

fn default_global_rpm() -> u32 {
    60
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert!(!config.store.persist);
        assert!(config.notifier.relay_url.is_none());
        assert_eq!(config.notifier.timeout(), Duration::from_secs(10));
        assert_eq!(config.registration.max_attempts, 5);
        assert_eq!(config.registration.pincode_digits, 6);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let json = serde_json::json!({
            "registration": { "max_attempts": 3 },
            "notifier": { "relay_url": "http://relay:8025" }
        });

        let config: Config = serde_json::from_value(json).unwrap();
        assert_eq!(config.registration.max_attempts, 3);
        assert_eq!(config.registration.pincode_digits, 6);
        assert_eq!(config.notifier.relay_url.as_deref(), Some("http://relay:8025"));
        assert_eq!(config.notifier.sender, "no-reply@registration.local");
        assert_eq!(config.rate_limit.global_per_minute, 60);
    }
}
