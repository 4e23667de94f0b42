//! Configuration management for the book catalog server

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Session secret used when none is configured. Startup warns when it is active.
pub const DEFAULT_SESSION_SECRET: &str = "insecure-default-session-secret";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Which row-store client backs the catalog
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Hosted data API over HTTP
    Rest,
    /// In-process rows, lost on restart
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Rest => "rest",
            StoreBackend::Memory => "memory",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Base URL of the hosted project, e.g. `https://xyz.example.co`
    pub url: Option<String>,
    /// Access key sent as `apikey` and bearer token
    pub key: Option<String>,
    pub table: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (with prefix CATALOG_, e.g. CATALOG_STORE__TABLE)
            .add_source(
                Environment::with_prefix("CATALOG")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("store.url", env::var("STORE_URL").ok())?
            .set_override_option("store.key", env::var("STORE_KEY").ok())?
            .set_override_option("session.secret", env::var("SESSION_SECRET").ok())?
            .build()?;

        config.try_deserialize()
    }

    /// Whether the session secret is still the built-in default
    pub fn uses_default_secret(&self) -> bool {
        self.session.secret == DEFAULT_SESSION_SECRET
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Rest,
            url: None,
            key: None,
            table: "books".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SESSION_SECRET.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
