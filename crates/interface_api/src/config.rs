//! API configuration
//!
//! Loaded from `API_*` environment variables on top of built-in defaults.
//! `DATABASE_URL` is honoured when `API_DATABASE_URL` is not set.

use serde::Deserialize;

use core_kernel::CoreError;
use domain_order::DEFAULT_BATCH_FETCH_SIZE;
use infra_db::DEFAULT_DATABASE_URL;

/// Where orders are stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process-local store, lost on restart
    Memory,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Log level or `EnvFilter` directive
    pub log_level: String,
    pub log_format: LogFormat,
    pub storage: StorageBackend,
    /// Insert the sample shop on startup when no order exists
    pub seed_sample_data: bool,
    /// Owners per `IN (...)` query in the batch-fetching strategy
    pub default_batch_fetch_size: usize,
    pub max_connections: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            storage: StorageBackend::Postgres,
            seed_sample_data: true,
            default_batch_fetch_size: DEFAULT_BATCH_FETCH_SIZE,
            max_connections: 10,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::load(
            config::Environment::with_prefix("API").try_parsing(true),
            std::env::var("DATABASE_URL").ok(),
        )
    }

    /// Loads configuration from an environment source over the defaults
    ///
    /// `fallback_database_url` replaces the default URL but not an
    /// `API_DATABASE_URL` from `environment`.
    pub fn load(
        environment: config::Environment,
        fallback_database_url: Option<String>,
    ) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let database_url = fallback_database_url.unwrap_or(defaults.database_url);

        config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("database_url", database_url)?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_format", "pretty")?
            .set_default("storage", "postgres")?
            .set_default("seed_sample_data", defaults.seed_sample_data)?
            .set_default(
                "default_batch_fetch_size",
                defaults.default_batch_fetch_size as i64,
            )?
            .set_default("max_connections", i64::from(defaults.max_connections))?
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    /// Checks values the type system cannot
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.default_batch_fetch_size == 0 {
            return Err(CoreError::Configuration(
                "default_batch_fetch_size must be at least 1".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(CoreError::Configuration(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.storage == StorageBackend::Postgres && self.database_url.trim().is_empty() {
            return Err(CoreError::Configuration(
                "database_url is required for postgres storage".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
