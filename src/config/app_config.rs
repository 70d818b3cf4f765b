use std::time::Duration;

use serde::Deserialize;

use crate::infrastructure::key_validator::HttpValidatorConfig;
use crate::infrastructure::startup::StartupPolicy;
use crate::infrastructure::storage::{PostgresConfig, RedisConfig, StorageConfig, StorageType};

/// Application configuration
///
/// Every section has defaults so a bare environment still boots against the
/// in-memory store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageSettings,
    pub startup: StartupSettings,
    pub auth_service: AuthServiceSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    /// Overrides the per-service default port when set
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Store connection parameters
///
/// `url` wins when present; otherwise it is assembled from the parts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: String,
    pub url: Option<String>,
    pub host: String,
    pub port: Option<u16>,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StartupSettings {
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthServiceSettings {
    pub base_url: String,
    pub timeout_ms: u64,
    /// Positive-result cache TTL; 0 disables the cache
    pub cache_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            url: None,
            host: "localhost".to_string(),
            port: None,
            user: "root".to_string(),
            password: "password".to_string(),
            database: None,
            max_connections: 10,
            connect_timeout_secs: 5,
        }
    }
}

impl Default for StartupSettings {
    fn default() -> Self {
        let policy = StartupPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            retry_delay_secs: policy.retry_delay.as_secs(),
        }
    }
}

impl Default for AuthServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_ms: 300,
            cache_ttl_secs: 0,
        }
    }
}

impl StorageSettings {
    /// Resolve the backend selection into a concrete storage configuration.
    ///
    /// `default_database` names the store when none is configured, so each
    /// service lands in its own database by default.
    pub fn to_storage_config(&self, default_database: &str) -> Result<StorageConfig, String> {
        let backend = StorageType::from_str(&self.backend)
            .ok_or_else(|| format!("Unknown storage backend '{}'", self.backend))?;

        let database = self.database.as_deref().unwrap_or(default_database);

        Ok(match backend {
            StorageType::InMemory => StorageConfig::InMemory,
            StorageType::Postgres => {
                let url = match &self.url {
                    Some(url) => url.clone(),
                    None => self.postgres_url(database)?,
                };
                StorageConfig::Postgres(
                    PostgresConfig::new(url)
                        .with_max_connections(self.max_connections)
                        .with_connect_timeout(self.connect_timeout_secs),
                )
            }
            StorageType::Redis => {
                let url = self.url.clone().unwrap_or_else(|| {
                    format!("redis://{}:{}", self.host, self.port.unwrap_or(6379))
                });
                StorageConfig::Redis(RedisConfig::new(url).with_key_prefix(database))
            }
        })
    }

    /// Assembles a connection URL with the credentials percent-encoded
    fn postgres_url(&self, database: &str) -> Result<String, String> {
        let mut url = reqwest::Url::parse("postgres://localhost").map_err(|e| e.to_string())?;

        url.set_host(Some(&self.host))
            .map_err(|e| format!("Invalid storage host '{}': {}", self.host, e))?;
        url.set_port(Some(self.port.unwrap_or(5432)))
            .map_err(|_| "Invalid storage port".to_string())?;
        url.set_username(&self.user)
            .map_err(|_| "Invalid storage user".to_string())?;
        url.set_password(Some(&self.password))
            .map_err(|_| "Invalid storage password".to_string())?;
        url.set_path(database);

        Ok(url.into())
    }
}

impl StartupSettings {
    pub fn policy(&self) -> StartupPolicy {
        StartupPolicy::new(self.max_attempts, Duration::from_secs(self.retry_delay_secs))
    }
}

impl AuthServiceSettings {
    pub fn validator_config(&self) -> HttpValidatorConfig {
        HttpValidatorConfig::new(&self.base_url).with_timeout(Duration::from_millis(self.timeout_ms))
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with(Self::environment())
    }

    /// `APP_STORAGE__BACKEND` sets `storage.backend`
    fn environment() -> config::Environment {
        config::Environment::with_prefix("APP")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn load_with(environment: config::Environment) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(environment)
            .build()?;

        config.try_deserialize()
    }
}
