//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, AuthServiceSettings, LogFormat, LoggingConfig, ServerConfig, StartupSettings,
    StorageSettings,
};
