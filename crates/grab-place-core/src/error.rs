//! Error types for controller startup, host services and configuration

use std::path::PathBuf;

/// Failure reported by a host-provided service.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{service} service: {message}")]
pub struct ServiceError {
    pub service: &'static str,
    pub message: String,
}

impl ServiceError {
    pub fn new(service: &'static str, message: impl Into<String>) -> Self {
        Self {
            service,
            message: message.into(),
        }
    }
}

/// Fatal: the controller cannot run and performs no ticks.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to start host service: {0}")]
    ServiceStart(#[from] ServiceError),

    #[error("Invalid controller configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
