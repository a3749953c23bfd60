use std::path::PathBuf;

use grab_place_core::{ConfigError, StartupError};

/// Errors raised while loading or running a scenario
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Failed to read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid scenario: {0}")]
    Invalid(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Controller failed to start: {0}")]
    Startup(#[from] StartupError),
}

pub type Result<T> = std::result::Result<T, SimError>;
