//! Process-level error types for the deckweather host.
//!
//! Each crate owns its domain errors (`WeatherError`, `RefreshError`, ...);
//! this module covers configuration and the top-level `AppError` the host
//! binary reports on startup failure.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` for text shown to the user; `Display` keeps the full
/// context for logs.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Startup error: {0}")]
    Startup(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Startup(_) => "The plugin failed to start. Check the log for details.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No configuration directory available on this platform")]
    NoConfigDir,
}

impl ConfigError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "The configuration file could not be read or written.",
            ConfigError::Parse(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::Serialize(_) => "Configuration could not be saved.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::NoConfigDir => "No configuration directory is available.",
        }
    }
}
