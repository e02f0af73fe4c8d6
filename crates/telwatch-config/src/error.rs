//! Error types for configuration loading.

use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that prevent a configuration from loading. All are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("service #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("duplicate service name: {0}")]
    DuplicateName(String),

    #[error("service {service}: {kind} services require field `{field}`")]
    MissingField {
        service: String,
        kind: &'static str,
        field: &'static str,
    },

    #[error("service {service}: invalid url {url}: expected http:// or https://")]
    InvalidUrl { service: String, url: String },

    #[error("service {service}: timeout must be positive, got {value}")]
    InvalidTimeout { service: String, value: f64 },

    #[error("check_interval must be positive, got {0}")]
    InvalidInterval(f64),
}
