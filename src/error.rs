//! Error types for the refresh pipeline and configuration

use std::fmt;
use std::path::PathBuf;

/// Result type alias for dashboard operations
pub type DashboardResult<T> = Result<T, DashboardError>;

/// Errors that can occur while building a refresh payload
#[derive(Debug)]
pub enum DashboardError {
    /// The metrics backend could not be reached or answered with a failure
    BackendUnavailable(String),

    /// The metrics backend answered, but not with the expected JSON shape
    MalformedResponse(String),

    /// The access log could not be opened or read
    LogUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The echo utility could not be executed
    ///
    /// Never leaves the probe; it is downgraded to a failed probe outcome.
    ProbeExecution(String),

    /// Invalid or incomplete configuration
    Config(ConfigError),
}

impl fmt::Display for DashboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashboardError::BackendUnavailable(msg) => {
                write!(f, "metrics backend unavailable: {}", msg)
            }
            DashboardError::MalformedResponse(msg) => {
                write!(f, "malformed metrics response: {}", msg)
            }
            DashboardError::LogUnavailable { path, source } => {
                write!(f, "log file {} unavailable: {}", path.display(), source)
            }
            DashboardError::ProbeExecution(msg) => write!(f, "probe execution failed: {}", msg),
            DashboardError::Config(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for DashboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DashboardError::LogUnavailable { source, .. } => Some(source),
            DashboardError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for DashboardError {
    fn from(err: ConfigError) -> Self {
        DashboardError::Config(err)
    }
}

/// Errors raised while loading and validating configuration
#[derive(Debug)]
pub enum ConfigError {
    /// A required value was not provided (or was empty)
    Missing(&'static str),

    /// A value was provided but is not usable
    Invalid { field: String, message: String },

    /// The configuration file could not be read
    Io(std::io::Error),

    /// The configuration file is not valid JSON for the expected shape
    Parse(serde_json::Error),
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(field) => {
                write!(f, "missing required configuration value: {}", field)
            }
            ConfigError::Invalid { field, message } => {
                write!(f, "invalid configuration value for {}: {}", field, message)
            }
            ConfigError::Io(err) => write!(f, "failed to read configuration file: {}", err),
            ConfigError::Parse(err) => write!(f, "invalid configuration file: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}
