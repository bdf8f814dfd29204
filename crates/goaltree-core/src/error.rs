//! Error types for the goal graph engine
//!
//! The engine itself never fails on document data: malformed values are
//! defaulted and structural problems are reported as validation issues.
//! Only loading and checking configuration can fail.

use std::path::PathBuf;

/// Errors while loading or checking [`GoalSettings`](crate::config::GoalSettings)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error during config read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the settings schema
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Settings could not be rendered back to TOML
    #[error("cannot render config: {0}")]
    Render(#[from] toml::ser::Error),

    /// A field name mapping is unusable
    #[error("invalid setting '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create invalid-setting error
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
