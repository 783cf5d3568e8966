//! Shared error types for the enforcement engine.
//!
//! Nothing inside the engine is fatal: callers log these errors and fall
//! back to an empty result. The variants exist so that collaborators and the
//! binary can tell configuration mistakes apart from I/O trouble.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for enforcer operations
#[derive(Debug, Error)]
pub enum Error {
    /// File system related errors
    #[error("File system error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors (bad thresholds, unreadable config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A rule pattern failed to compile
    #[error("Invalid pattern in rule '{rule}': {source}")]
    Regex {
        rule: String,
        #[source]
        source: regex::Error,
    },

    /// A collaborator answered, but with an error
    #[error("{collaborator} failed: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },

    /// A collaborator is not configured for this run
    #[error("{0} is not available")]
    Unavailable(&'static str),

    /// Generic errors with context
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    /// Git errors
    #[error(transparent)]
    Git(#[from] git2::Error),
}

impl Error {
    /// Create a file system error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a collaborator failure
    pub fn collaborator(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self::Collaborator {
            collaborator,
            message: message.into(),
        }
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            message: self.to_string(),
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_wraps_message() {
        let err: Result<()> = Err(Error::Config("max_params must be positive".into()));
        let wrapped = err.context("loading .enforcer.toml").unwrap_err();
        assert_eq!(
            wrapped.to_string(),
            "loading .enforcer.toml: Configuration error: max_params must be positive"
        );
    }

    #[test]
    fn unavailable_names_collaborator() {
        assert_eq!(
            Error::Unavailable("fixer").to_string(),
            "fixer is not available"
        );
    }
}
