//! Error types for catalog loading and rule generation

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's error type.
pub type Result<T> = std::result::Result<T, KitError>;

/// Errors raised while loading the catalog or generating rule files.
///
/// Configuration errors abort a run. File errors are collected per file
/// and reported once the run completes.
#[derive(Debug, Error)]
pub enum KitError {
    /// The catalog file is missing or is not valid JSON.
    #[error("Failed to load kit config '{path}': {message}")]
    ConfigLoad { path: PathBuf, message: String },

    /// The catalog parsed but violates an integrity rule.
    #[error("Invalid kit config: {message}")]
    InvalidCatalog { message: String },

    #[error("No stack selected")]
    NoStack,

    #[error("Unknown stack '{name}'. Available stacks: {available}")]
    UnknownStack { name: String, available: String },

    #[error("Unknown architecture '{name}' for stack '{stack}'. Available: {available}")]
    UnknownArchitecture {
        stack: String,
        name: String,
        available: String,
    },

    #[error("Stack '{stack}' declares no architectures")]
    NoArchitecture { stack: String },

    #[error("Unknown MCP tool '{name}'. Available tools: {available}")]
    UnknownMcpTool { name: String, available: String },

    #[error("Failed to read template '{path}': {source}")]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid frontmatter in '{path}': {message}")]
    Frontmatter { path: PathBuf, message: String },

    #[error("Failed to write '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to back up '{path}': {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl KitError {
    pub fn config_load(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn invalid_catalog(message: impl Into<String>) -> Self {
        Self::InvalidCatalog {
            message: message.into(),
        }
    }

    pub fn template_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::TemplateRead {
            path: path.into(),
            source,
        }
    }

    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Returns true for errors that must abort the whole run.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigLoad { .. }
                | Self::InvalidCatalog { .. }
                | Self::NoStack
                | Self::UnknownStack { .. }
                | Self::UnknownArchitecture { .. }
                | Self::NoArchitecture { .. }
                | Self::UnknownMcpTool { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_fatal() {
        assert!(KitError::invalid_catalog("overlap").is_fatal());
        assert!(KitError::NoArchitecture {
            stack: "laravel".to_string()
        }
        .is_fatal());
    }

    #[test]
    fn test_file_errors_are_not_fatal() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = KitError::file_write("/tmp/rules/a.mdc", io_err);
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("/tmp/rules/a.mdc"));
    }

    #[test]
    fn test_unknown_stack_lists_available() {
        let err = KitError::UnknownStack {
            name: "rails".to_string(),
            available: "laravel, nextjs".to_string(),
        };
        assert!(err.to_string().contains("laravel, nextjs"));
    }
}
