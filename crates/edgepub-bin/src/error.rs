// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the edgepub binary.

use thiserror::Error;

use edgepub_core::{ErrorKind, PublisherError};

/// Result type alias for edgepub-bin operations.
pub type BinResult<T> = Result<T, BinError>;

/// Errors that can occur in the edgepub binary.
#[derive(Debug, Error)]
pub enum BinError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Settings or nodes file error.
    #[error("Config error: {0}")]
    Config(#[from] edgepub_config::ConfigError),

    /// Engine error.
    #[error("{0}")]
    Publisher(#[from] PublisherError),

    /// Type catalog error.
    #[error("Catalog error: {0}")]
    Catalog(#[from] edgepub_opcua::OpcUaError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        /// The context description.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<BinError>,
    },
}

impl BinError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates an I/O error.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Adds context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) | Self::Config(_) => 1,
            Self::Io(_) => 5,
            Self::Catalog(_) => 4,
            Self::Publisher(e) => match e.kind() {
                ErrorKind::Validation => 1,
                ErrorKind::BadRequest => 2,
                ErrorKind::ResourceNotFound => 3,
                ErrorKind::TypeNotFound => 4,
                ErrorKind::Io => 5,
                ErrorKind::Serialization => 6,
                ErrorKind::Cancelled => 130,
            },
            Self::WithContext { source, .. } => source.exit_code(),
        }
    }
}

impl From<std::io::Error> for BinError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BinError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration(format!("invalid JSON: {}", err))
    }
}

// =============================================================================
// Error Reporting
// =============================================================================

/// Reports an error with its cause chain.
pub fn report_error(error: &BinError) {
    eprintln!("Error: {}", error);

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("  Caused by: {}", cause);
        source = cause.source();
    }
}

/// Reports an error and exits with the appropriate code.
pub fn report_error_and_exit(error: BinError) -> ! {
    report_error(&error);
    std::process::exit(error.exit_code())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_with_context() {
        let err = BinError::config("inner error").with_context("outer context");
        assert_eq!(err.to_string(), "outer context: Configuration error: inner error");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_exit_codes_follow_kind() {
        let err: BinError = PublisherError::bad_request("Request is null").into();
        assert_eq!(err.exit_code(), 2);
        let err: BinError = PublisherError::not_found("Endpoint not found").into();
        assert_eq!(err.exit_code(), 3);
        let err: BinError = PublisherError::type_not_found("i=1").into();
        assert_eq!(err.exit_code(), 4);
        assert_eq!(BinError::io("disk").exit_code(), 5);
    }
}
