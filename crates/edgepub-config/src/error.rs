// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration error types for edgepub-config.
//!
//! Covers settings loading and validation as well as reading and writing
//! the published nodes file.

use std::path::PathBuf;

use thiserror::Error;

use edgepub_core::PublisherError;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse a settings or nodes file.
    #[error("Failed to parse config file '{path}': {message}")]
    Parse {
        /// Path to the file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// A setting failed validation.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// File I/O error.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Invalid environment variable value.
    #[error("Invalid environment variable value for '{name}': {message}")]
    InvalidEnvVar {
        /// The environment variable name.
        name: String,
        /// Error message.
        message: String,
    },

    /// Unsupported configuration format.
    #[error("Unsupported configuration format: {format}")]
    UnsupportedFormat {
        /// The unsupported format.
        format: String,
    },

    /// Serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    /// Creates a parse error.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates an invalid environment variable error.
    pub fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an unsupported format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns `true` if retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns the error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Parse { .. } | Self::Serialization { .. } => "parse",
            Self::Validation { .. } | Self::InvalidEnvVar { .. } => "validation",
            Self::Io { .. } | Self::FileNotFound { .. } => "io",
            Self::UnsupportedFormat { .. } => "format",
        }
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Parse { path, .. } => {
                format!("설정 파일을 해석할 수 없습니다: {}", path.display())
            }
            Self::Validation { field, message } => {
                format!("설정 값이 올바르지 않습니다 ({}): {}", field, message)
            }
            Self::Io { path, .. } => format!("파일에 접근할 수 없습니다: {}", path.display()),
            Self::FileNotFound { path } => format!("파일을 찾을 수 없습니다: {}", path.display()),
            Self::InvalidEnvVar { name, .. } => format!("환경 변수 값이 올바르지 않습니다: {}", name),
            Self::UnsupportedFormat { format } => format!("지원하지 않는 형식입니다: {}", format),
            Self::Serialization { .. } => "데이터 직렬화 중 오류가 발생했습니다.".to_string(),
        }
    }
}

impl From<ConfigError> for PublisherError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::Io { path, source } => {
                PublisherError::io(format!("accessing {}", path.display()), source)
            }
            ConfigError::FileNotFound { path } => PublisherError::io(
                format!("opening {}", path.display()),
                std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            ),
            ConfigError::Validation { field, message } => PublisherError::validation(field, message),
            ConfigError::InvalidEnvVar { name, message } => PublisherError::validation(name, message),
            ConfigError::Parse { path, message } => {
                PublisherError::validation(path.display().to_string(), message)
            }
            ConfigError::UnsupportedFormat { format } => {
                PublisherError::validation("format", format!("unsupported format '{}'", format))
            }
            ConfigError::Serialization { message } => PublisherError::serialization(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgepub_core::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = ConfigError::validation("storage.published_nodes_file", "must not be empty");
        assert_eq!(
            err.to_string(),
            "Validation failed for 'storage.published_nodes_file': must not be empty"
        );
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_conversion_preserves_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PublisherError = ConfigError::io("/tmp/nodes.json", io).into();
        assert_eq!(err.kind(), ErrorKind::Io);

        let err: PublisherError = ConfigError::parse("/tmp/nodes.json", "not an array").into();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err: PublisherError = ConfigError::serialization("bad").into();
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }

    #[test]
    fn test_category() {
        assert_eq!(ConfigError::file_not_found("x").category(), "io");
        assert_eq!(ConfigError::unsupported_format("ini").category(), "format");
        assert!(!ConfigError::unsupported_format("ini").is_retryable());
    }
}
