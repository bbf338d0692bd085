// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error hierarchy for the publisher core.
//!
//! Every failure surfaced by the reconciliation engine, the persistence
//! adapters and the field resolver maps onto one of a small set of kinds:
//!
//! ```text
//! PublisherError
//! ├── BadRequest        - malformed or missing input
//! ├── ResourceNotFound  - writer, endpoint or node not in the live model
//! ├── TypeNotFound      - a required type node could not be fetched
//! ├── Io                - persistence read/write failure
//! ├── Validation        - malformed stored entry or settings value
//! ├── Serialization     - JSON encoding/decoding failure
//! └── Cancelled         - caller cancelled the operation
//! ```
//!
//! # Examples
//!
//! ```
//! use edgepub_core::error::{ErrorKind, PublisherError};
//!
//! let error = PublisherError::not_found("Endpoint not found: opc.tcp://plc:4840");
//! assert_eq!(error.kind(), ErrorKind::ResourceNotFound);
//! assert_eq!(error.status_code(), 404);
//! assert!(!error.is_retryable());
//! ```

use std::fmt;

use thiserror::Error;

// =============================================================================
// ErrorKind
// =============================================================================

/// Coarse classification of a [`PublisherError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing input.
    BadRequest,
    /// Referenced resource is not part of the live model.
    ResourceNotFound,
    /// A type node could not be resolved.
    TypeNotFound,
    /// Storage I/O failed.
    Io,
    /// Stored or configured data is malformed.
    Validation,
    /// Encoding or decoding failed.
    Serialization,
    /// The operation was cancelled.
    Cancelled,
}

impl ErrorKind {
    /// Returns the kind as a stable string for logging and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::ResourceNotFound => "ResourceNotFound",
            ErrorKind::TypeNotFound => "TypeNotFound",
            ErrorKind::Io => "IoError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Serialization => "SerializationError",
            ErrorKind::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// PublisherError
// =============================================================================

/// The root error type of the publisher core.
#[derive(Debug, Error)]
pub enum PublisherError {
    /// The request was missing or malformed.
    #[error("Bad request: {message}")]
    BadRequest {
        /// Description of what is wrong with the request.
        message: String,
    },

    /// The request referenced something that does not exist.
    #[error("Resource not found: {message}")]
    ResourceNotFound {
        /// Description including the serialized request.
        message: String,
    },

    /// A type node required for event resolution is unavailable.
    #[error("Type not found: {type_id}")]
    TypeNotFound {
        /// The type node identifier.
        type_id: String,
        /// Additional detail from the catalog.
        message: Option<String>,
    },

    /// Reading or writing the backing store failed.
    #[error("I/O error while {context}: {source}")]
    Io {
        /// What the store was doing.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Stored or configured data failed validation.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// The offending field or entry.
        field: String,
        /// Error message.
        message: String,
    },

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },

    /// The operation was cancelled by the caller.
    #[error("Operation cancelled")]
    Cancelled,
}

impl PublisherError {
    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a resource not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            message: message.into(),
        }
    }

    /// Creates a type not found error.
    pub fn type_not_found(type_id: impl Into<String>) -> Self {
        Self::TypeNotFound {
            type_id: type_id.into(),
            message: None,
        }
    }

    /// Creates an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest { .. } => ErrorKind::BadRequest,
            Self::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            Self::TypeNotFound { .. } => ErrorKind::TypeNotFound,
            Self::Io { .. } => ErrorKind::Io,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Serialization { .. } => ErrorKind::Serialization,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Returns `true` if this error is retryable.
    ///
    /// Only storage failures are transient; everything else reflects the
    /// request or the remote type system and fails again unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest { .. } => 400,
            Self::ResourceNotFound { .. } | Self::TypeNotFound { .. } => 404,
            Self::Validation { .. } | Self::Serialization { .. } => 422,
            Self::Cancelled => 499,
            Self::Io { .. } => 500,
        }
    }

    /// Returns the error type as a string for logging.
    pub fn error_type(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            Self::BadRequest { message } => format!("잘못된 요청: {}", message),
            Self::ResourceNotFound { message } => format!("리소스를 찾을 수 없습니다: {}", message),
            Self::TypeNotFound { type_id, .. } => format!("타입을 찾을 수 없습니다: {}", type_id),
            Self::Io { context, .. } => format!("저장소 입출력 실패 ({})", context),
            Self::Validation { field, message } => format!("검증 실패 ({}): {}", field, message),
            Self::Serialization { .. } => "데이터 직렬화에 실패했습니다".to_string(),
            Self::Cancelled => "작업이 취소되었습니다".to_string(),
        }
    }
}

impl From<serde_json::Error> for PublisherError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

/// A Result type with PublisherError.
pub type PublisherResult<T> = Result<T, PublisherError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(PublisherError::bad_request("x").kind(), ErrorKind::BadRequest);
        assert_eq!(PublisherError::not_found("x").kind(), ErrorKind::ResourceNotFound);
        assert_eq!(PublisherError::type_not_found("i=1").kind(), ErrorKind::TypeNotFound);
        assert_eq!(PublisherError::validation("f", "m").kind(), ErrorKind::Validation);
        assert_eq!(PublisherError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(PublisherError::bad_request("x").status_code(), 400);
        assert_eq!(PublisherError::not_found("x").status_code(), 404);
        assert_eq!(PublisherError::type_not_found("i=2041").status_code(), 404);
        assert_eq!(PublisherError::validation("f", "m").status_code(), 422);
    }

    #[test]
    fn test_retryable() {
        let io = PublisherError::io(
            "writing entries",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        assert!(io.is_retryable());
        assert!(!PublisherError::bad_request("x").is_retryable());
    }

    #[test]
    fn test_display_includes_message() {
        let error = PublisherError::bad_request("Request contains two entries for the same endpoint at index 0 and 2");
        assert!(error.to_string().contains("index 0 and 2"));
        assert_eq!(error.error_type(), "BadRequest");
    }

    #[test]
    fn test_from_serde_json() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: PublisherError = err.into();
        assert_eq!(error.kind(), ErrorKind::Serialization);
    }
}
