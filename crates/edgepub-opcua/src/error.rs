// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Errors raised while reading the type catalog and resolving event fields.
//!
//! ```text
//! OpcUaError
//! ├── TypeNotFound  - Catalog has no node for the id
//! ├── InvalidNodeId - Node id text does not parse
//! ├── Catalog       - Catalog failed while fetching or loading
//! └── Cancelled     - Caller cancelled the resolution
//! ```
//!
//! Every variant converts into [`PublisherError`] so callers of the engine
//! see a single taxonomy.

use thiserror::Error;
use tracing::Level;

use edgepub_core::PublisherError;

/// Result type for catalog and resolver operations.
pub type OpcUaResult<T> = Result<T, OpcUaError>;

// =============================================================================
// OpcUaError
// =============================================================================

/// The error type for catalog and resolver operations.
#[derive(Debug, Error)]
pub enum OpcUaError {
    /// The catalog holds no node for the id.
    #[error("Type not found: {node_id}")]
    TypeNotFound {
        /// The node that was requested.
        node_id: String,
    },

    /// A node id string is malformed.
    #[error("Invalid node ID format: '{node_id}' - {reason}")]
    InvalidNodeId {
        /// The offending text.
        node_id: String,
        /// Why parsing failed.
        reason: String,
    },

    /// The catalog failed for another reason.
    #[error("Catalog error for '{node_id}': {message}")]
    Catalog {
        /// The node being fetched, or the catalog source.
        node_id: String,
        /// Error message.
        message: String,
    },

    /// The resolution was cancelled.
    #[error("Resolution cancelled")]
    Cancelled,
}

impl OpcUaError {
    // =========================================================================
    // Factory Methods
    // =========================================================================

    /// Creates a type not found error.
    #[inline]
    pub fn type_not_found(node_id: impl Into<String>) -> Self {
        Self::TypeNotFound {
            node_id: node_id.into(),
        }
    }

    /// Creates an invalid node id error.
    #[inline]
    pub fn invalid_node_id(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNodeId {
            node_id: node_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a catalog error.
    #[inline]
    pub fn catalog(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Catalog {
            node_id: node_id.into(),
            message: message.into(),
        }
    }

    // =========================================================================
    // Error Properties
    // =========================================================================

    /// Catalog failures may be transient; everything else is permanent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Catalog { .. })
    }

    /// Returns the error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::TypeNotFound { .. } => "type_not_found",
            Self::InvalidNodeId { .. } => "invalid_node_id",
            Self::Catalog { .. } => "catalog",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            Self::TypeNotFound { node_id } => {
                format!("이벤트 타입 '{}'을(를) 찾을 수 없습니다.", node_id)
            }
            Self::InvalidNodeId { node_id, .. } => {
                format!("노드 ID 형식이 올바르지 않습니다: {}", node_id)
            }
            Self::Catalog { .. } => "타입 카탈로그를 읽는 중 오류가 발생했습니다.".to_string(),
            Self::Cancelled => "작업이 취소되었습니다.".to_string(),
        }
    }

    /// Returns the tracing level for this error.
    pub fn tracing_level(&self) -> Level {
        match self {
            Self::Cancelled => Level::DEBUG,
            Self::Catalog { .. } => Level::ERROR,
            _ => Level::WARN,
        }
    }

    /// Logs this error with appropriate level and context.
    pub fn log(&self, context: &str) {
        match self.tracing_level() {
            Level::ERROR => tracing::error!(
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            Level::WARN => tracing::warn!(
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            _ => tracing::debug!(category = self.category(), context = context, "{self}"),
        }
    }
}

impl From<OpcUaError> for PublisherError {
    fn from(error: OpcUaError) -> Self {
        match error {
            OpcUaError::TypeNotFound { node_id } => PublisherError::type_not_found(node_id),
            OpcUaError::InvalidNodeId { node_id, reason } => {
                PublisherError::validation("TypeDefinitionId", format!("{}: {}", node_id, reason))
            }
            OpcUaError::Catalog { node_id, message } => PublisherError::TypeNotFound {
                type_id: node_id,
                message: Some(message),
            },
            OpcUaError::Cancelled => PublisherError::Cancelled,
        }
    }
}
