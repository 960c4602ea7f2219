//! Search index error types.
//!
//! This module defines the unified error type for all search index operations,
//! distinguishing an unreachable backend from a backend that answered with a
//! rejection.

use thiserror::Error;

/// Unified errors from search index operations.
///
/// Used by the `SearchIndexProvider` trait for all index lifecycle and document
/// operations. `ConnectionError` is the only variant that means the backend
/// could not be reached at all; callers retry on it during bootstrap.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// Invalid input or configuration (e.g., malformed URL).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The search index backend could not be reached (refused, DNS, timeout).
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The backend answered with a non-success status.
    #[error("{operation} rejected with status {status}: {body}")]
    Rejected {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// Failed to serialize data for the search index backend.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Failed to read an index definition document.
    #[error("Definition error: {0}")]
    DefinitionError(String),
}

impl SearchIndexError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a rejection error for `operation`.
    pub fn rejected(operation: &'static str, status: u16, body: impl Into<String>) -> Self {
        Self::Rejected {
            operation,
            status,
            body: body.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a definition error.
    pub fn definition(msg: impl Into<String>) -> Self {
        Self::DefinitionError(msg.into())
    }

    /// Whether the backend was unreachable rather than rejecting the request.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::ConnectionError(_))
    }
}
