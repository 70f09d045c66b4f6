//! Error types for store operations
//!
//! Store errors are categorized so callers can tell a missing object (the
//! normal "create it" path) apart from a lost optimistic-lock race or an
//! unreachable backend.

use crate::meta::ObjectKey;
use std::fmt;
use thiserror::Error;

/// Errors returned by a [`ResourceStore`](crate::ResourceStore)
#[derive(Debug, Error)]
pub enum StoreError {
    /// No object is stored under the key
    #[error("{key} not found")]
    NotFound { key: ObjectKey },

    /// Create was called for a key that is already taken
    #[error("{key} already exists")]
    AlreadyExists { key: ObjectKey },

    /// The caller's version token is stale
    #[error("conflict on {key}: expected resource version {expected}, found {actual}")]
    Conflict {
        key: ObjectKey,
        expected: String,
        actual: String,
    },

    /// The object could not be encoded, decoded or addressed
    #[error("invalid object {key}: {message}")]
    Invalid { key: ObjectKey, message: String },

    /// The backend refused or failed the request
    #[error("store unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    pub fn not_found(key: ObjectKey) -> Self {
        Self::NotFound { key }
    }

    pub fn invalid(key: ObjectKey, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::AlreadyExists { .. })
    }

    /// Error category for logging and requeue decisions
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::AlreadyExists { .. } | Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::Invalid { .. } => ErrorCategory::Invalid,
            Self::Unavailable { .. } => ErrorCategory::Unavailable,
        }
    }
}

/// Coarse classification of store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    NotFound,
    Conflict,
    Invalid,
    Unavailable,
}

impl ErrorCategory {
    /// Whether a later pass can be expected to succeed without input changes
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Conflict | Self::Unavailable)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Invalid => write!(f, "invalid"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
