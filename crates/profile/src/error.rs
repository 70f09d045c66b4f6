//! Error types for profile reconciliation.
//!
//! Every error aborts the pass it occurs in. [`Error::category`] tells the
//! scheduler whether running the pass again can help without the inputs
//! changing.

use apis::{UnknownKindError, ValidationError};
use declarative::{ErrorCategory, SchemeError, StoreError, Verb};
use thiserror::Error;

/// Boxed error returned by injected collaborators
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while reconciling a profile instance
#[derive(Debug, Error)]
pub enum Error {
    /// An artifact declared more than one content source
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An artifact kind outside HelmChart and Kustomize
    #[error(transparent)]
    UnknownKind(#[from] UnknownKindError),

    /// Two different repositories map to the same git repository name
    #[error("git repository name {name} is shared by {first} and {second}")]
    NameCollision {
        name: String,
        first: String,
        second: String,
    },

    /// The owner or a child kind is not registered
    #[error("failed to set resource ownership: {0}")]
    Ownership(#[source] SchemeError),

    /// A store call for a child or the instance failed
    #[error("failed to {verb} {kind} {name}: {source}")]
    Store {
        verb: Verb,
        kind: String,
        name: String,
        #[source]
        source: StoreError,
    },

    /// Writing the aggregate condition onto the instance failed
    #[error("failed to patch status of {name}: {source}")]
    StatusPatch {
        name: String,
        #[source]
        source: StoreError,
    },

    /// The profile definition could not be retrieved
    #[error("failed to fetch profile definition from {url} at {branch}: {source}")]
    Definition {
        url: String,
        branch: String,
        #[source]
        source: BoxError,
    },
}

impl Error {
    /// Store error category, for errors raised by a store call
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Store { source, .. } | Self::StatusPatch { source, .. } => {
                Some(source.category())
            }
            _ => None,
        }
    }

    /// Whether a later pass can be expected to succeed with the same inputs
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Definition { .. } => true,
            _ => self.category().is_some_and(|c| c.is_transient()),
        }
    }
}

impl From<declarative::ConvergeError> for Error {
    fn from(e: declarative::ConvergeError) -> Self {
        Self::Store {
            verb: e.verb,
            kind: e.key.kind,
            name: e.key.name,
            source: e.source,
        }
    }
}

/// Result type for profile operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::ObjectKey;

    #[test]
    fn test_store_error_names_kind_and_name() {
        let err = Error::from(declarative::ConvergeError {
            verb: Verb::Create,
            key: ObjectKey::new("GitRepository", "default", "mySub-repo-main"),
            source: StoreError::unavailable("connection refused"),
        });
        assert_eq!(
            err.to_string(),
            "failed to create GitRepository mySub-repo-main: store unavailable: connection refused"
        );
        assert!(err.is_transient());
    }

    #[test]
    fn test_ownership_message() {
        let err = Error::Ownership(SchemeError::Unregistered {
            kind: "ProfileInstance".into(),
        });
        assert_eq!(
            err.to_string(),
            "failed to set resource ownership: no kind is registered for the type ProfileInstance in scheme"
        );
        assert!(!err.is_transient());
        assert_eq!(err.category(), None);
    }

    #[test]
    fn test_validation_is_not_transient() {
        let err = Error::from(ValidationError {
            artifact: "a".into(),
            first: "chart",
            second: "path",
        });
        assert!(!err.is_transient());
        assert!(err.to_string().starts_with("validation failed for artifact a"));
    }
}
