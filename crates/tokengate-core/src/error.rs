//! Error types for the tokengate system.

use thiserror::Error;

/// Boundary error returned by every tokengate operation.
///
/// Messages of the authentication variants are shown to callers as-is,
/// so they carry no prefix.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("{reason}")]
    AuthenticationFailed { reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Crypto(String),

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Internal(String),
}

/// The three outcomes a caller can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed or missing input; the client must fix the request.
    Client,
    /// Authentication failed.
    NoPermission,
    /// Internal failure: crypto, network, configuration or a dependency.
    Server,
}

impl GateError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GateError::Validation { .. } | GateError::AlreadyExists { .. } => ErrorCategory::Client,
            GateError::AuthenticationFailed { .. } => ErrorCategory::NoPermission,
            GateError::NotFound { .. }
            | GateError::Storage(_)
            | GateError::Crypto(_)
            | GateError::Transport(_)
            | GateError::Configuration(_)
            | GateError::Internal(_) => ErrorCategory::Server,
        }
    }
}

pub type GateResult<T> = Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_message_has_no_prefix() {
        let err = GateError::AuthenticationFailed {
            reason: "login failed".into(),
        };
        assert_eq!(err.to_string(), "login failed");
        assert_eq!(err.category(), ErrorCategory::NoPermission);
    }

    #[test]
    fn categories() {
        let client = GateError::Validation {
            message: "empty token".into(),
        };
        assert_eq!(client.category(), ErrorCategory::Client);
        assert_eq!(
            GateError::Transport("timed out".into()).category(),
            ErrorCategory::Server
        );
        assert_eq!(
            GateError::NotFound {
                entity: "user".into(),
                id: "u1".into()
            }
            .category(),
            ErrorCategory::Server
        );
    }
}
