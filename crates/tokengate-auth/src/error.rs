//! Authentication error types.

use thiserror::Error;
use tokengate_core::error::GateError;

/// Message shared by every failed form login, whatever check failed.
pub const LOGIN_FAILED: &str = "login failed";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("empty username")]
    EmptyUsername,

    #[error("empty token")]
    EmptyToken,

    #[error("login failed")]
    LoginFailed,

    #[error("expired")]
    TokenExpired,

    #[error("{0}")]
    TokenInvalid(String),

    #[error("Exter login is not enabled")]
    ExterDisabled,

    /// The provider refused the token. `message` is the provider's own
    /// text, present only when provider errors may reach the caller.
    #[error("Exter login failed ({status}){}", provider_detail(.message))]
    ExterRejected {
        status: i64,
        message: Option<String>,
    },

    /// The provider key is missing so its answer cannot be trusted.
    #[error("Exter login failed, please retry")]
    ExterKeyMissing,

    #[error("Exter login failed, please retry")]
    ExterNotLoginToken,

    #[error("{0}")]
    ExterTokenInvalid(String),

    #[error("can not create user account, please try again")]
    AccountUnavailable,

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Crypto(String),

    #[error("{0}")]
    Config(String),
}

fn provider_detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

impl From<AuthError> for GateError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmptyUsername | AuthError::EmptyToken => GateError::Validation {
                message: err.to_string(),
            },
            AuthError::LoginFailed
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_)
            | AuthError::ExterRejected { .. }
            | AuthError::ExterNotLoginToken => GateError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::ExterDisabled | AuthError::ExterKeyMissing | AuthError::Config(_) => {
                GateError::Configuration(err.to_string())
            }
            AuthError::AccountUnavailable => GateError::Internal(err.to_string()),
            AuthError::ExterTokenInvalid(msg) | AuthError::Crypto(msg) => GateError::Crypto(msg),
            AuthError::Transport(msg) => GateError::Transport(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokengate_core::error::ErrorCategory;

    fn category(err: AuthError) -> (ErrorCategory, String) {
        let gate = GateError::from(err);
        (gate.category(), gate.to_string())
    }

    #[test]
    fn client_errors() {
        assert_eq!(
            category(AuthError::EmptyUsername),
            (ErrorCategory::Client, "empty username".into())
        );
        assert_eq!(
            category(AuthError::EmptyToken),
            (ErrorCategory::Client, "empty token".into())
        );
    }

    #[test]
    fn permission_errors() {
        assert_eq!(
            category(AuthError::LoginFailed),
            (ErrorCategory::NoPermission, LOGIN_FAILED.into())
        );
        assert_eq!(
            category(AuthError::TokenExpired),
            (ErrorCategory::NoPermission, "expired".into())
        );
        assert_eq!(
            category(AuthError::ExterRejected {
                status: 403,
                message: Some("token revoked".into())
            }),
            (
                ErrorCategory::NoPermission,
                "Exter login failed (403): token revoked".into()
            )
        );
        assert_eq!(
            category(AuthError::ExterRejected {
                status: 403,
                message: None
            }),
            (ErrorCategory::NoPermission, "Exter login failed (403)".into())
        );
    }

    #[test]
    fn server_errors() {
        assert_eq!(
            category(AuthError::ExterDisabled),
            (ErrorCategory::Server, "Exter login is not enabled".into())
        );
        assert_eq!(category(AuthError::ExterKeyMissing).0, ErrorCategory::Server);
        assert_eq!(
            category(AuthError::Transport("connection refused".into())),
            (ErrorCategory::Server, "connection refused".into())
        );
        assert_eq!(category(AuthError::AccountUnavailable).0, ErrorCategory::Server);
    }
}
