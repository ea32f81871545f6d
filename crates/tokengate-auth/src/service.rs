//! Authentication service: login and token verification.
//!
//! The service keeps no session table. A successful login builds a
//! [`Session`], signs it into a token and forgets it; the token held by
//! the client is the only copy.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use tokengate_core::error::{ErrorCategory, GateError, GateResult};
use tokengate_core::models::exter::ExterToken;
use tokengate_core::models::session::{Channel, Session};
use tokengate_core::models::user::User;
use tokengate_core::repository::UserRepository;
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::exter::{ExterClient, ExterVerifier};
use crate::keys::KeyMaterial;
use crate::password;
use crate::token::{SessionClaims, TokenCodec};

/// What the client presented to log in.
#[derive(Clone)]
pub enum Credentials {
    Form { username: String, password: String },
    Exter { token: String },
}

impl Credentials {
    pub fn channel(&self) -> Channel {
        match self {
            Credentials::Form { .. } => Channel::Form,
            Credentials::Exter { .. } => Channel::Exter,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Form { username, .. } => f
                .debug_struct("Form")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::Exter { .. } => f
                .debug_struct("Exter")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

/// Input for the login flow.
#[derive(Debug, Clone)]
pub struct LoginInput {
    /// Id of the request context; becomes the token's `jti`.
    pub client_ref: String,
    pub credentials: Credentials,
}

/// Authentication service.
///
/// Generic over the user repository and the external verifier so that
/// the auth layer has no dependency on a concrete store or transport.
pub struct AuthService<U: UserRepository, X: ExterVerifier = ExterClient> {
    user_repo: U,
    exter: Option<X>,
    codec: TokenCodec,
    form_lifetime: TimeDelta,
    /// Argon2id hash checked in place of a missing or cheap stored hash,
    /// so every rejected form login costs one Argon2 verification.
    dummy_hash: String,
    config: AuthConfig,
}

const DUMMY_PASSWORD: &str = "tokengate-dummy-password";

impl<U: UserRepository> AuthService<U, ExterClient> {
    /// Build a service with external login disabled. Keys are parsed
    /// and checked here.
    pub fn new(user_repo: U, config: AuthConfig) -> Result<Self, AuthError> {
        if config.form_session_lifetime_secs == 0 {
            return Err(AuthError::Config(
                "form session lifetime must be positive".into(),
            ));
        }
        let form_lifetime = i64::try_from(config.form_session_lifetime_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| AuthError::Config("form session lifetime out of range".into()))?;

        let keys = KeyMaterial::from_config(&config)?;
        let codec = TokenCodec::new(keys, config.jwt_issuer.clone());
        let dummy_hash = password::hash_password("", DUMMY_PASSWORD)?;

        info!(
            algorithm = %config.signing_algorithm,
            issuer = %config.jwt_issuer,
            exter_key = codec.keys().exter_key().is_some(),
            "Authentication service initialized"
        );

        Ok(Self {
            user_repo,
            exter: None,
            codec,
            form_lifetime,
            dummy_hash,
            config,
        })
    }
}

impl<U: UserRepository, X: ExterVerifier> AuthService<U, X> {
    /// Enable external login through `exter`.
    pub fn with_exter<Y: ExterVerifier>(self, exter: Y) -> AuthService<U, Y> {
        AuthService {
            user_repo: self.user_repo,
            exter: Some(exter),
            codec: self.codec,
            form_lifetime: self.form_lifetime,
            dummy_hash: self.dummy_hash,
            config: self.config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn exter(&self) -> Option<&X> {
        self.exter.as_ref()
    }

    /// PEM-encoded public key that verifies every token this service
    /// issues.
    pub fn public_key_pem(&self) -> String {
        self.codec.keys().public_key_pem()
    }

    /// Authenticate through the channel selected by `input.credentials`
    /// and return a signed session token.
    pub async fn login(&self, input: LoginInput) -> GateResult<String> {
        match input.credentials {
            Credentials::Form { username, password } => {
                self.login_form(&input.client_ref, &username, &password)
                    .await
            }
            Credentials::Exter { token } => self.login_exter(&input.client_ref, &token).await,
        }
    }

    /// Username/password login.
    ///
    /// Every authentication failure yields the same
    /// [`AuthError::LoginFailed`], so callers cannot tell an unknown
    /// username from a wrong password.
    pub async fn login_form(
        &self,
        client_ref: &str,
        username: &str,
        password: &str,
    ) -> GateResult<String> {
        // 1. Validate input.
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::EmptyUsername.into());
        }
        if password.trim().is_empty() {
            return Err(self.reject_form(client_ref));
        }

        // 2. Look up user.
        let user = self
            .user_repo
            .get_by_username(username)
            .await
            .map_err(as_server_error)?;

        // 3. Verify password, salted with the user's id.
        if !self.check_password(user.as_ref(), password)? {
            return Err(self.reject_form(client_ref));
        }
        let Some(user) = user else {
            return Err(self.reject_form(client_ref));
        };

        // 4. Build the session and sign it.
        let now = Utc::now();
        let session = Session {
            client_ref: client_ref.to_string(),
            channel: Channel::Form,
            user_id: user.id,
            display_name: user.display_name,
            created_at: now,
            expired_at: now + self.form_lifetime,
            data: Vec::new(),
        };
        let token = self.mint(&session)?;

        info!(client_ref, user_id = %session.user_id, channel = %Channel::Form, "Login succeeded");
        Ok(token)
    }

    /// Unknown users and users without an Argon2 hash also pay for one
    /// Argon2 verification against the dummy hash.
    fn check_password(&self, user: Option<&User>, password: &str) -> Result<bool, AuthError> {
        match user {
            Some(user) if password::is_argon2_hash(&user.password_hash) => {
                password::verify_password(&user.id, password, &user.password_hash)
            }
            Some(user) => {
                self.burn_dummy_verification(password);
                password::verify_password(&user.id, password, &user.password_hash)
            }
            None => {
                self.burn_dummy_verification(password);
                Ok(false)
            }
        }
    }

    fn burn_dummy_verification(&self, password: &str) {
        if let Err(e) = password::verify_password("", password, &self.dummy_hash) {
            debug!(error = %e, "Dummy password verification failed");
        }
    }

    fn reject_form(&self, client_ref: &str) -> GateError {
        warn!(client_ref, channel = %Channel::Form, "Login rejected");
        AuthError::LoginFailed.into()
    }

    /// Login with a token issued by the external identity provider.
    ///
    /// The provider must confirm the token and hand back a re-issued one,
    /// which is verified locally with the provider's public key before a
    /// session is opened. The session expires when the provider token
    /// does.
    pub async fn login_exter(&self, client_ref: &str, token: &str) -> GateResult<String> {
        // 1. Validate input.
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::EmptyToken.into());
        }
        if self.config.debug_token_logging && self.codec.keys().exter_key().is_some() {
            self.debug_exter_token("submitted", &self.codec.decode_exter(token));
        }

        // 2. Round-trip to the provider.
        let Some(exter) = &self.exter else {
            return Err(AuthError::ExterDisabled.into());
        };
        let response = tokio::time::timeout(
            self.config.exter_timeout,
            exter.verify_login_token(token),
        )
        .await
        .map_err(|_| {
            AuthError::Transport(format!(
                "exter verification timed out after {:?}",
                self.config.exter_timeout
            ))
        })??;

        if !response.is_success() {
            warn!(
                client_ref,
                status = response.status,
                provider_message = %response.message,
                channel = %Channel::Exter,
                "Login rejected by identity provider"
            );
            return Err(AuthError::ExterRejected {
                status: response.status,
                message: self
                    .config
                    .expose_exter_errors
                    .then_some(response.message),
            }
            .into());
        }

        // 3. Verify the re-issued token with the provider key.
        let reissued = response.reissued_token().unwrap_or_default();
        let decoded = self.codec.decode_exter(reissued);
        if self.config.debug_token_logging {
            self.debug_exter_token("returned", &decoded);
        }
        let exter_token = decoded?;
        if !exter_token.is_login() {
            warn!(
                client_ref,
                token_type = %exter_token.token_type,
                channel = %Channel::Exter,
                "Login rejected: not a login token"
            );
            return Err(AuthError::ExterNotLoginToken.into());
        }
        let created_at = Utc::now();
        let expired_at = exter_session_expiry(exter_token.expires_at, created_at)?;

        // 4. Resolve or create the local account.
        let user = self
            .user_repo
            .create_from_exter_token(&exter_token)
            .await
            .map_err(as_server_error)?
            .ok_or(AuthError::AccountUnavailable)?;

        // 5. Build the session and sign it.
        let session = Session {
            client_ref: client_ref.to_string(),
            channel: Channel::Exter,
            user_id: user.id,
            display_name: user.display_name,
            created_at,
            expired_at,
            data: reissued.as_bytes().to_vec(),
        };
        let token = self.mint(&session)?;

        info!(client_ref, user_id = %session.user_id, channel = %Channel::Exter, "Login succeeded");
        Ok(token)
    }

    /// Check a session token and hand back a freshly signed copy.
    ///
    /// The claims are re-signed unchanged: this proves the session is
    /// alive, it does not extend it.
    pub async fn verify_login_token(&self, token: &str) -> GateResult<String> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::EmptyToken.into());
        }

        let claims = self.codec.decode(token)?;
        if self.config.debug_token_logging {
            debug!(
                client_ref = %claims.jti,
                user_id = %claims.sub,
                name = %claims.name,
                channel = %claims.chl,
                iat = claims.iat,
                exp = claims.exp,
                "Decoded session token"
            );
        }
        if claims.is_expired() {
            return Err(AuthError::TokenExpired.into());
        }

        Ok(self.codec.sign(&claims)?)
    }

    fn mint(&self, session: &Session) -> Result<String, AuthError> {
        let claims = SessionClaims::from_session(session, self.codec.issuer());
        self.codec.sign(&claims)
    }

    fn debug_exter_token(&self, stage: &'static str, decoded: &Result<ExterToken, AuthError>) {
        match decoded {
            Ok(token) => debug!(
                stage,
                id = %token.id,
                token_type = %token.token_type,
                app_id = %token.app_id,
                user_id = %token.user_id,
                user_name = %token.user_name,
                expires_at = token.expires_at,
                "Exter token"
            ),
            Err(e) => debug!(stage, error = %e, "Exter token could not be decoded"),
        }
    }
}

/// Expiry of a session opened with a provider token that expires at
/// `expires_at` (unix seconds). The session must outlive `created_at`.
fn exter_session_expiry(
    expires_at: i64,
    created_at: DateTime<Utc>,
) -> Result<DateTime<Utc>, AuthError> {
    let expired_at = DateTime::<Utc>::from_timestamp(expires_at, 0).ok_or_else(|| {
        AuthError::ExterTokenInvalid(format!("expiry out of range: {expires_at}"))
    })?;
    if expired_at <= created_at {
        return Err(AuthError::TokenExpired);
    }
    Ok(expired_at)
}

/// Failures of collaborators are server-side whatever they report.
fn as_server_error(err: GateError) -> GateError {
    match err.category() {
        ErrorCategory::Server => err,
        _ => GateError::Internal(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exter_expiry_must_follow_creation() {
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();

        assert!(matches!(
            exter_session_expiry(now.timestamp(), now),
            Err(AuthError::TokenExpired)
        ));
        assert!(matches!(
            exter_session_expiry(now.timestamp() - 1, now),
            Err(AuthError::TokenExpired)
        ));
        assert_eq!(
            exter_session_expiry(now.timestamp() + 1, now).unwrap(),
            now + TimeDelta::seconds(1)
        );
    }

    #[test]
    fn exter_expiry_out_of_range() {
        let err = exter_session_expiry(i64::MAX, Utc::now()).unwrap_err();
        assert!(matches!(err, AuthError::ExterTokenInvalid(_)));
    }

    #[test]
    fn credentials_debug_hides_secrets() {
        let form = Credentials::Form {
            username: "alice".into(),
            password: "hunter2".into(),
        };
        let exter = Credentials::Exter {
            token: "raw.provider.token".into(),
        };
        assert!(!format!("{form:?}").contains("hunter2"));
        assert!(!format!("{exter:?}").contains("raw.provider.token"));
    }
}
