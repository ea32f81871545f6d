//! Session token claims and the JWT codec.
//!
//! Session tokens are compact JWS strings signed with the service's
//! private key, so anyone holding the public key can check them without
//! calling back into the service.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Header, Validation};
use serde::{Deserialize, Serialize};
use tokengate_core::models::exter::ExterToken;
use tokengate_core::models::session::{Channel, Session};

use crate::error::AuthError;
use crate::keys::KeyMaterial;

/// JWT claims embedded in every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Id of the request context the session was issued to.
    pub jti: String,
    /// Issuer.
    pub iss: String,
    /// Subject: user id.
    pub sub: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Login channel.
    pub chl: Channel,
    /// Display name of the user.
    pub name: String,
    /// Base64url (no padding) of the session's opaque payload.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data: String,
}

impl SessionClaims {
    pub fn from_session(session: &Session, issuer: &str) -> Self {
        Self {
            jti: session.client_ref.clone(),
            iss: issuer.to_string(),
            sub: session.user_id.clone(),
            iat: session.created_at.timestamp(),
            exp: session.expired_at.timestamp(),
            chl: session.channel,
            name: session.display_name.clone(),
            data: URL_SAFE_NO_PAD.encode(&session.data),
        }
    }

    pub fn data_bytes(&self) -> Result<Vec<u8>, AuthError> {
        URL_SAFE_NO_PAD
            .decode(&self.data)
            .map_err(|e| AuthError::TokenInvalid(format!("invalid data claim: {e}")))
    }

    /// Rebuild the session these claims were minted from. Timestamps
    /// carry second precision.
    pub fn to_session(&self) -> Result<Session, AuthError> {
        let timestamp = |secs: i64| {
            DateTime::<Utc>::from_timestamp(secs, 0)
                .ok_or_else(|| AuthError::TokenInvalid(format!("timestamp out of range: {secs}")))
        };
        Ok(Session {
            client_ref: self.jti.clone(),
            channel: self.chl,
            user_id: self.sub.clone(),
            display_name: self.name.clone(),
            created_at: timestamp(self.iat)?,
            expired_at: timestamp(self.exp)?,
            data: self.data_bytes()?,
        })
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }
}

/// Signs and decodes session tokens, and decodes tokens re-issued by
/// the external provider.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    keys: KeyMaterial,
    issuer: String,
}

impl TokenCodec {
    pub fn new(keys: KeyMaterial, issuer: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
        }
    }

    pub fn keys(&self) -> &KeyMaterial {
        &self.keys
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn sign(&self, claims: &SessionClaims) -> Result<String, AuthError> {
        let header = Header::new(self.keys.algorithm().jwt_algorithm());
        jsonwebtoken::encode(&header, claims, self.keys.encoding_key())
            .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
    }

    /// Verify the signature and structure of a session token.
    ///
    /// Expiry is not checked; see [`SessionClaims::is_expired`].
    pub fn decode(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(self.keys.algorithm().jwt_algorithm());
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

        jsonwebtoken::decode::<SessionClaims>(token, self.keys.decoding_key(), &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::TokenInvalid(e.to_string()))
    }

    /// Verify a token re-issued by the external provider with the
    /// provider's public key. Expired provider tokens are rejected.
    pub fn decode_exter(&self, token: &str) -> Result<ExterToken, AuthError> {
        let key = self.keys.exter_key().ok_or(AuthError::ExterKeyMissing)?;

        let mut validation = Validation::new(key.algorithm.jwt_algorithm());
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        jsonwebtoken::decode::<ExterToken>(token, &key.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::ExterTokenInvalid(format!("invalid exter token: {e}")))
    }
}
