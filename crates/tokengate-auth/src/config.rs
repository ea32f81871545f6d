//! Authentication configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;

/// Asymmetric signature algorithms accepted for session and provider
/// tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyAlgorithm {
    /// Ed25519.
    #[default]
    EdDsa,
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    Rs256,
}

impl KeyAlgorithm {
    pub fn jwt_algorithm(self) -> Algorithm {
        match self {
            KeyAlgorithm::EdDsa => Algorithm::EdDSA,
            KeyAlgorithm::Rs256 => Algorithm::RS256,
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeyAlgorithm::EdDsa => "EdDSA",
            KeyAlgorithm::Rs256 => "RS256",
        })
    }
}

impl FromStr for KeyAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eddsa" | "ed25519" => Ok(KeyAlgorithm::EdDsa),
            "rs256" | "rsa" => Ok(KeyAlgorithm::Rs256),
            other => Err(format!("unsupported key algorithm: {other}")),
        }
    }
}

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Algorithm of the service's own signing key pair.
    pub signing_algorithm: KeyAlgorithm,
    /// PEM-encoded private key for session token signing.
    pub jwt_private_key_pem: String,
    /// PEM-encoded public key matching `jwt_private_key_pem`.
    pub jwt_public_key_pem: String,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Lifetime of sessions opened through the form channel, in seconds
    /// (default: 3600).
    pub form_session_lifetime_secs: u64,
    /// PEM-encoded public key of the external identity provider.
    /// `None` makes every external login fail closed.
    pub exter_public_key_pem: Option<String>,
    /// Algorithm the external provider signs its tokens with.
    pub exter_key_algorithm: KeyAlgorithm,
    /// Upper bound for one round-trip to the external provider
    /// (default: 10 seconds).
    pub exter_timeout: Duration,
    /// Log decoded token contents (ids, names, timestamps) at debug level.
    pub debug_token_logging: bool,
    /// Pass the provider's rejection message on to the caller. Off by
    /// default: callers then only see the provider status, and the
    /// message goes to the log.
    pub expose_exter_errors: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_algorithm: KeyAlgorithm::EdDsa,
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            jwt_issuer: "tokengate".into(),
            form_session_lifetime_secs: 3600,
            exter_public_key_pem: None,
            exter_key_algorithm: KeyAlgorithm::Rs256,
            exter_timeout: Duration::from_secs(10),
            debug_token_logging: false,
            expose_exter_errors: false,
        }
    }
}
