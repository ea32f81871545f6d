//! Signing key material for session tokens and the external provider's
//! verification key.
//!
//! Keys are parsed once, when the service is built, and are read-only
//! afterwards.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use pem::{EncodeConfig, LineEnding, Pem};

use crate::config::{AuthConfig, KeyAlgorithm};
use crate::error::AuthError;

const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

/// Public key of the external identity provider.
#[derive(Clone)]
pub struct ProviderKey {
    pub algorithm: KeyAlgorithm,
    pub decoding: DecodingKey,
}

/// The service's own key pair plus the optional provider key.
#[derive(Clone)]
pub struct KeyMaterial {
    algorithm: KeyAlgorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    /// DER `SubjectPublicKeyInfo` of the service public key.
    public_der: Vec<u8>,
    exter: Option<ProviderKey>,
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("algorithm", &self.algorithm)
            .field("public_der_len", &self.public_der.len())
            .field("exter_key", &self.exter.as_ref().map(|k| k.algorithm))
            .finish_non_exhaustive()
    }
}

impl KeyMaterial {
    /// Parse the PEM keys in `config` and check that the private and
    /// public key belong together.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let algorithm = config.signing_algorithm;
        let private_pem = config.jwt_private_key_pem.as_bytes();
        let public_pem = config.jwt_public_key_pem.as_bytes();

        let encoding = match algorithm {
            KeyAlgorithm::EdDsa => EncodingKey::from_ed_pem(private_pem),
            KeyAlgorithm::Rs256 => EncodingKey::from_rsa_pem(private_pem),
        }
        .map_err(|e| AuthError::Config(format!("bad private key: {e}")))?;

        let decoding = decoding_key(algorithm, public_pem)
            .map_err(|e| AuthError::Config(format!("bad public key: {e}")))?;

        let public_der = parse_public_key_pem(&config.jwt_public_key_pem)?;

        let exter = match config.exter_public_key_pem.as_deref() {
            Some(key_pem) if !key_pem.trim().is_empty() => Some(ProviderKey {
                algorithm: config.exter_key_algorithm,
                decoding: decoding_key(config.exter_key_algorithm, key_pem.as_bytes())
                    .map_err(|e| AuthError::Config(format!("bad exter public key: {e}")))?,
            }),
            _ => None,
        };

        let keys = Self {
            algorithm,
            encoding,
            decoding,
            public_der,
            exter,
        };
        keys.check_pair()?;
        Ok(keys)
    }

    fn check_pair(&self) -> Result<(), AuthError> {
        let alg = self.algorithm.jwt_algorithm();
        let probe = serde_json::json!({ "probe": "tokengate" });
        let token = jsonwebtoken::encode(&Header::new(alg), &probe, &self.encoding)
            .map_err(|e| AuthError::Config(format!("signing key unusable: {e}")))?;

        let mut validation = Validation::new(alg);
        validation.validate_exp = false;
        validation.set_required_spec_claims::<&str>(&[]);
        jsonwebtoken::decode::<serde_json::Value>(&token, &self.decoding, &validation)
            .map(|_| ())
            .map_err(|_| {
                AuthError::Config("configured private and public keys do not match".into())
            })
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }

    pub fn exter_key(&self) -> Option<&ProviderKey> {
        self.exter.as_ref()
    }

    pub fn public_key_der(&self) -> &[u8] {
        &self.public_der
    }

    /// The service public key as a normalized `PUBLIC KEY` PEM block,
    /// for clients and third parties that verify tokens themselves.
    pub fn public_key_pem(&self) -> String {
        let block = Pem::new(PUBLIC_KEY_LABEL, self.public_der.clone());
        pem::encode_config(&block, EncodeConfig::new().set_line_ending(LineEnding::LF))
    }
}

fn decoding_key(
    algorithm: KeyAlgorithm,
    key_pem: &[u8],
) -> Result<DecodingKey, jsonwebtoken::errors::Error> {
    match algorithm {
        KeyAlgorithm::EdDsa => DecodingKey::from_ed_pem(key_pem),
        KeyAlgorithm::Rs256 => DecodingKey::from_rsa_pem(key_pem),
    }
}

/// DER body of a `PUBLIC KEY` PEM block.
fn parse_public_key_pem(text: &str) -> Result<Vec<u8>, AuthError> {
    let block = pem::parse(text.trim())
        .map_err(|e| AuthError::Config(format!("invalid public key PEM: {e}")))?;
    if block.tag() != PUBLIC_KEY_LABEL {
        return Err(AuthError::Config(format!(
            "expected a {PUBLIC_KEY_LABEL} PEM block, found {}",
            block.tag()
        )));
    }
    Ok(block.into_contents())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ED_PRIVATE: &str = include_str!("../tests/fixtures/ed25519_private.pem");
    const ED_PUBLIC: &str = include_str!("../tests/fixtures/ed25519_public.pem");
    const ED_OTHER_PUBLIC: &str = include_str!("../tests/fixtures/ed25519_other_public.pem");
    const RSA_PRIVATE: &str = include_str!("../tests/fixtures/rsa_private.pem");
    const RSA_PUBLIC: &str = include_str!("../tests/fixtures/rsa_public.pem");

    fn ed_config() -> AuthConfig {
        AuthConfig {
            jwt_private_key_pem: ED_PRIVATE.into(),
            jwt_public_key_pem: ED_PUBLIC.into(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn loads_ed25519_pair() {
        let keys = KeyMaterial::from_config(&ed_config()).unwrap();
        assert_eq!(keys.algorithm(), KeyAlgorithm::EdDsa);
        assert!(keys.exter_key().is_none());
        // Ed25519 SPKI is 44 bytes.
        assert_eq!(keys.public_key_der().len(), 44);
    }

    #[test]
    fn loads_rsa_pair_and_provider_key() {
        let config = AuthConfig {
            signing_algorithm: KeyAlgorithm::Rs256,
            jwt_private_key_pem: RSA_PRIVATE.into(),
            jwt_public_key_pem: RSA_PUBLIC.into(),
            exter_public_key_pem: Some(RSA_PUBLIC.into()),
            ..AuthConfig::default()
        };
        let keys = KeyMaterial::from_config(&config).unwrap();
        assert_eq!(keys.algorithm(), KeyAlgorithm::Rs256);
        assert_eq!(keys.exter_key().unwrap().algorithm, KeyAlgorithm::Rs256);
    }

    #[test]
    fn blank_provider_key_means_none() {
        let config = AuthConfig {
            exter_public_key_pem: Some("  \n".into()),
            ..ed_config()
        };
        let keys = KeyMaterial::from_config(&config).unwrap();
        assert!(keys.exter_key().is_none());
    }

    #[test]
    fn mismatched_pair_is_rejected() {
        let config = AuthConfig {
            jwt_public_key_pem: ED_OTHER_PUBLIC.into(),
            ..ed_config()
        };
        let err = KeyMaterial::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("do not match"), "{err}");
    }

    #[test]
    fn wrong_algorithm_is_rejected() {
        let config = AuthConfig {
            signing_algorithm: KeyAlgorithm::Rs256,
            ..ed_config()
        };
        assert!(matches!(
            KeyMaterial::from_config(&config),
            Err(AuthError::Config(_))
        ));
    }

    #[test]
    fn garbage_private_key_is_rejected() {
        let config = AuthConfig {
            jwt_private_key_pem: "not a key".into(),
            ..ed_config()
        };
        assert!(matches!(
            KeyMaterial::from_config(&config),
            Err(AuthError::Config(_))
        ));
    }

    #[test]
    fn public_key_pem_is_normalized() {
        let keys = KeyMaterial::from_config(&ed_config()).unwrap();
        let pem = keys.public_key_pem();
        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----\n"));
        assert!(pem.trim_end().ends_with("-----END PUBLIC KEY-----"));
        assert!(!pem.contains('\r'));
        assert_eq!(pem.trim(), ED_PUBLIC.trim());
    }

    #[test]
    fn long_pem_bodies_wrap_at_64_columns() {
        let config = AuthConfig {
            signing_algorithm: KeyAlgorithm::Rs256,
            jwt_private_key_pem: RSA_PRIVATE.into(),
            jwt_public_key_pem: RSA_PUBLIC.into(),
            ..AuthConfig::default()
        };
        let keys = KeyMaterial::from_config(&config).unwrap();
        let pem = keys.public_key_pem();
        assert!(pem.lines().all(|line| line.len() <= 64));
        assert_eq!(pem.trim(), RSA_PUBLIC.trim());
        assert_eq!(parse_public_key_pem(&pem).unwrap(), keys.public_key_der());
    }

    #[test]
    fn pem_without_footer_is_rejected() {
        let truncated = "-----BEGIN PUBLIC KEY-----\nMCowBQYDK2VwAyEA\n";
        assert!(matches!(
            parse_public_key_pem(truncated),
            Err(AuthError::Config(_))
        ));
    }

    #[test]
    fn public_key_block_label_is_checked() {
        let err = parse_public_key_pem(RSA_PRIVATE).unwrap_err();
        assert!(err.to_string().contains("expected a PUBLIC KEY"), "{err}");
    }
}
