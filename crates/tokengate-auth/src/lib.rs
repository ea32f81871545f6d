//! tokengate auth: form and external-provider login, session token
//! signing, and token verification.

pub mod config;
pub mod error;
pub mod exter;
pub mod keys;
pub mod password;
pub mod service;
pub mod token;

pub use config::{AuthConfig, KeyAlgorithm};
pub use error::AuthError;
pub use exter::{ExterClient, ExterClientConfig, ExterResponse, ExterVerifier};
pub use keys::KeyMaterial;
pub use service::{AuthService, Credentials, LoginInput};
pub use token::{SessionClaims, TokenCodec};
