//! Client for the external identity provider ("exter").
//!
//! The provider is a black box: it receives the token a user obtained
//! from it, and answers with a status, a message and, on success, a
//! freshly re-issued token signed with the provider's key.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{Instrument, debug, info_span};
use url::Url;

use crate::error::AuthError;

/// Status the provider reports for an accepted token.
pub const EXTER_STATUS_OK: i64 = 200;

/// Answer of the provider to a verification request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExterResponse {
    pub status: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ExterResponse {
    pub fn is_success(&self) -> bool {
        self.status == EXTER_STATUS_OK
    }

    /// The re-issued provider token carried in `data`.
    pub fn reissued_token(&self) -> Option<&str> {
        self.data.as_ref().and_then(Value::as_str)
    }
}

/// Verifies externally issued login tokens.
pub trait ExterVerifier: Send + Sync {
    /// Transport and protocol failures are returned as
    /// [`AuthError::Transport`]; a rejection by the provider is an `Ok`
    /// response with a non-success status.
    fn verify_login_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<ExterResponse, AuthError>> + Send;
}

#[derive(Debug, Clone)]
pub struct ExterClientConfig {
    /// Base URL of the provider, e.g. `https://exter.example.com`.
    pub base_url: String,
    /// Id this service is registered under at the provider.
    pub app_id: String,
    /// Per-request timeout (default: 10 seconds).
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ExterClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            app_id: String::new(),
            timeout: Duration::from_secs(10),
            user_agent: concat!("tokengate/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

/// HTTP implementation of [`ExterVerifier`].
#[derive(Debug, Clone)]
pub struct ExterClient {
    client: reqwest::Client,
    base_url: Url,
    endpoint: Url,
    app_id: String,
}

impl ExterClient {
    pub const VERIFY_LOGIN_TOKEN_PATH: &'static str = "api/verifyLoginToken";

    pub fn new(config: &ExterClientConfig) -> Result<Self, AuthError> {
        let mut base_url = Url::parse(config.base_url.trim())
            .map_err(|e| AuthError::Config(format!("invalid exter base URL: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(AuthError::Config(format!(
                "unsupported exter URL scheme: {}",
                base_url.scheme()
            )));
        }
        // Keep any path prefix of the base URL when joining.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let endpoint = base_url
            .join(Self::VERIFY_LOGIN_TOKEN_PATH)
            .map_err(|e| AuthError::Config(format!("invalid exter base URL: {e}")))?;

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| AuthError::Config(format!("exter HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            endpoint,
            app_id: config.app_id.clone(),
        })
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn transport_error(err: reqwest::Error) -> AuthError {
    if err.is_timeout() {
        AuthError::Transport(format!("exter request timed out: {err}"))
    } else {
        AuthError::Transport(format!("exter request failed: {err}"))
    }
}

impl ExterVerifier for ExterClient {
    async fn verify_login_token(&self, token: &str) -> Result<ExterResponse, AuthError> {
        let span = info_span!(
            "exter.verify_login_token",
            http.method = "POST",
            url = %self.endpoint
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&json!({ "app": self.app_id, "token": token }))
            .send()
            .instrument(span)
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match body.trim() {
                "" => status.canonical_reason().unwrap_or("error").to_string(),
                text => text.to_string(),
            };
            debug!(status = status.as_u16(), "exter answered with HTTP error");
            return Ok(ExterResponse {
                status: i64::from(status.as_u16()),
                message,
                data: None,
            });
        }

        response
            .json::<ExterResponse>()
            .await
            .map_err(|e| AuthError::Transport(format!("invalid exter response: {e}")))
    }
}
