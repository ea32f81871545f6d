//! API handlers: `info`, `login` and `verifyLoginToken`.
//!
//! Handlers never fail; every outcome is an [`ApiResult`] envelope whose
//! status follows the error category.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokengate_auth::exter::{ExterClient, ExterVerifier};
use tokengate_auth::service::{AuthService, Credentials, LoginInput};
use tokengate_core::error::{ErrorCategory, GateError};
use tokengate_core::models::session::Channel;
use tokengate_core::repository::UserRepository;
use tracing::{debug, error};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u16")]
pub enum ApiStatus {
    Ok,
    ErrorClient,
    NoPermission,
    ErrorServer,
}

impl ApiStatus {
    pub fn code(self) -> u16 {
        match self {
            ApiStatus::Ok => 200,
            ApiStatus::ErrorClient => 400,
            ApiStatus::NoPermission => 403,
            ApiStatus::ErrorServer => 500,
        }
    }
}

impl From<ApiStatus> for u16 {
    fn from(status: ApiStatus) -> Self {
        status.code()
    }
}

impl From<ErrorCategory> for ApiStatus {
    fn from(category: ErrorCategory) -> Self {
        match category {
            ErrorCategory::Client => ApiStatus::ErrorClient,
            ErrorCategory::NoPermission => ApiStatus::NoPermission,
            ErrorCategory::Server => ApiStatus::ErrorServer,
        }
    }
}

/// Response envelope shared by every API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResult {
    pub status: ApiStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiResult {
    pub fn ok(data: Value) -> Self {
        Self {
            status: ApiStatus::Ok,
            message: None,
            data: Some(data),
        }
    }

    pub fn from_error(err: &GateError) -> Self {
        Self {
            status: err.category().into(),
            message: Some(err.to_string()),
            data: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ApiStatus::Ok
    }

    /// The `data` payload when it is a string, e.g. an issued token.
    pub fn data_str(&self) -> Option<&str> {
        self.data.as_ref().and_then(Value::as_str)
    }
}

/// Per-request context. Its id becomes the `client_ref` of sessions
/// opened during the request.
#[derive(Debug, Clone)]
pub struct ApiContext {
    pub id: String,
}

impl ApiContext {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
        }
    }
}

impl Default for ApiContext {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiName {
    Info,
    Login,
    VerifyLoginToken,
}

impl ApiName {
    pub const ALL: [ApiName; 3] = [ApiName::Info, ApiName::Login, ApiName::VerifyLoginToken];

    pub fn as_str(self) -> &'static str {
        match self {
            ApiName::Info => "info",
            ApiName::Login => "login",
            ApiName::VerifyLoginToken => "verifyLoginToken",
        }
    }

    /// Public APIs can be called without a registered app id.
    pub fn is_public(self) -> bool {
        matches!(self, ApiName::Info | ApiName::VerifyLoginToken)
    }
}

impl fmt::Display for ApiName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of the `login` API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginParams {
    pub mode: String,
    pub username: String,
    pub password: String,
    pub token: String,
}

impl LoginParams {
    /// Pick the channel from `mode`; anything but `exter` is a form login.
    pub fn into_input(self, ctx: &ApiContext) -> LoginInput {
        let credentials = match Channel::from_mode(&self.mode) {
            Channel::Exter => Credentials::Exter {
                token: self.token.trim().to_string(),
            },
            Channel::Form => Credentials::Form {
                username: self.username.trim().to_string(),
                password: self.password.trim().to_string(),
            },
        };
        LoginInput {
            client_ref: ctx.id.clone(),
            credentials,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VerifyParams {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppInfo {
    pub name: String,
    pub shortname: String,
    pub version: String,
    pub description: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").into(),
            shortname: "tokengate".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            description: env!("CARGO_PKG_DESCRIPTION").into(),
        }
    }
}

/// Provider settings shown by `info`. Empty when exter login is off.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExterInfo {
    pub app_id: String,
    pub base_url: String,
}

impl From<&ExterClient> for ExterInfo {
    fn from(client: &ExterClient) -> Self {
        Self {
            app_id: client.app_id().to_string(),
            base_url: client.base_url().to_string(),
        }
    }
}

pub struct Api<U: UserRepository, X: ExterVerifier = ExterClient> {
    auth: Arc<AuthService<U, X>>,
    app: AppInfo,
    exter: ExterInfo,
}

impl<U: UserRepository, X: ExterVerifier> Api<U, X> {
    pub fn new(auth: Arc<AuthService<U, X>>, app: AppInfo, exter: ExterInfo) -> Self {
        Self { auth, app, exter }
    }

    pub fn auth(&self) -> &Arc<AuthService<U, X>> {
        &self.auth
    }

    pub fn info(&self, _ctx: &ApiContext) -> ApiResult {
        ApiResult::ok(json!({
            "app": self.app,
            "exter": self.exter,
            "public_key": self.auth.public_key_pem(),
        }))
    }

    pub async fn login(&self, ctx: &ApiContext, params: LoginParams) -> ApiResult {
        let input = params.into_input(ctx);
        let channel = input.credentials.channel();
        debug!(request_id = %ctx.id, api = %ApiName::Login, %channel, "API call");
        match self.auth.login(input).await {
            Ok(token) => ApiResult::ok(Value::String(token)),
            Err(e) => respond_error(ctx, ApiName::Login, &e),
        }
    }

    pub async fn verify_login_token(&self, ctx: &ApiContext, params: VerifyParams) -> ApiResult {
        debug!(request_id = %ctx.id, api = %ApiName::VerifyLoginToken, "API call");
        match self.auth.verify_login_token(params.token.trim()).await {
            Ok(token) => ApiResult::ok(Value::String(token)),
            Err(e) => respond_error(ctx, ApiName::VerifyLoginToken, &e),
        }
    }
}

fn respond_error(ctx: &ApiContext, api: ApiName, err: &GateError) -> ApiResult {
    if err.category() == ErrorCategory::Server {
        error!(request_id = %ctx.id, %api, error = %err, "API call failed");
    }
    ApiResult::from_error(err)
}
