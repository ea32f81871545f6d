//! Token issued by the external identity provider.

use serde::{Deserialize, Serialize};

/// Token type the provider assigns to login tokens.
pub const EXTER_LOGIN_TOKEN_TYPE: &str = "login";

/// Claims of a token re-issued and signed by the external provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExterToken {
    #[serde(rename = "jti", default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub token_type: String,
    #[serde(rename = "aid", default)]
    pub app_id: String,
    #[serde(rename = "uid")]
    pub user_id: String,
    #[serde(rename = "uname", default)]
    pub user_name: String,
    /// Unix timestamp (seconds).
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl ExterToken {
    /// Only login tokens may open a session; logout or refresh tokens
    /// replayed at the login endpoint must be refused.
    pub fn is_login(&self) -> bool {
        self.token_type == EXTER_LOGIN_TOKEN_TYPE
    }
}
