//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: String,
    /// Argon2id PHC string or legacy hex digest. Empty for accounts
    /// created from an external login, which cannot use the form channel.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub id: String,
    pub username: String,
    pub display_name: String,
    /// Already hashed; the hash is salted with `id`.
    #[serde(default)]
    pub password_hash: String,
}
