//! Loading users from a JSON seed file.
//!
//! The file holds an array of [`CreateUser`] objects:
//!
//! ```json
//! [{"id": "u-1", "username": "alice", "display_name": "Alice", "password_hash": "$argon2id$..."}]
//! ```

use std::path::Path;

use tokengate_core::models::user::CreateUser;
use tracing::debug;

use crate::error::StoreError;

pub fn parse_seed(json: &str) -> Result<Vec<CreateUser>, StoreError> {
    Ok(serde_json::from_str(json)?)
}

pub async fn load_seed_file(path: impl AsRef<Path>) -> Result<Vec<CreateUser>, StoreError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path).await?;
    let users = parse_seed(&raw)?;
    debug!(path = %path.display(), count = users.len(), "Loaded user seed file");
    Ok(users)
}
