//! In-memory implementation of [`UserRepository`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokengate_core::error::GateResult;
use tokengate_core::models::exter::ExterToken;
use tokengate_core::models::user::{CreateUser, User};
use tokengate_core::repository::UserRepository;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::StoreError;

#[derive(Debug, Default)]
struct Users {
    by_id: HashMap<String, User>,
    /// username -> id
    usernames: HashMap<String, String>,
}

impl Users {
    fn insert(&mut self, input: CreateUser) -> Result<User, StoreError> {
        if input.id.trim().is_empty() {
            return Err(StoreError::Invalid("user id must not be empty".into()));
        }
        if input.username.trim().is_empty() {
            return Err(StoreError::Invalid("username must not be empty".into()));
        }
        if self.by_id.contains_key(&input.id) {
            return Err(StoreError::Duplicate {
                entity: "user".into(),
                field: "id".into(),
                value: input.id,
            });
        }
        if self.usernames.contains_key(&input.username) {
            return Err(StoreError::Duplicate {
                entity: "user".into(),
                field: "username".into(),
                value: input.username,
            });
        }

        let user = User {
            id: input.id,
            username: input.username,
            display_name: input.display_name,
            password_hash: input.password_hash,
            created_at: Utc::now(),
        };
        self.usernames
            .insert(user.username.clone(), user.id.clone());
        self.by_id.insert(user.id.clone(), user.clone());
        Ok(user)
    }
}

/// Process-local user store.
///
/// Cloning is cheap and every clone sees the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<Users>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `users`. Fails on the first
    /// duplicate id or username.
    pub async fn with_users(
        users: impl IntoIterator<Item = CreateUser>,
    ) -> Result<Self, StoreError> {
        let repo = Self::new();
        for user in users {
            repo.create(user).await?;
        }
        Ok(repo)
    }

    pub async fn create(&self, input: CreateUser) -> Result<User, StoreError> {
        self.users.write().await.insert(input)
    }

    pub async fn get_by_id(&self, id: &str) -> Option<User> {
        self.users.read().await.by_id.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl UserRepository for MemoryUserRepository {
    async fn get_by_username(&self, username: &str) -> GateResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .usernames
            .get(username)
            .and_then(|id| users.by_id.get(id))
            .cloned())
    }

    async fn create_from_exter_token(&self, token: &ExterToken) -> GateResult<Option<User>> {
        if token.user_id.trim().is_empty() {
            return Ok(None);
        }

        // Hold the write lock across lookup and insert so that two
        // concurrent first logins create a single account.
        let mut users = self.users.write().await;
        if let Some(user) = users.by_id.get(&token.user_id) {
            return Ok(Some(user.clone()));
        }

        let display_name = if token.user_name.trim().is_empty() {
            token.user_id.clone()
        } else {
            token.user_name.clone()
        };
        let user = users.insert(CreateUser {
            id: token.user_id.clone(),
            username: token.user_id.clone(),
            display_name,
            password_hash: String::new(),
        })?;

        info!(user_id = %user.id, app_id = %token.app_id, "Created user from external login");
        Ok(Some(user))
    }
}
