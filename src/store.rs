use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::AuthError;

/// User record. The password hash is an Argon2 PHC string and never leaves
/// the process; plaintext passwords are not retained anywhere.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Credential storage seam. The in-memory store is the only implementation
/// wired in; a database-backed one would implement the same trait.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. The uniqueness check and the insert happen under
    /// the same lock, so concurrent registrations of one username cannot
    /// both succeed.
    async fn insert(&self, user: User) -> Result<User, AuthError>;

    async fn find(&self, username: &str) -> Result<Option<User>, AuthError>;
}

/// Users keyed by username, gone on restart.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: User) -> Result<User, AuthError> {
        let mut users = self.users.lock().await;
        if users.contains_key(&user.username) {
            return Err(AuthError::DuplicateUser);
        }
        users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn find(&self, username: &str) -> Result<Option<User>, AuthError> {
        Ok(self.users.lock().await.get(username).cloned())
    }
}
