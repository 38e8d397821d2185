use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DuplicateField, StoreError, UserStore};
use crate::auth::types::{NewUser, User};

/// Process-local store keyed by username.
///
/// Uniqueness is checked and the record inserted under one write lock, so two
/// concurrent registrations for the same name cannot both succeed.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.users.read().await.contains_key(username))
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return Err(StoreError::Duplicate(DuplicateField::Username));
        }
        if users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::Duplicate(DuplicateField::Email));
        }

        let now = Utc::now();
        let record = User {
            id: user.id,
            username: user.username,
            email: user.email,
            password_hash: user.credentials.digest,
            salt: user.credentials.salt,
            admin: false,
            status: 0,
            created_at: now,
            modified_at: now,
            accessed_at: now,
        };
        users.insert(record.username.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn touch_accessed(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if let Some(user) = users.values_mut().find(|user| user.id == id) {
            user.accessed_at = at;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
