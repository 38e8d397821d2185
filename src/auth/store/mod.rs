//! User persistence.
//!
//! [`UserStore`] is the seam between the gateway and whatever holds the
//! accounts. Uniqueness of `username` and `email` is enforced by the store at
//! insert time; [`UserStore::exists`] is only a cheap pre-check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use super::hasher::{self, HashError};
use super::types::{NewUser, User};

mod memory;
mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::{PgUserStore, SCHEMA_SQL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    Username,
    Email,
}

impl std::fmt::Display for DuplicateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Username => write!(f, "username"),
            Self::Email => write!(f, "email"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    Duplicate(DuplicateField),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Hashing(#[from] HashError),
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.into())
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Whether an account with this exact username exists.
    async fn exists(&self, username: &str) -> Result<bool, StoreError>;

    /// Insert a new account. All three timestamps are set to now.
    ///
    /// # Errors
    /// [`StoreError::Duplicate`] when the username or email is taken.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Set `accessed_at`. Calling it twice with the same instant is harmless.
    async fn touch_accessed(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Cheap liveness probe for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Check a username/password pair.
    ///
    /// Unknown users and wrong passwords are indistinguishable: both return
    /// [`StoreError::InvalidCredentials`] after one key derivation. A failure
    /// to record the access time is logged and does not fail the login.
    async fn verify(&self, username: &str, password: &str) -> Result<User, StoreError> {
        let Some(mut user) = self.find_by_username(username).await? else {
            hasher::equalize_timing(password.to_string()).await;
            return Err(StoreError::InvalidCredentials);
        };

        let valid = hasher::verify_blocking(
            password.to_string(),
            user.password_hash.clone(),
            user.salt.clone(),
        )
        .await?;
        if !valid {
            return Err(StoreError::InvalidCredentials);
        }

        let now = Utc::now();
        match self.touch_accessed(user.id, now).await {
            Ok(()) => user.accessed_at = now,
            Err(err) => warn!(user_id = %user.id, "Failed to record access time: {err}"),
        }

        Ok(user)
    }
}
