use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::hasher::PasswordDigest;

/// A persisted account. The digest and salt never leave the crate.
#[derive(Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub(crate) password_hash: Vec<u8>,
    pub(crate) salt: Vec<u8>,
    pub admin: bool,
    pub status: i32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub accessed_at: DateTime<Utc>,
}

impl User {
    /// The serializable view handed to clients.
    #[must_use]
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            admin: self.admin,
            status: self.status,
            created_at: self.created_at,
            accessed_at: self.accessed_at,
        }
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"***")
            .field("salt", &"***")
            .field("admin", &self.admin)
            .field("status", &self.status)
            .field("created_at", &self.created_at)
            .field("modified_at", &self.modified_at)
            .field("accessed_at", &self.accessed_at)
            .finish()
    }
}

/// Insert payload built by the gateway once validation and hashing succeeded.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub credentials: PasswordDigest,
}

impl NewUser {
    #[must_use]
    pub fn new(username: String, email: String, credentials: PasswordDigest) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            credentials,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub admin: bool,
    pub status: i32,
    pub created_at: DateTime<Utc>,
    pub accessed_at: DateTime<Utc>,
}

// Missing fields decode as empty strings so the gateway reports them in its
// own validation order instead of a serde message.
#[derive(Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
