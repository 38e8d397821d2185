use thiserror::Error;

use super::hasher::HashError;
use super::store::{DuplicateField, StoreError};

/// Everything registration, login and the guard can fail with.
///
/// The first four variants are the caller's fault and carry a message fit
/// for the response body. The rest are ours and are only ever logged.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    DuplicateUser(String),
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("storage error: {0:#}")]
    Storage(anyhow::Error),
    #[error("token signing failed: {0}")]
    Signing(#[source] session_token::Error),
    #[error("password hashing failed: {0}")]
    Hashing(#[from] HashError),
}

impl AuthError {
    /// True for failures caused by the server rather than the request.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Signing(_) | Self::Hashing(_)
        )
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(DuplicateField::Username) => {
                Self::DuplicateUser("User already exists".to_string())
            }
            StoreError::Duplicate(DuplicateField::Email) => {
                Self::DuplicateUser("Email already registered".to_string())
            }
            StoreError::InvalidCredentials => Self::InvalidCredentials,
            StoreError::Hashing(err) => Self::Hashing(err),
            StoreError::Storage(err) => Self::Storage(err),
        }
    }
}
