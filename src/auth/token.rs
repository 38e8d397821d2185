//! Session token issuance and validation.
//!
//! Tokens are stateless: their validity is a function of the bytes, the
//! signing secret and the clock. Rotating the secret invalidates every token
//! issued before.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use rand::{RngCore, rngs::OsRng};
use secrecy::{ExposeSecret, SecretSlice};
use session_token::{Claims, Error as TokenError};

use super::types::User;

pub const TOKEN_TTL: Duration = Duration::from_secs(15 * 60);
pub const SECRET_LEN: usize = 32;

#[derive(Clone)]
pub struct TokenService {
    secret: Arc<SecretSlice<u8>>,
    ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: SecretSlice<u8>) -> Self {
        Self {
            secret: Arc::new(secret),
            ttl: TOKEN_TTL,
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// 32 bytes from the OS CSPRNG, for when no secret was configured.
    ///
    /// # Errors
    /// Returns an error if the entropy source fails.
    pub fn generate_secret() -> Result<SecretSlice<u8>, rand::Error> {
        let mut bytes = vec![0u8; SECRET_LEN];
        OsRng.try_fill_bytes(&mut bytes)?;
        Ok(SecretSlice::from(bytes))
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a token for `user` that expires one TTL from now.
    ///
    /// # Errors
    /// Returns an error if the claims cannot be signed.
    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        self.issue_at(&user.username, user.admin, Utc::now().timestamp())
    }

    /// Like [`Self::issue`] with an explicit clock.
    ///
    /// # Errors
    /// Returns an error if the claims cannot be signed.
    pub fn issue_at(&self, username: &str, admin: bool, now: i64) -> Result<String, TokenError> {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            username: username.to_string(),
            admin,
            exp: now.saturating_add(ttl),
        };
        session_token::sign_hs256(self.secret.expose_secret(), &claims)
    }

    /// # Errors
    /// Returns an error if the token is malformed, forged or expired.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_at(token, Utc::now().timestamp())
    }

    /// # Errors
    /// Returns an error if the token is malformed, forged or expired at `now`.
    pub fn validate_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        session_token::verify_hs256(token, self.secret.expose_secret(), now)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"***")
            .field("ttl", &self.ttl)
            .finish()
    }
}
