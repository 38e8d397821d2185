//! Registration, login and the session guard.

use std::sync::Arc;

use session_token::Claims;
use tracing::{debug, info, instrument};

use super::error::AuthError;
use super::hasher;
use super::store::UserStore;
use super::token::TokenService;
use super::types::{LoginRequest, NewUser, RegisterRequest, User};

pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 32;

pub const MSG_INVALID_BODY: &str = "Invalid request body";
pub const MSG_PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters";
pub const MSG_USERNAME_LENGTH: &str = "Username must be between 3 and 32 characters";

#[derive(Clone)]
pub struct AuthGateway {
    store: Arc<dyn UserStore>,
    tokens: TokenService,
}

impl AuthGateway {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Validate, hash and persist a new account.
    ///
    /// # Errors
    /// [`AuthError::Validation`] before the store is touched,
    /// [`AuthError::DuplicateUser`] when the name or email is taken, or an
    /// internal error.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AuthError> {
        validate_registration(&request)?;

        if self.store.exists(&request.username).await? {
            debug!("username already taken");
            return Err(AuthError::DuplicateUser("User already exists".to_string()));
        }

        let credentials = hasher::hash_blocking(request.password).await?;
        let user = self
            .store
            .create(NewUser::new(request.username, request.email, credentials))
            .await?;

        info!(user_id = %user.id, "account created");
        Ok(user)
    }

    /// Check credentials and mint a session token.
    ///
    /// # Errors
    /// [`AuthError::InvalidCredentials`] for an unknown user or wrong
    /// password, or an internal error.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: LoginRequest) -> Result<(User, String), AuthError> {
        let user = self
            .store
            .verify(&request.username, &request.password)
            .await?;
        let token = self.tokens.issue(&user).map_err(AuthError::Signing)?;

        info!(user_id = %user.id, "login succeeded");
        Ok((user, token))
    }

    /// Admit a request carrying a valid session token.
    ///
    /// # Errors
    /// [`AuthError::Unauthorized`] when the token is absent, malformed,
    /// forged or expired.
    pub fn guard(&self, token: Option<&str>) -> Result<Claims, AuthError> {
        let Some(token) = token.filter(|token| !token.is_empty()) else {
            return Err(AuthError::Unauthorized);
        };
        self.tokens.validate(token).map_err(|err| {
            debug!("Rejected session token: {err}");
            AuthError::Unauthorized
        })
    }
}

impl std::fmt::Debug for AuthGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGateway")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

/// Check a registration request. The first failing rule wins.
///
/// # Errors
/// Returns [`AuthError::Validation`] with the message for the failing rule.
pub fn validate_registration(request: &RegisterRequest) -> Result<(), AuthError> {
    if request.username.is_empty() || request.email.is_empty() || request.password.is_empty() {
        return Err(AuthError::Validation(MSG_INVALID_BODY.to_string()));
    }

    if request.password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(AuthError::Validation(MSG_PASSWORD_TOO_SHORT.to_string()));
    }

    let username_length = request.username.chars().count();
    if !(USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&username_length) {
        return Err(AuthError::Validation(MSG_USERNAME_LENGTH.to_string()));
    }

    Ok(())
}
