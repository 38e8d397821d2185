use crate::auth::AuthError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tokio::task::JoinError;
use tracing::error;

pub mod health;
pub mod protected;
pub mod user_login;
pub mod user_register;

pub const SESSION_COOKIE_NAME: &str = "JWTToken";
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";

impl AuthError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::DuplicateUser(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Storage(_) | Self::Signing(_) | Self::Hashing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_internal() {
            error!("{self:#}");
            return (status, INTERNAL_SERVER_ERROR).into_response();
        }
        (status, self.to_string()).into_response()
    }
}

/// Handlers await their work in a spawned task; a panic there is a 500.
pub(crate) fn task_failed(err: &JoinError) -> Response {
    error!("Request task failed: {err}");
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR).into_response()
}
