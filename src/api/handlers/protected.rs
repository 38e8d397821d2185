use super::SESSION_COOKIE_NAME;
use crate::auth::AuthGateway;
use axum::{
    extract::{Extension, Json, Request},
    http::{HeaderMap, StatusCode, header::COOKIE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use session_token::Claims;
use std::sync::Arc;
use tracing::debug;

/// Admit the request only with a valid `JWTToken` cookie. The validated
/// claims are stored in the request extensions for the handlers behind it.
pub async fn require_session(
    gateway: Extension<Arc<AuthGateway>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_session_token(request.headers());
    match gateway.guard(token.as_deref()) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path= "/protected/path",
    responses (
        (status = 200, description = "Session token accepted", body = String),
        (status = 401, description = "Missing, forged or expired session token", body = String)
    ),
    tag= "auth"
)]
pub async fn protected_path(claims: Extension<Claims>) -> Json<&'static str> {
    debug!(username = %claims.username, admin = claims.admin, "protected path");
    Json("Protected")
}

pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let Some((key, val)) = pair.trim().split_once('=') else {
                continue;
            };
            if key.trim() == SESSION_COOKIE_NAME {
                return Some(val.trim().to_string());
            }
        }
    }
    None
}
