use super::{SESSION_COOKIE_NAME, task_failed};
use crate::auth::{AuthGateway, LoginRequest, PublicUser, gateway::MSG_INVALID_BODY};
use axum::{
    extract::{Extension, Json, rejection::JsonRejection},
    http::{
        HeaderValue, StatusCode,
        header::{InvalidHeaderValue, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, instrument};

#[utoipa::path(
    post,
    path= "/api/login",
    request_body = LoginRequest,
    responses (
        (status = 200, description = "Logged in; the session token is set as the JWTToken cookie", body = PublicUser),
        (status = 400, description = "Malformed body", body = String),
        (status = 401, description = "Invalid username or password", body = String),
        (status = 500, description = "Storage or signing failure", body = String)
    ),
    tag= "auth"
)]
#[instrument(skip(gateway, payload))]
pub async fn login(
    gateway: Extension<Arc<AuthGateway>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Rejected login body: {rejection}");
            return (StatusCode::BAD_REQUEST, MSG_INVALID_BODY).into_response();
        }
    };

    let ttl = gateway.tokens().ttl();
    let gateway = Arc::clone(&gateway.0);
    let (user, token) = match tokio::spawn(async move { gateway.login(request).await }).await {
        Ok(Ok(session)) => session,
        Ok(Err(err)) => return err.into_response(),
        Err(err) => return task_failed(&err),
    };

    match session_cookie(&token, ttl) {
        Ok(cookie) => (StatusCode::OK, [(SET_COOKIE, cookie)], Json(user.public())).into_response(),
        Err(err) => {
            error!("Failed to build session cookie: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, super::INTERNAL_SERVER_ERROR).into_response()
        }
    }
}

/// `HttpOnly` cookie carrying the session token for as long as the token lives.
pub fn session_cookie(token: &str, ttl: Duration) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE_NAME}={token}; HttpOnly; Path=/; Max-Age={}",
        ttl.as_secs()
    ))
}
