use super::task_failed;
use crate::auth::{AuthGateway, PublicUser, RegisterRequest, gateway::MSG_INVALID_BODY};
use axum::{
    extract::{Extension, Json, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, instrument};

#[utoipa::path(
    post,
    path= "/api/create-account",
    request_body = RegisterRequest,
    responses (
        (status = 201, description = "Account created", body = PublicUser),
        (status = 400, description = "Malformed body, failed validation, or username/email already registered", body = String),
        (status = 500, description = "Storage or hashing failure", body = String)
    ),
    tag= "auth"
)]
#[instrument(skip(gateway, payload))]
pub async fn create_account(
    gateway: Extension<Arc<AuthGateway>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Rejected create-account body: {rejection}");
            return (StatusCode::BAD_REQUEST, MSG_INVALID_BODY).into_response();
        }
    };

    // Finish the insert even if the client goes away.
    let gateway = Arc::clone(&gateway.0);
    match tokio::spawn(async move { gateway.register(request).await }).await {
        Ok(Ok(user)) => (StatusCode::CREATED, Json(user.public())).into_response(),
        Ok(Err(err)) => err.into_response(),
        Err(err) => task_failed(&err),
    }
}
