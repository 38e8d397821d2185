use super::handlers::{health, protected, user_login, user_register};
use crate::auth::{LoginRequest, PublicUser, RegisterRequest};
use utoipa::OpenApi;

// Title, version, description, contact and license come from Cargo.toml.
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        user_register::create_account,
        user_login::login,
        protected::protected_path
    ),
    components(schemas(health::Health, PublicUser, RegisterRequest, LoginRequest)),
    tags(
        (name = "health", description = "Liveness of the service and its user store"),
        (name = "auth", description = "Account registration, login and session-guarded routes")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
