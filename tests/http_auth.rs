use anyhow::{Context, Result};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use monty::{
    api,
    auth::{AuthGateway, MemoryUserStore, TokenService},
};
use secrecy::SecretSlice;
use serde_json::{Value, json};
use std::{path::PathBuf, sync::Arc};
use tower::ServiceExt;

const INDEX_HTML: &str = "<!doctype html><title>monty</title>";
const SECRET: &[u8] = b"http-test-secret-http-test-secret";

struct TestApp {
    router: Router,
    store: Arc<MemoryUserStore>,
    tokens: TokenService,
    static_dir: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.static_dir);
    }
}

fn test_app() -> Result<TestApp> {
    let static_dir = std::env::temp_dir().join(format!("monty-static-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&static_dir)?;
    std::fs::write(static_dir.join("index.html"), INDEX_HTML)?;
    std::fs::write(static_dir.join("app.js"), "console.log('monty');")?;

    let store = Arc::new(MemoryUserStore::new());
    let tokens = TokenService::new(SecretSlice::from(SECRET.to_vec()));
    let gateway = Arc::new(AuthGateway::new(store.clone(), tokens.clone()));
    let router = api::router(gateway, &static_dir);

    Ok(TestApp {
        router,
        store,
        tokens,
        static_dir,
    })
}

async fn send(app: &TestApp, request: Request<Body>) -> Result<Response> {
    Ok(app.router.clone().oneshot(request).await?)
}

fn post_json(uri: &str, body: &Value) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body)?))?)
}

fn get(uri: &str, cookie: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    Ok(builder.body(Body::empty())?)
}

async fn body_string(response: Response) -> Result<String> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

fn alice() -> Value {
    json!({"username": "alice", "email": "alice@example.com", "password": "longenough"})
}

async fn register_alice(app: &TestApp) -> Result<()> {
    let response = send(app, post_json("/api/create-account", &alice())?).await?;
    anyhow::ensure!(
        response.status() == StatusCode::CREATED,
        "registration failed: {}",
        response.status()
    );
    Ok(())
}

/// Log alice in and return the `name=value` part of the session cookie.
async fn login_alice(app: &TestApp) -> Result<String> {
    let response = send(
        app,
        post_json(
            "/api/login",
            &json!({"username": "alice", "password": "longenough"}),
        )?,
    )
    .await?;
    anyhow::ensure!(response.status() == StatusCode::OK, "login failed");
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .context("missing Set-Cookie")?
        .to_str()?;
    Ok(cookie
        .split(';')
        .next()
        .context("empty cookie")?
        .to_string())
}

#[tokio::test]
async fn create_account_returns_public_user() -> Result<()> {
    let app = test_app()?;
    let response = send(&app, post_json("/api/create-account", &alice())?).await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = serde_json::from_str(&body_string(response).await?)?;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["admin"], false);
    assert_eq!(body["status"], 0);
    assert!(body["id"].as_str().is_some_and(|id| uuid::Uuid::parse_str(id).is_ok()));
    assert!(body.get("created_at").is_some());
    assert!(body.get("accessed_at").is_some());
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());
    assert!(body.get("salt").is_none());
    Ok(())
}

#[tokio::test]
async fn short_password_is_rejected() -> Result<()> {
    let app = test_app()?;
    let response = send(
        &app,
        post_json(
            "/api/create-account",
            &json!({"username": "alice", "email": "alice@example.com", "password": "short"}),
        )?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_string(response).await?,
        "Password must be at least 8 characters"
    );
    assert!(app.store.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn bad_usernames_are_rejected() -> Result<()> {
    let app = test_app()?;
    for username in ["al".to_string(), "x".repeat(33)] {
        let response = send(
            &app,
            post_json(
                "/api/create-account",
                &json!({"username": username, "email": "a@example.com", "password": "longenough"}),
            )?,
        )
        .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_string(response).await?,
            "Username must be between 3 and 32 characters"
        );
    }
    Ok(())
}

#[tokio::test]
async fn malformed_bodies_are_rejected() -> Result<()> {
    let app = test_app()?;

    let not_json = Request::builder()
        .method("POST")
        .uri("/api/create-account")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let response = send(&app, not_json).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await?, "Invalid request body");

    let no_content_type = Request::builder()
        .method("POST")
        .uri("/api/login")
        .body(Body::from(r#"{"username":"alice","password":"longenough"}"#))?;
    let response = send(&app, no_content_type).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let missing_email = post_json(
        "/api/create-account",
        &json!({"username": "alice", "password": "longenough"}),
    )?;
    let response = send(&app, missing_email).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await?, "Invalid request body");
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_is_rejected() -> Result<()> {
    let app = test_app()?;
    register_alice(&app).await?;

    let response = send(&app, post_json("/api/create-account", &alice())?).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await?, "User already exists");
    assert_eq!(app.store.len().await, 1);
    Ok(())
}

#[tokio::test]
async fn login_sets_session_cookie() -> Result<()> {
    let app = test_app()?;
    register_alice(&app).await?;

    let response = send(
        &app,
        post_json(
            "/api/login",
            &json!({"username": "alice", "password": "longenough"}),
        )?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .context("missing Set-Cookie")?
        .to_str()?
        .to_string();
    assert!(cookie.starts_with("JWTToken="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=900"));

    let body: Value = serde_json::from_str(&body_string(response).await?)?;
    assert_eq!(body["username"], "alice");
    assert!(body.get("password").is_none());

    let token = cookie
        .trim_start_matches("JWTToken=")
        .split(';')
        .next()
        .context("empty cookie")?;
    let claims = app.tokens.validate(token)?;
    assert_eq!(claims.username, "alice");
    assert!(!claims.admin);
    Ok(())
}

#[tokio::test]
async fn login_failures_are_indistinguishable() -> Result<()> {
    let app = test_app()?;
    register_alice(&app).await?;

    let wrong = send(
        &app,
        post_json(
            "/api/login",
            &json!({"username": "alice", "password": "wrong-password"}),
        )?,
    )
    .await?;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert!(wrong.headers().get(header::SET_COOKIE).is_none());
    let wrong_body = body_string(wrong).await?;

    let unknown = send(
        &app,
        post_json(
            "/api/login",
            &json!({"username": "mallory", "password": "longenough"}),
        )?,
    )
    .await?;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(unknown).await?, wrong_body);
    Ok(())
}

#[tokio::test]
async fn protected_path_requires_session() -> Result<()> {
    let app = test_app()?;
    register_alice(&app).await?;
    let cookie = login_alice(&app).await?;

    let response = send(&app, get("/protected/path", None)?).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, get("/protected/path", Some(&cookie))?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await?, "\"Protected\"");

    let with_others = format!("theme=dark; {cookie}; lang=en");
    let response = send(&app, get("/protected/path", Some(&with_others))?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn forged_and_expired_tokens_are_rejected() -> Result<()> {
    let app = test_app()?;
    register_alice(&app).await?;
    let cookie = login_alice(&app).await?;

    // Flip the last signature character.
    let mut forged = cookie.clone();
    let last = forged.pop().context("empty cookie")?;
    forged.push(if last == 'A' { 'B' } else { 'A' });
    let response = send(&app, get("/protected/path", Some(&forged))?).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let expired = app.tokens.issue_at("alice", false, 1_000)?;
    let response = send(
        &app,
        get("/protected/path", Some(&format!("JWTToken={expired}")))?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, get("/protected/path", Some("JWTToken=garbage"))?).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn unknown_protected_paths_are_guarded() -> Result<()> {
    let app = test_app()?;
    register_alice(&app).await?;
    let cookie = login_alice(&app).await?;

    let response = send(&app, get("/protected/missing", None)?).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, get("/protected/missing", Some(&cookie))?).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn health_reports_store() -> Result<()> {
    let app = test_app()?;
    let response = send(&app, get("/health", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let x_app = response
        .headers()
        .get("X-App")
        .context("missing X-App header")?
        .to_str()?
        .to_string();
    assert!(x_app.starts_with(&format!("monty:{}:", env!("CARGO_PKG_VERSION"))));

    let body: Value = serde_json::from_str(&body_string(response).await?)?;
    assert_eq!(body["name"], "monty");
    assert_eq!(body["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn health_options_has_empty_body() -> Result<()> {
    let app = test_app()?;
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/health")
        .body(Body::empty())?;
    let response = send(&app, request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("X-App").is_some());
    assert!(body_string(response).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn static_files_with_spa_fallback() -> Result<()> {
    let app = test_app()?;

    let response = send(&app, get("/", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await?, INDEX_HTML);

    let response = send(&app, get("/app.js", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await?, "console.log('monty');");

    let response = send(&app, get("/account/settings", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await?, INDEX_HTML);
    Ok(())
}

#[tokio::test]
async fn request_id_is_propagated() -> Result<()> {
    let app = test_app()?;

    let response = send(&app, get("/health", None)?).await?;
    let generated = response
        .headers()
        .get("x-request-id")
        .context("missing x-request-id")?
        .to_str()?;
    assert!(ulid::Ulid::from_string(generated).is_ok());

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "caller-supplied")
        .body(Body::empty())?;
    let response = send(&app, request).await?;
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .map(|value| value.as_bytes()),
        Some(&b"caller-supplied"[..])
    );
    Ok(())
}
