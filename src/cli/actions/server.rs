use crate::{
    api,
    auth::{AuthGateway, PgUserStore, TokenService},
    cli::{commands::database, telemetry},
};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretSlice, SecretString};
use sqlx::postgres::PgPoolOptions;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub static_dir: PathBuf,
    pub database: database::Options,
    pub jwt_secret: Option<SecretString>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable, the schema cannot be
/// applied, no signing secret can be obtained, or the server fails.
pub async fn execute(args: Args) -> Result<()> {
    let jwt_secret = if args.jwt_secret.is_some() {
        "configured"
    } else {
        "generated"
    };
    info!(
        port = args.port,
        static_dir = %args.static_dir.display(),
        db_host = %args.database.host,
        db_port = args.database.port,
        db_user = %args.database.user,
        db_database = %args.database.database,
        db_max_conns = args.database.max_connections,
        jwt_secret,
        "Starting monty"
    );

    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(args.database.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .test_before_acquire(true)
        .connect_with(args.database.connect_options())
        .await
        .context("Failed to connect to database")?;

    let store = PgUserStore::new(pool);
    store
        .apply_schema()
        .await
        .context("Failed to apply database schema")?;

    let secret = match args.jwt_secret {
        Some(secret) => SecretSlice::from(secret.expose_secret().as_bytes().to_vec()),
        None => {
            warn!("No JWT secret configured; sessions will not survive a restart");
            TokenService::generate_secret().context("Failed to generate JWT secret")?
        }
    };

    let gateway = Arc::new(AuthGateway::new(
        Arc::new(store),
        TokenService::new(secret),
    ));

    let result = api::new(args.port, gateway, args.static_dir).await;

    telemetry::shutdown_tracer();

    result
}
