use clap::{Arg, ArgMatches, Command};
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgConnectOptions;

pub const ARG_DB_HOST: &str = "db-host";
pub const ARG_DB_PORT: &str = "db-port";
pub const ARG_DB_USER: &str = "db-user";
pub const ARG_DB_PASSWORD: &str = "db-password";
pub const ARG_DB_DATABASE: &str = "db-database";
pub const ARG_DB_MAX_CONNS: &str = "db-max-conns";

/// Connection parameters for the user store.
#[derive(Debug, Clone)]
pub struct Options {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub database: String,
    pub max_connections: u32,
}

impl Options {
    /// Parse database arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing or empty.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let read_required = |id: &str| -> anyhow::Result<String> {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };

        Ok(Self {
            host: read_required(ARG_DB_HOST)?,
            port: matches.get_one::<u16>(ARG_DB_PORT).copied().unwrap_or(5432),
            user: read_required(ARG_DB_USER)?,
            password: SecretString::from(
                matches
                    .get_one::<String>(ARG_DB_PASSWORD)
                    .cloned()
                    .unwrap_or_default(),
            ),
            database: read_required(ARG_DB_DATABASE)?,
            max_connections: matches
                .get_one::<u32>(ARG_DB_MAX_CONNS)
                .copied()
                .unwrap_or(5),
        })
    }

    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(self.password.expose_secret())
            .database(&self.database)
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DB_HOST)
                .long(ARG_DB_HOST)
                .help("PostgreSQL host")
                .default_value("localhost")
                .env("MONTY_DB_HOST"),
        )
        .arg(
            Arg::new(ARG_DB_PORT)
                .long(ARG_DB_PORT)
                .help("PostgreSQL port")
                .default_value("5432")
                .env("MONTY_DB_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_DB_USER)
                .long(ARG_DB_USER)
                .help("PostgreSQL user")
                .default_value("postgres")
                .env("MONTY_DB_USER"),
        )
        .arg(
            Arg::new(ARG_DB_PASSWORD)
                .long(ARG_DB_PASSWORD)
                .help("PostgreSQL password")
                .default_value("password")
                .env("MONTY_DB_PASSWORD")
                .hide_env_values(true)
                .hide_default_value(true),
        )
        .arg(
            Arg::new(ARG_DB_DATABASE)
                .long(ARG_DB_DATABASE)
                .help("PostgreSQL database name")
                .default_value("db")
                .env("MONTY_DB_DATABASE"),
        )
        .arg(
            Arg::new(ARG_DB_MAX_CONNS)
                .long(ARG_DB_MAX_CONNS)
                .help("Maximum number of pooled database connections")
                .default_value("5")
                .env("MONTY_DB_MAX_CONNS")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
}
