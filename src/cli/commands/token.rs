use clap::{Arg, ArgMatches, Command};
use secrecy::{ExposeSecret, SecretString};

pub const ARG_JWT_SECRET: &str = "jwt-secret";

#[derive(Debug, Clone)]
pub struct Options {
    /// `None` means a random secret is generated at startup.
    pub secret: Option<SecretString>,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        let secret = matches
            .get_one::<String>(ARG_JWT_SECRET)
            .cloned()
            .map(SecretString::from)
            .filter(|secret| !secret.expose_secret().is_empty());
        Self { secret }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_JWT_SECRET)
            .long(ARG_JWT_SECRET)
            .help("HMAC secret for session tokens; a random one is generated when unset")
            .env("MONTY_JWT_SECRET")
            .hide_env_values(true),
    )
}
