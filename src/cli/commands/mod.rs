pub mod database;
pub mod logging;
pub mod token;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const ARG_PORT: &str = "port";
pub const ARG_STATIC_DIR: &str = "static-dir";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("monty")
        .about("Username/password authentication service")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(format!(
            "{} - {}",
            env!("CARGO_PKG_VERSION"),
            crate::GIT_COMMIT_HASH
        ))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("MONTY_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_STATIC_DIR)
                .long(ARG_STATIC_DIR)
                .help("Directory with the web frontend, served for every non-API path")
                .default_value("./static")
                .env("MONTY_STATIC_DIR"),
        );

    let command = database::with_args(command);
    let command = token::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENV_VARS: [&str; 10] = [
        "MONTY_PORT",
        "MONTY_STATIC_DIR",
        "MONTY_DB_HOST",
        "MONTY_DB_PORT",
        "MONTY_DB_USER",
        "MONTY_DB_PASSWORD",
        "MONTY_DB_DATABASE",
        "MONTY_DB_MAX_CONNS",
        "MONTY_JWT_SECRET",
        "MONTY_LOG_LEVEL",
    ];

    // Every MONTY_* variable unset except the given overrides.
    fn env_with(
        overrides: &[(&'static str, &'static str)],
    ) -> Vec<(&'static str, Option<&'static str>)> {
        ENV_VARS
            .iter()
            .map(|key| {
                let value = overrides
                    .iter()
                    .find(|(name, _)| name == key)
                    .map(|(_, value)| *value);
                (*key, value)
            })
            .collect()
    }

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "monty");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Username/password authentication service".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars(env_with(&[]), || {
            let matches = new().get_matches_from(vec!["monty"]);
            assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(8080));
            assert_eq!(
                matches.get_one::<String>(ARG_STATIC_DIR).map(String::as_str),
                Some("./static")
            );
            assert_eq!(
                matches
                    .get_one::<String>(database::ARG_DB_HOST)
                    .map(String::as_str),
                Some("localhost")
            );
            assert_eq!(
                matches.get_one::<u16>(database::ARG_DB_PORT).copied(),
                Some(5432)
            );
            assert_eq!(
                matches.get_one::<u32>(database::ARG_DB_MAX_CONNS).copied(),
                Some(5)
            );
            assert_eq!(matches.get_one::<String>(token::ARG_JWT_SECRET), None);
            assert_eq!(
                matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                Some(0)
            );
        });
    }

    #[test]
    fn test_check_args() {
        temp_env::with_vars(env_with(&[]), || {
            let matches = new().get_matches_from(vec![
                "monty",
                "--port",
                "9090",
                "--static-dir",
                "/srv/www",
                "--db-host",
                "db.internal",
                "--db-port",
                "6432",
                "--db-max-conns",
                "20",
                "--jwt-secret",
                "s3cr3t",
            ]);

            assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(9090));
            assert_eq!(
                matches.get_one::<String>(ARG_STATIC_DIR).map(String::as_str),
                Some("/srv/www")
            );
            assert_eq!(
                matches
                    .get_one::<String>(database::ARG_DB_HOST)
                    .map(String::as_str),
                Some("db.internal")
            );
            assert_eq!(
                matches.get_one::<u16>(database::ARG_DB_PORT).copied(),
                Some(6432)
            );
            assert_eq!(
                matches.get_one::<u32>(database::ARG_DB_MAX_CONNS).copied(),
                Some(20)
            );
            assert_eq!(
                matches
                    .get_one::<String>(token::ARG_JWT_SECRET)
                    .map(String::as_str),
                Some("s3cr3t")
            );
        });
    }

    #[test]
    fn test_check_env() {
        let vars = env_with(&[
            ("MONTY_PORT", "443"),
            ("MONTY_DB_USER", "monty"),
            ("MONTY_DB_PASSWORD", "hunter2"),
            ("MONTY_DB_DATABASE", "accounts"),
            ("MONTY_LOG_LEVEL", "info"),
        ]);
        temp_env::with_vars(vars, || {
            let matches = new().get_matches_from(vec!["monty"]);
            assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(443));
            assert_eq!(
                matches
                    .get_one::<String>(database::ARG_DB_USER)
                    .map(String::as_str),
                Some("monty")
            );
            assert_eq!(
                matches
                    .get_one::<String>(database::ARG_DB_DATABASE)
                    .map(String::as_str),
                Some("accounts")
            );
            assert_eq!(
                matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                Some(2)
            );
        });
    }

    #[test]
    fn test_zero_max_conns_rejected() {
        temp_env::with_vars(env_with(&[]), || {
            let result = new().try_get_matches_from(vec!["monty", "--db-max-conns", "0"]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_check_log_level_env() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, level) in levels.into_iter().enumerate() {
            temp_env::with_vars(env_with(&[("MONTY_LOG_LEVEL", level)]), || {
                let matches = new().get_matches_from(vec!["monty"]);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        for index in 0..5usize {
            temp_env::with_vars(env_with(&[]), || {
                let mut args = vec!["monty".to_string()];
                if index > 0 {
                    args.push(format!("-{}", "v".repeat(index)));
                }

                let matches = new().get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }
}
