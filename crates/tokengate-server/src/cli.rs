//! Command-line definition.

use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

fn key_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("private-key")
                .long("private-key")
                .help("Path to the PEM private key session tokens are signed with")
                .env("TOKENGATE_PRIVATE_KEY")
                .global(true),
        )
        .arg(
            Arg::new("public-key")
                .long("public-key")
                .help("Path to the PEM public key matching --private-key")
                .env("TOKENGATE_PUBLIC_KEY")
                .global(true),
        )
        .arg(
            Arg::new("algorithm")
                .long("algorithm")
                .help("Signature algorithm of the key pair: eddsa or rs256")
                .default_value("eddsa")
                .env("TOKENGATE_ALGORITHM")
                .global(true),
        )
        .arg(
            Arg::new("issuer")
                .long("issuer")
                .help("Issuer (iss) claim of session tokens")
                .default_value("tokengate")
                .env("TOKENGATE_ISSUER")
                .global(true),
        )
        .arg(
            Arg::new("session-lifetime")
                .long("session-lifetime")
                .help("Lifetime of form login sessions, in seconds")
                .default_value("3600")
                .env("TOKENGATE_SESSION_LIFETIME")
                .value_parser(clap::value_parser!(u64).range(1..))
                .global(true),
        )
        .arg(
            Arg::new("users")
                .long("users")
                .help("Path to a JSON file of users to load into the in-memory store")
                .env("TOKENGATE_USERS")
                .global(true),
        )
}

fn exter_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("exter-base-url")
                .long("exter-base-url")
                .help("Base URL of the external identity provider; enables exter login")
                .env("TOKENGATE_EXTER_BASE_URL")
                .global(true),
        )
        .arg(
            Arg::new("exter-app-id")
                .long("exter-app-id")
                .help("Application id registered at the external identity provider")
                .default_value("")
                .env("TOKENGATE_EXTER_APP_ID")
                .global(true),
        )
        .arg(
            Arg::new("exter-public-key")
                .long("exter-public-key")
                .help("Path to the PEM public key of the external identity provider")
                .env("TOKENGATE_EXTER_PUBLIC_KEY")
                .global(true),
        )
        .arg(
            Arg::new("exter-algorithm")
                .long("exter-algorithm")
                .help("Signature algorithm of the provider key: eddsa or rs256")
                .default_value("rs256")
                .env("TOKENGATE_EXTER_ALGORITHM")
                .global(true),
        )
        .arg(
            Arg::new("exter-timeout")
                .long("exter-timeout")
                .help("Timeout of a provider round-trip, in milliseconds")
                .default_value("10000")
                .env("TOKENGATE_EXTER_TIMEOUT")
                .value_parser(clap::value_parser!(u64).range(1..))
                .global(true),
        )
        .arg(
            Arg::new("expose-exter-errors")
                .long("expose-exter-errors")
                .help("Show the provider's rejection message to callers (not for production)")
                .env("TOKENGATE_EXPOSE_EXTER_ERRORS")
                .action(ArgAction::SetTrue)
                .global(true),
        )
}

fn logging_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help("Default log filter when RUST_LOG is not set")
                .default_value("info")
                .env("TOKENGATE_LOG_LEVEL")
                .value_parser(["error", "warn", "info", "debug", "trace"])
                .global(true),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .help("Emit logs as JSON")
                .env("TOKENGATE_LOG_JSON")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("debug-tokens")
                .long("debug-tokens")
                .help("Log decoded token contents at debug level (never raw tokens)")
                .env("TOKENGATE_DEBUG_TOKENS")
                .action(ArgAction::SetTrue)
                .global(true),
        )
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("tokengate")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .subcommand(Command::new("info").about("Print application info and the token public key"))
        .subcommand(
            Command::new("login")
                .about("Log in and print a session token")
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .help("Login channel: form or exter (anything else means form)")
                        .default_value("form"),
                )
                .arg(Arg::new("username").long("username").short('u'))
                .arg(
                    Arg::new("password")
                        .long("password")
                        .env("TOKENGATE_PASSWORD")
                        .hide_env_values(true),
                )
                .arg(
                    Arg::new("token")
                        .long("token")
                        .help("Token issued by the external identity provider"),
                ),
        )
        .subcommand(
            Command::new("verify")
                .about("Verify a session token and print a re-signed copy")
                .arg(Arg::new("token").long("token").required(true)),
        )
        .subcommand(
            Command::new("hash-password")
                .about("Hash a password for the users file")
                .arg(Arg::new("user-id").long("user-id").required(true))
                .arg(
                    Arg::new("password")
                        .long("password")
                        .env("TOKENGATE_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                ),
        );

    let command = key_args(command);
    let command = exter_args(command);
    logging_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "tokengate");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some(env!("CARGO_PKG_DESCRIPTION").to_string())
        );
        command.debug_assert();
    }

    #[test]
    fn test_login_args() {
        let matches = new().get_matches_from(vec![
            "tokengate",
            "--private-key",
            "/etc/tokengate/key.pem",
            "login",
            "--mode",
            "EXTER",
            "--token",
            "abc",
            "--issuer",
            "acme",
        ]);

        assert_eq!(
            matches.get_one::<String>("private-key").cloned(),
            Some("/etc/tokengate/key.pem".to_string())
        );
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "login");
        assert_eq!(sub.get_one::<String>("mode").cloned(), Some("EXTER".into()));
        assert_eq!(sub.get_one::<String>("token").cloned(), Some("abc".into()));
        assert_eq!(sub.get_one::<String>("issuer").cloned(), Some("acme".into()));
    }

    #[test]
    fn test_defaults() {
        let matches = new().get_matches_from(vec!["tokengate", "info"]);
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(sub.get_one::<u64>("session-lifetime").copied(), Some(3600));
        assert_eq!(sub.get_one::<u64>("exter-timeout").copied(), Some(10_000));
        assert_eq!(sub.get_one::<String>("algorithm").cloned(), Some("eddsa".into()));
        assert!(!sub.get_flag("debug-tokens"));
        assert!(!sub.get_flag("expose-exter-errors"));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(new().try_get_matches_from(vec!["tokengate"]).is_err());
    }

    #[test]
    fn test_zero_lifetime_rejected() {
        let result =
            new().try_get_matches_from(vec!["tokengate", "--session-lifetime", "0", "info"]);
        assert!(result.is_err());
    }
}
