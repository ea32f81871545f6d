//! Logging setup for the `tokengate` binary.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `level`; `level` only applies to the tokengate
/// crates.
///
/// # Errors
/// Returns an error if the filter is invalid or a subscriber is already set.
pub fn init(level: &str, json: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives(level))
            .map_err(|e| anyhow!("invalid log level {level}: {e}"))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
    result.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

fn default_directives(level: &str) -> String {
    ["tokengate", "tokengate_auth", "tokengate_store", "tokengate_server"]
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_cover_every_crate() {
        let directives = default_directives("debug");
        assert!(directives.contains("tokengate_auth=debug"));
        assert!(directives.contains("tokengate_store=debug"));
        assert!(EnvFilter::try_new(directives).is_ok());
    }
}
