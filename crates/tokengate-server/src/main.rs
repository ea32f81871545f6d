//! tokengate: log in, verify session tokens and inspect the service from
//! the command line.

use std::process::ExitCode;

use anyhow::Result;
use tokengate_server::{cli, dispatch, telemetry};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let matches = cli::new().get_matches();

    // Global flags are propagated into the subcommand's matches.
    let globals = matches.subcommand().map_or(&matches, |(_, sub)| sub);
    let level = globals
        .get_one::<String>("log-level")
        .map_or("info", String::as_str);
    telemetry::init(level, globals.get_flag("log-json"))?;

    let action = dispatch::handler(&matches)?;
    let (output, ok) = action.execute().await?;
    println!("{output}");

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
