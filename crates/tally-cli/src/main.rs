//! tally - command-line client for the tally expense tracker.
//!
//! A thin wrapper over `tally-http`. The session lives in a file so that
//! consecutive invocations share it, and every command goes through the
//! same refresh-and-replay path as the library.

mod cli;
mod commands;
mod output;
mod session;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::Cli;
use session::SessionContext;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let context = SessionContext::new(&cli.api_url, cli.session_file)?;
    let result = commands::handle(cli.command, &context).await;

    if let Err(e) = &result
        && session::is_auth_expired(e)
    {
        info!("Session ended, login required");
        output::hint("Your session has expired. Run `tally login` to sign in again.");
    }

    result
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
