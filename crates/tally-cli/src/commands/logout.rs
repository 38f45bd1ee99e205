//! Logout command implementation.

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use crate::output;
use crate::session::SessionContext;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub fn run(_args: LogoutArgs, context: &SessionContext) -> Result<()> {
    let client = context.client()?;

    if !client.is_authenticated() {
        debug!(path = %context.session_file().display(), "No session to remove");
        output::success("Already logged out");
        return Ok(());
    }

    client.logout().context("Failed to remove session")?;
    output::success("Logged out");

    Ok(())
}
