//! Google login command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;
use crate::session::SessionContext;

#[derive(Args, Debug)]
pub struct GoogleLoginArgs {
    /// ID token issued by Google Sign-In
    #[arg(long, env = "TALLY_GOOGLE_ID_TOKEN", hide_env_values = true)]
    pub id_token: String,
}

pub async fn run(args: GoogleLoginArgs, context: &SessionContext) -> Result<()> {
    let client = context.client()?;

    output::progress("Logging in with Google...");

    client
        .google_login(&args.id_token)
        .await
        .context("Failed to login with Google")?;

    output::success("Logged in successfully");

    Ok(())
}
