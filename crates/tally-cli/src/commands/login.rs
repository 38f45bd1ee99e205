//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;

use tally_core::Credentials;

use crate::output;
use crate::session::SessionContext;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email address
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long, env = "TALLY_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(args: LoginArgs, context: &SessionContext) -> Result<()> {
    let client = context.client()?;
    let credentials = Credentials::new(&args.email, &args.password);

    output::progress("Logging in...");

    client.login(&credentials).await.context("Failed to login")?;

    output::success("Logged in successfully");
    println!();
    output::field("Email", &args.email);
    output::field("API", &context.api_url().to_string());
    output::field("Session", &context.session_file().display().to_string());

    Ok(())
}
