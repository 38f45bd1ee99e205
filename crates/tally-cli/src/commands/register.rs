//! Register command implementation.

use anyhow::{Context, Result};
use clap::Args;

use tally_core::Credentials;

use crate::output;
use crate::session::SessionContext;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Email address for the new account
    #[arg(long)]
    pub email: String,

    /// Password for the new account
    #[arg(long, env = "TALLY_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Display name
    #[arg(long)]
    pub name: Option<String>,
}

pub async fn run(args: RegisterArgs, context: &SessionContext) -> Result<()> {
    let client = context.client()?;
    let credentials = Credentials::new(&args.email, &args.password);

    output::progress("Creating account...");

    client
        .register(&credentials, args.name.as_deref())
        .await
        .context("Failed to create account")?;

    output::success("Account created");
    println!();
    output::field("Email", &args.email);
    if let Some(name) = &args.name {
        output::field("Name", name);
    }

    Ok(())
}
