//! Whoami command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;
use crate::session::SessionContext;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the user as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: WhoamiArgs, context: &SessionContext) -> Result<()> {
    let client = context.authenticated_client()?;

    let user = client.me().await.context("Failed to fetch user")?;

    if args.json {
        return output::json(&user);
    }

    output::field("ID", &user.id);
    output::field("Email", &user.email);
    if let Some(name) = &user.name {
        output::field("Name", name);
    }

    Ok(())
}
