//! Subcommand implementations.

mod export;
mod google_login;
mod login;
mod logout;
mod refresh_token;
mod register;
mod request;
mod whoami;

use anyhow::Result;
use clap::Subcommand;

use crate::session::SessionContext;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in with email and password
    Login(login::LoginArgs),

    /// Create an account and log in
    Register(register::RegisterArgs),

    /// Log in with a Google ID token
    GoogleLogin(google_login::GoogleLoginArgs),

    /// Forget the stored session
    Logout(logout::LogoutArgs),

    /// Show the signed-in user
    Whoami(whoami::WhoamiArgs),

    /// Refresh the session tokens
    RefreshToken(refresh_token::RefreshTokenArgs),

    /// Send an authenticated GET request
    Get(request::ReadArgs),

    /// Send an authenticated POST request
    Post(request::WriteArgs),

    /// Send an authenticated PATCH request
    Patch(request::WriteArgs),

    /// Send an authenticated DELETE request
    Delete(request::ReadArgs),

    /// Download expenses as CSV or a monthly summary as PDF
    Export(export::ExportArgs),
}

pub async fn handle(command: Command, context: &SessionContext) -> Result<()> {
    match command {
        Command::Login(args) => login::run(args, context).await,
        Command::Register(args) => register::run(args, context).await,
        Command::GoogleLogin(args) => google_login::run(args, context).await,
        Command::Logout(args) => logout::run(args, context),
        Command::Whoami(args) => whoami::run(args, context).await,
        Command::RefreshToken(args) => refresh_token::run(args, context).await,
        Command::Get(args) => request::get(args, context).await,
        Command::Post(args) => request::post(args, context).await,
        Command::Patch(args) => request::patch(args, context).await,
        Command::Delete(args) => request::delete(args, context).await,
        Command::Export(args) => export::run(args, context).await,
    }
}
