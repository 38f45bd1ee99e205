use std::path::Path;
use std::process::Output;

use serde_json::{Value, json};
use tokio::process::Command;

/// Run the CLI against `api_url` with an isolated session file.
pub async fn run_cli(args: &[&str], session_file: &Path, api_url: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tally"))
        .args(args)
        .env("TALLY_API_URL", api_url)
        .env("TALLY_SESSION_FILE", session_file)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("TALLY_PASSWORD")
        .output()
        .await
        .expect("Failed to execute CLI")
}

/// Run the CLI and expect success, returning stdout.
pub async fn run_cli_success(args: &[&str], session_file: &Path, api_url: &str) -> String {
    let output = run_cli(args, session_file, api_url).await;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Write a token pair where the CLI expects to find it.
pub fn write_session(session_file: &Path, access: &str, refresh: &str) {
    let json = json!({ "access_token": access, "refresh_token": refresh });
    std::fs::write(session_file, json.to_string()).unwrap();
}

/// Read back the stored pair, if any.
pub fn read_session(session_file: &Path) -> Option<(String, String)> {
    let json = std::fs::read_to_string(session_file).ok()?;
    let value: Value = serde_json::from_str(&json).ok()?;
    Some((
        value["access_token"].as_str()?.to_string(),
        value["refresh_token"].as_str()?.to_string(),
    ))
}

pub fn tokens(access: &str, refresh: &str) -> Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer"
    })
}
