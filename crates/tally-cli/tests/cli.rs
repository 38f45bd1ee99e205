//! CLI integration tests against a mock tally server.

mod common;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{read_session, run_cli, run_cli_success, tokens, write_session};

#[tokio::test]
async fn test_login_then_whoami() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let session_file = temp_dir.path().join("session.json");

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_json(json!({
            "email": "alice@example.com",
            "password": "secret123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens("A1", "R1")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u1",
            "email": "alice@example.com",
            "name": "Alice"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let stdout = run_cli_success(
        &[
            "login",
            "--email",
            "alice@example.com",
            "--password",
            "secret123",
        ],
        &session_file,
        &server.uri(),
    )
    .await;
    assert!(stdout.contains("Logged in successfully"));
    assert_eq!(
        read_session(&session_file),
        Some(("A1".to_string(), "R1".to_string()))
    );

    let stdout = run_cli_success(&["whoami"], &session_file, &server.uri()).await;
    assert!(stdout.contains("alice@example.com"));
    assert!(stdout.contains("Alice"));
}

#[tokio::test]
async fn test_login_wrong_password() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let session_file = temp_dir.path().join("session.json");

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Invalid email or password" })),
        )
        .mount(&server)
        .await;

    let output = run_cli(
        &["login", "--email", "alice@example.com", "--password", "nope"],
        &session_file,
        &server.uri(),
    )
    .await;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid email or password"));
    assert!(!session_file.exists());
}

#[tokio::test]
async fn test_login_fails_when_session_cannot_be_saved() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();
    let session_file = blocker.join("session.json");

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens("A1", "R1")))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_cli(
        &["login", "--email", "alice@example.com", "--password", "secret123"],
        &session_file,
        &server.uri(),
    )
    .await;

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stdout.contains("Logged in successfully"));
    assert!(stderr.contains("session could not be saved"));
}

#[tokio::test]
async fn test_whoami_without_session() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let session_file = temp_dir.path().join("session.json");

    let output = run_cli(&["whoami"], &session_file, &server.uri()).await;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No active session"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_expired_session_is_refreshed_and_saved() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let session_file = temp_dir.path().join("session.json");
    write_session(&session_file, "A1", "R1");

    Mock::given(method("GET"))
        .and(path("/api/v1/expenses"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .and(body_json(json!({ "refresh_token": "R1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens("A2", "R2")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/expenses"))
        .and(header("authorization", "Bearer A2"))
        .and(query_param("month", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "e1", "description": "Coffee" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let stdout = run_cli_success(
        &["get", "/expenses", "--query", "month=3"],
        &session_file,
        &server.uri(),
    )
    .await;

    assert!(stdout.contains("Coffee"));
    assert_eq!(
        read_session(&session_file),
        Some(("A2".to_string(), "R2".to_string()))
    );
}

#[tokio::test]
async fn test_rejected_refresh_ends_session() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let session_file = temp_dir.path().join("session.json");
    write_session(&session_file, "A1", "R1");

    Mock::given(method("GET"))
        .and(path("/api/v1/budgets"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_cli(&["get", "/budgets"], &session_file, &server.uri()).await;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("tally login"));
    assert_eq!(read_session(&session_file), None);
}

#[tokio::test]
async fn test_post_sends_body() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let session_file = temp_dir.path().join("session.json");
    write_session(&session_file, "A1", "R1");

    Mock::given(method("POST"))
        .and(path("/api/v1/categories"))
        .and(header("authorization", "Bearer A1"))
        .and(body_json(json!({ "name": "Groceries" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "c1" })))
        .expect(1)
        .mount(&server)
        .await;

    let stdout = run_cli_success(
        &["post", "/categories", "--data", r#"{"name": "Groceries"}"#],
        &session_file,
        &server.uri(),
    )
    .await;

    assert!(stdout.contains("c1"));
}

#[tokio::test]
async fn test_delete_reports_success() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let session_file = temp_dir.path().join("session.json");
    write_session(&session_file, "A1", "R1");

    Mock::given(method("DELETE"))
        .and(path("/api/v1/expenses/e1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let stdout = run_cli_success(&["delete", "/expenses/e1"], &session_file, &server.uri()).await;

    assert!(stdout.contains("succeeded"));
}

#[tokio::test]
async fn test_export_csv_writes_file() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let session_file = temp_dir.path().join("session.json");
    let destination = temp_dir.path().join("march.csv");
    write_session(&session_file, "A1", "R1");

    Mock::given(method("GET"))
        .and(path("/api/v1/export/expenses.csv"))
        .and(query_param("month", "3"))
        .and(query_param("year", "2025"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"date,amount\n".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    run_cli_success(
        &[
            "export",
            "csv",
            "--month",
            "3",
            "--year",
            "2025",
            "--output",
            destination.to_str().unwrap(),
        ],
        &session_file,
        &server.uri(),
    )
    .await;

    assert_eq!(std::fs::read(&destination).unwrap(), b"date,amount\n");
}

#[tokio::test]
async fn test_export_rejects_invalid_month() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let session_file = temp_dir.path().join("session.json");
    write_session(&session_file, "A1", "R1");

    let output = run_cli(
        &["export", "pdf", "--month", "13", "--year", "2025"],
        &session_file,
        &server.uri(),
    )
    .await;

    assert!(!output.status.success());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_logout_removes_session() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let session_file = temp_dir.path().join("session.json");
    write_session(&session_file, "A1", "R1");

    let stdout = run_cli_success(&["logout"], &session_file, &server.uri()).await;

    assert!(stdout.contains("Logged out"));
    assert_eq!(read_session(&session_file), None);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_verbose_logging_goes_to_stderr() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let session_file = temp_dir.path().join("session.json");

    let output = run_cli(&["logout", "-vv"], &session_file, &server.uri()).await;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("Already logged out"));
    assert!(stderr.contains("Opening session file"));
    assert!(stderr.contains("No session to remove"));
    assert!(!stdout.contains("No session to remove"));
}
