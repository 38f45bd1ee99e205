//! API routes and the request/response bodies this crate reads or writes.
//!
//! Only the auth and export routes are modeled. Every other resource goes
//! through the generic verbs on [`ApiClient`](crate::ApiClient) untouched.

use serde::{Deserialize, Serialize};

use tally_core::Session;

// ============================================================================
// Routes
// ============================================================================

pub const LOGIN: &str = "/auth/login";

pub const REGISTER: &str = "/auth/register";

/// Exchange a Google ID token for a session.
pub const GOOGLE_LOGIN: &str = "/auth/google";

pub const REFRESH: &str = "/auth/refresh";

pub const ME: &str = "/auth/me";

pub const EXPORT_EXPENSES_CSV: &str = "/export/expenses.csv";

pub const EXPORT_SUMMARY_PDF: &str = "/export/summary.pdf";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GoogleLoginRequest<'a> {
    pub token: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Query parameters for the export routes.
#[derive(Debug, Serialize)]
pub(crate) struct ExportQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

/// Token pair returned by login, registration, Google login and refresh.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl TokenResponse {
    pub fn into_session(self) -> Session {
        Session::from_raw(self.access_token, self.refresh_token)
    }
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// The authenticated user, from `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Error body shape: `{"detail": "..."}` or `{"detail": [{"msg": "..."}]}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ErrorDetail {
    Message(String),
    Items(Vec<ErrorItem>),
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorItem {
    #[serde(default)]
    pub msg: Option<String>,
}
