//! Error types for the tally client.
//!
//! [`Error`] is the closed taxonomy every request resolves to. Callers branch
//! on the variant; the message text is for display only.

use std::path::PathBuf;

use thiserror::Error;

/// Classified outcome of a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No response was received (DNS, TLS, connection refused, timeout).
    #[error("connection failed: {message}")]
    Connectivity { message: String },

    /// Credentials are missing, expired, or could not be refreshed.
    ///
    /// Treat as "session ended": the remedy is to log in again.
    #[error("session expired, please log in again")]
    AuthExpired,

    /// The server rejected the request (4xx). A 401 lands here only for
    /// login-style calls, where it means wrong credentials.
    #[error("{message}")]
    Validation { status: u16, message: String },

    /// The server failed to handle the request (5xx).
    #[error("server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// Anything else: unexpected status families, malformed bodies.
    #[error("unexpected response: {message}")]
    Unknown { message: String },
}

impl Error {
    /// Returns true if the caller should re-authenticate.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Error::AuthExpired)
    }

    /// Returns the HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Validation { status, .. } | Error::ServerError { status, .. } => Some(*status),
            Error::AuthExpired => Some(401),
            _ => None,
        }
    }
}

/// Token store persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing storage failed.
    #[error("session storage I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The session could not be encoded.
    #[error("session encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// No durable storage location is available on this host.
    #[error("no storage directory available")]
    NoStorageDir,
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure of a call that opens a new session (login, registration, OAuth).
///
/// Unlike a refresh there is no earlier pair to fall back on, so a pair the
/// server issued but the store could not keep is reported, not ignored.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The server call itself failed.
    #[error(transparent)]
    Request(#[from] Error),

    /// The server issued a session but it could not be saved.
    #[error("session could not be saved: {0}")]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Returns the request error, if that is what failed.
    pub fn as_request(&self) -> Option<&Error> {
        match self {
            SessionError::Request(e) => Some(e),
            SessionError::Store(_) => None,
        }
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_exposed_for_http_errors() {
        let err = Error::ServerError {
            status: 502,
            message: "Bad Gateway".into(),
        };
        assert_eq!(err.status(), Some(502));
        assert_eq!(Error::Unknown { message: "x".into() }.status(), None);
    }

    #[test]
    fn validation_displays_server_message() {
        let err = Error::Validation {
            status: 409,
            message: "Email already registered".into(),
        };
        assert_eq!(err.to_string(), "Email already registered");
        assert!(!err.is_auth_expired());
        assert!(Error::AuthExpired.is_auth_expired());
    }

    #[test]
    fn session_error_keeps_request_and_store_apart() {
        let err = SessionError::from(Error::AuthExpired);
        assert_eq!(err.as_request(), Some(&Error::AuthExpired));

        let err = SessionError::from(StoreError::NoStorageDir);
        assert_eq!(err.as_request(), None);
        assert_eq!(
            err.to_string(),
            "session could not be saved: no storage directory available"
        );
    }
}
