//! Error classification.
//!
//! Maps a transport outcome, a status code and an optional body onto the
//! closed [`Error`] taxonomy. Everything here is a pure function of its
//! inputs except [`decode_response`], which first reads the body.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use tally_core::{Error, Result};

use crate::endpoints::{ErrorDetail, ErrorResponse};

/// Classify a request that produced no response.
pub fn transport_error(err: reqwest::Error) -> Error {
    if err.is_builder() {
        Error::Unknown {
            message: err.to_string(),
        }
    } else if err.is_timeout() {
        Error::Connectivity {
            message: format!("request timed out: {err}"),
        }
    } else {
        Error::Connectivity {
            message: err.to_string(),
        }
    }
}

/// Classify a non-2xx status.
///
/// 401 is always [`Error::AuthExpired`]; whether a refresh is attempted
/// first is decided by the caller, not here.
pub fn classify_status(status: StatusCode, body: &[u8]) -> Error {
    if status == StatusCode::UNAUTHORIZED {
        return Error::AuthExpired;
    }

    let message = extract_message(body).unwrap_or_else(|| status_text(status));
    let code = status.as_u16();

    match code {
        400..=499 => Error::Validation {
            status: code,
            message,
        },
        500..=599 => Error::ServerError {
            status: code,
            message,
        },
        _ => Error::Unknown {
            message: format!("HTTP {code}: {message}"),
        },
    }
}

/// Pull a human readable message out of an error body.
///
/// Understands `{"detail": "..."}` and the list form
/// `{"detail": [{"msg": "..."}, ...]}`, taking the first entry.
pub fn extract_message(body: &[u8]) -> Option<String> {
    let parsed: ErrorResponse = serde_json::from_slice(body).ok()?;
    let message = match parsed.detail? {
        ErrorDetail::Message(message) => message,
        ErrorDetail::Items(items) => items.into_iter().next()?.msg?,
    };
    (!message.is_empty()).then_some(message)
}

/// Decode a 2xx body into the caller's type.
///
/// 204 and empty bodies decode from JSON `null`, which suits `()` and
/// `Option<T>`.
pub fn decode_success<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T> {
    if status == StatusCode::NO_CONTENT || body.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_value(Value::Null).map_err(|e| Error::Unknown {
            message: format!("empty response body: {e}"),
        });
    }

    serde_json::from_slice(body).map_err(|e| Error::Unknown {
        message: format!("malformed response body: {e}"),
    })
}

/// Read and classify a response in one go.
pub async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if status == StatusCode::NO_CONTENT {
        return decode_success(status, &[]);
    }

    let body = response.bytes().await.map_err(transport_error)?;

    if status.is_success() {
        decode_success(status, &body)
    } else {
        Err(classify_status(status, &body))
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
