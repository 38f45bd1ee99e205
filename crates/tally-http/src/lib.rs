//! tally-http - Authenticated HTTP access to the tally API.
//!
//! Every call goes through an [`ApiClient`]. It attaches the stored bearer
//! token, and when the server answers 401 it asks the shared
//! [`RefreshCoordinator`] for a new token pair and replays the request once.
//! Concurrent 401s share a single refresh exchange.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tally_core::{ApiUrl, Credentials, MemoryTokenStore};
//! use tally_http::ApiClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = ApiUrl::new("https://tally.example.com").unwrap();
//! let client = ApiClient::new(api, Arc::new(MemoryTokenStore::new()));
//!
//! client.login(&Credentials::new("alice@example.com", "hunter22")).await?;
//! let expenses: serde_json::Value = client.get("/expenses").await?;
//! println!("{expenses}");
//! # Ok(())
//! # }
//! ```

mod auth;
pub mod classify;
mod dispatcher;
pub mod endpoints;
mod export;
mod refresh;
mod request;
mod transport;

pub use dispatcher::ApiClient;
pub use endpoints::{TokenResponse, User};
pub use export::{EXPENSES_CSV_FILENAME, summary_pdf_filename};
pub use refresh::{RefreshCoordinator, RefreshOutcome};
pub use request::RequestDescriptor;
pub use transport::HttpTransport;

pub use tally_core::{Error, Result, SessionError};
