//! tally-core - Session types and token storage for the tally API client.

pub mod credentials;
pub mod error;
pub mod memory;
pub mod tokens;
pub mod traits;
pub mod types;

pub use credentials::Credentials;
pub use error::{Error, InvalidInputError, SessionError, StoreError};
pub use memory::MemoryTokenStore;
pub use tokens::{AccessToken, RefreshToken, Session};
pub use traits::TokenStore;
pub use types::ApiUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
