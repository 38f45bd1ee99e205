//! Core traits shared by the client crates.

mod store;

pub use store::TokenStore;
