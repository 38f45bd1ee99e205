//! Token store trait.

use crate::Session;
use crate::error::StoreError;

/// Owner of the current credential pair.
///
/// Implementations hold either a complete [`Session`] or nothing. Writes
/// replace the whole pair at once, so a concurrent `get` observes the pair
/// before or after a write and never a mix of the two.
///
/// The store does not track expiry. The server decides when a token is no
/// longer valid and the client only finds out through a rejected request.
pub trait TokenStore: Send + Sync {
    /// Returns the current pair, if any.
    fn get(&self) -> Option<Session>;

    /// Replace the stored pair.
    fn set(&self, session: Session) -> Result<(), StoreError>;

    /// Remove the stored pair.
    fn clear(&self) -> Result<(), StoreError>;

    /// Returns the current pair after picking up writes made outside this
    /// process. Stores with no shared backing just return [`get`](Self::get).
    fn reload(&self) -> Option<Session> {
        self.get()
    }

    /// Returns true if a pair is stored.
    fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }
}
