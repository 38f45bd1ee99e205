//! In-memory token store.

use std::sync::RwLock;

use tracing::trace;

use crate::Session;
use crate::error::StoreError;
use crate::traits::TokenStore;

/// A [`TokenStore`] that keeps the pair in process memory only.
///
/// Useful for tests and for embedders that persist the session themselves.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    session: RwLock<Option<Session>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a pair.
    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set(&self, session: Session) -> Result<(), StoreError> {
        trace!("Storing session in memory");
        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        trace!("Clearing in-memory session");
        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let store = MemoryTokenStore::new();
        assert!(store.get().is_none());

        let session = Session::from_raw("A1", "R1");
        store.set(session.clone()).unwrap();
        assert_eq!(store.get(), Some(session));
        assert!(store.is_authenticated());
    }

    #[test]
    fn clear_removes_pair() {
        let store = MemoryTokenStore::with_session(Session::from_raw("A1", "R1"));
        store.clear().unwrap();
        assert!(store.get().is_none());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn set_replaces_prior_pair() {
        let store = MemoryTokenStore::with_session(Session::from_raw("A1", "R1"));
        store.set(Session::from_raw("A2", "R2")).unwrap();
        let session = store.get().unwrap();
        assert_eq!(session.access_token().as_str(), "A2");
        assert_eq!(session.refresh_token().as_str(), "R2");
    }

    #[test]
    fn concurrent_readers_never_see_mixed_pair() {
        let store = Arc::new(MemoryTokenStore::with_session(Session::from_raw("A0", "R0")));

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 1..500 {
                    store
                        .set(Session::from_raw(format!("A{i}"), format!("R{i}")))
                        .unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let session = store.get().unwrap();
                        let access = &session.access_token().as_str()[1..];
                        let refresh = &session.refresh_token().as_str()[1..];
                        assert_eq!(access, refresh);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
