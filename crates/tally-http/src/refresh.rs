//! Single-flight token refresh.
//!
//! The coordinator is either idle or running exactly one refresh exchange.
//! Callers that hit a 401 while an exchange is running join it instead of
//! starting their own, and everyone who joined gets the same outcome. A
//! failed exchange clears the token store, ending the session for every
//! waiter at once.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use tally_core::{AccessToken, Error, RefreshToken, Result, Session, TokenStore};

use crate::classify;
use crate::endpoints::{REFRESH, RefreshRequest, TokenResponse};
use crate::request::RequestDescriptor;
use crate::transport::HttpTransport;

/// What a refresh resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new pair was stored; replay with this access token.
    Refreshed(AccessToken),
    /// No new pair is available and the session has ended.
    Failed,
}

/// Shares one refresh exchange among all concurrent callers.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    transport: HttpTransport,
    store: Arc<dyn TokenStore>,
    state: Mutex<RefreshState>,
}

enum RefreshState {
    Idle,
    Refreshing(RefreshTicket),
}

/// Handle on the exchange in flight.
#[derive(Clone)]
struct RefreshTicket {
    outcome: watch::Receiver<Option<RefreshOutcome>>,
}

impl RefreshTicket {
    async fn wait(mut self) -> RefreshOutcome {
        let outcome = match self.outcome.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome).clone(),
            // The exchange task went away without reporting.
            Err(_) => None,
        };
        outcome.unwrap_or(RefreshOutcome::Failed)
    }
}

impl RefreshCoordinator {
    pub fn new(transport: HttpTransport, store: Arc<dyn TokenStore>) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                transport,
                store,
                state: Mutex::new(RefreshState::Idle),
            }),
        }
    }

    /// Returns true while an exchange is in flight.
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.inner.lock_state(), RefreshState::Refreshing(_))
    }

    /// Obtain an access token newer than `stale`.
    ///
    /// `stale` is the token the caller's request was rejected with. If the
    /// store already holds a different token, a refresh finished after that
    /// request went out and its token is returned without another exchange.
    /// Otherwise this starts an exchange, or joins the one in flight, and
    /// waits for it.
    pub async fn request_refresh(&self, stale: &AccessToken) -> RefreshOutcome {
        let (ticket, exchange) = {
            let mut state = self.inner.lock_state();
            let in_flight = match &*state {
                RefreshState::Refreshing(ticket) => Some(ticket.clone()),
                RefreshState::Idle => None,
            };

            match in_flight {
                Some(ticket) => {
                    debug!("Joining refresh in flight");
                    (ticket, None)
                }
                None => {
                    // Another process sharing the store may have refreshed.
                    let Some(session) = self.inner.store.reload() else {
                        debug!("No session to refresh");
                        return RefreshOutcome::Failed;
                    };
                    if session.access_token() != stale {
                        debug!("Session was already refreshed");
                        return RefreshOutcome::Refreshed(session.access_token().clone());
                    }

                    let (tx, rx) = watch::channel(None);
                    let ticket = RefreshTicket { outcome: rx };
                    *state = RefreshState::Refreshing(ticket.clone());

                    let guard = ExchangeGuard {
                        inner: Arc::clone(&self.inner),
                        tx,
                        outcome: None,
                    };
                    (ticket, Some((guard, session.refresh_token().clone())))
                }
            }
        };

        // Spawned outside the state lock: the guard takes that lock when the
        // task is dropped, even if it never ran. Detached so a caller
        // dropping its future cannot strand the other waiters.
        if let Some((guard, refresh_token)) = exchange {
            tokio::spawn(guard.run(refresh_token));
        }

        ticket.wait().await
    }
}

impl CoordinatorInner {
    fn lock_state(&self) -> std::sync::MutexGuard<'_, RefreshState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[instrument(skip_all)]
    async fn exchange(&self, refresh_token: &RefreshToken) -> Result<Session> {
        let request = RequestDescriptor::post(REFRESH).with_json(&RefreshRequest {
            refresh_token: refresh_token.as_str(),
        })?;

        let response = self.transport.send(&request, None).await?;
        let tokens: TokenResponse = classify::decode_response(response).await?;

        Ok(tokens.into_session())
    }
}

/// Owns the single exchange in flight.
///
/// Dropping it returns the coordinator to Idle and only then publishes the
/// outcome. If the exchange never got to report (panic, runtime shutdown)
/// the session is cleared as for any other failed refresh and waiters see
/// [`RefreshOutcome::Failed`].
struct ExchangeGuard {
    inner: Arc<CoordinatorInner>,
    tx: watch::Sender<Option<RefreshOutcome>>,
    outcome: Option<RefreshOutcome>,
}

impl ExchangeGuard {
    async fn run(mut self, refresh_token: RefreshToken) {
        info!("Refreshing session");

        let outcome = match self.inner.exchange(&refresh_token).await {
            Ok(session) => {
                let access_token = session.access_token().clone();
                if let Err(e) = self.inner.store.set(session) {
                    warn!(error = %e, "Refreshed session could not be persisted");
                }
                info!("Session refreshed");
                RefreshOutcome::Refreshed(access_token)
            }
            Err(e) => self.fail(&refresh_token, &e),
        };

        self.outcome = Some(outcome);
    }

    fn fail(&self, spent: &RefreshToken, error: &Error) -> RefreshOutcome {
        // A pair rotated by another process must survive our rejection.
        if let Some(session) = self.inner.store.reload()
            && session.refresh_token() != spent
        {
            info!(error = %error, "Refresh rejected but a newer session is stored");
            return RefreshOutcome::Refreshed(session.access_token().clone());
        }

        warn!(error = %error, "Session refresh failed, clearing session");
        self.clear_store();
        RefreshOutcome::Failed
    }

    fn clear_store(&self) {
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "Failed to clear session");
        }
    }
}

impl Drop for ExchangeGuard {
    fn drop(&mut self) {
        let outcome = self.outcome.take().unwrap_or_else(|| {
            warn!("Session refresh ended without an outcome, clearing session");
            self.clear_store();
            RefreshOutcome::Failed
        });

        // Back to idle before waking anyone, so a waiter that immediately
        // fails again starts a fresh exchange instead of rejoining this one.
        *self.inner.lock_state() = RefreshState::Idle;
        self.tx.send_replace(Some(outcome));
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refreshing", &self.is_refreshing())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{ApiUrl, MemoryTokenStore};

    fn coordinator(store: Arc<MemoryTokenStore>) -> RefreshCoordinator {
        // Nothing listens on the discard port, so an exchange fails fast.
        let api = ApiUrl::new("http://127.0.0.1:9").unwrap();
        RefreshCoordinator::new(HttpTransport::new(api), store)
    }

    #[tokio::test]
    async fn empty_store_fails_without_exchange() {
        let store = Arc::new(MemoryTokenStore::new());
        let coordinator = coordinator(store);

        let outcome = coordinator.request_refresh(&AccessToken::new("A1")).await;
        assert_eq!(outcome, RefreshOutcome::Failed);
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn newer_token_is_returned_without_exchange() {
        let store = Arc::new(MemoryTokenStore::with_session(Session::from_raw("A2", "R2")));
        let coordinator = coordinator(Arc::clone(&store));

        let outcome = coordinator.request_refresh(&AccessToken::new("A1")).await;
        assert_eq!(outcome, RefreshOutcome::Refreshed(AccessToken::new("A2")));
        assert_eq!(store.get(), Some(Session::from_raw("A2", "R2")));
    }

    #[tokio::test]
    async fn unreachable_refresh_endpoint_fails_closed() {
        let store = Arc::new(MemoryTokenStore::with_session(Session::from_raw("A1", "R1")));
        let coordinator = coordinator(Arc::clone(&store));

        let outcome = coordinator.request_refresh(&AccessToken::new("A1")).await;
        assert_eq!(outcome, RefreshOutcome::Failed);
        assert!(store.get().is_none());
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn exchange_dropped_before_running_fails_closed() {
        let store = Arc::new(MemoryTokenStore::with_session(Session::from_raw("A1", "R1")));
        let coordinator = coordinator(Arc::clone(&store));

        let (tx, rx) = watch::channel(None);
        *coordinator.inner.lock_state() =
            RefreshState::Refreshing(RefreshTicket { outcome: rx.clone() });
        let guard = ExchangeGuard {
            inner: Arc::clone(&coordinator.inner),
            tx,
            outcome: None,
        };

        // What a runtime shutdown does to a task that never got polled.
        drop(guard.run(RefreshToken::new("R1")));

        assert!(!coordinator.is_refreshing());
        assert!(store.get().is_none());
        assert_eq!(RefreshTicket { outcome: rx }.wait().await, RefreshOutcome::Failed);
    }
}
