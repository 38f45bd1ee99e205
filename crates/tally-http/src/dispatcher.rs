//! Request dispatch with refresh-and-replay.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use tally_core::{ApiUrl, Error, Result, TokenStore};

use crate::classify;
use crate::refresh::{RefreshCoordinator, RefreshOutcome};
use crate::request::RequestDescriptor;
use crate::transport::HttpTransport;

/// Client for the tally API.
///
/// Cheap to clone; clones share the token store and the refresh
/// coordinator, so a refresh triggered through one clone is seen by all.
///
/// Each logical call is sent with the stored access token. A 401 on the
/// first attempt triggers one refresh (shared with any other caller that
/// hit a 401 meanwhile) and one replay. A 401 on the replay is final.
#[derive(Clone)]
pub struct ApiClient {
    pub(crate) transport: HttpTransport,
    pub(crate) store: Arc<dyn TokenStore>,
    pub(crate) coordinator: RefreshCoordinator,
}

impl ApiClient {
    /// Create a client for `api` backed by `store`.
    pub fn new(api: ApiUrl, store: Arc<dyn TokenStore>) -> Self {
        Self::with_transport(HttpTransport::new(api), store)
    }

    /// Create a client around a preconfigured transport.
    pub fn with_transport(transport: HttpTransport, store: Arc<dyn TokenStore>) -> Self {
        let coordinator = RefreshCoordinator::new(transport.clone(), Arc::clone(&store));
        Self {
            transport,
            store,
            coordinator,
        }
    }

    pub fn api_url(&self) -> &ApiUrl {
        self.transport.api_url()
    }

    /// Returns the token store this client reads from.
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(RequestDescriptor::get(path)).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(RequestDescriptor::get(path).with_query(query)?)
            .await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(RequestDescriptor::post(path).with_json(body)?)
            .await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(RequestDescriptor::patch(path).with_json(body)?)
            .await
    }

    /// Delete a resource. Use `()` as `T` for the usual 204 response.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(RequestDescriptor::delete(path)).await
    }

    /// Send a prepared request through the refresh-and-replay path.
    #[instrument(skip_all, fields(method = %request.method(), path = request.path()))]
    pub async fn send<T: DeserializeOwned>(&self, request: RequestDescriptor) -> Result<T> {
        let token = self
            .store
            .get()
            .map(|session| session.access_token().clone());

        let response = self.transport.send(&request, token.as_ref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return classify::decode_response(response).await;
        }

        let Some(stale) = token else {
            debug!("Rejected without a session");
            return Err(Error::AuthExpired);
        };

        let fresh = match self.coordinator.request_refresh(&stale).await {
            RefreshOutcome::Refreshed(token) => token,
            RefreshOutcome::Failed => return Err(Error::AuthExpired),
        };

        debug!("Replaying with refreshed token");
        let replay = self.transport.send(&request, Some(&fresh)).await?;

        // No second refresh: a replay rejected with the new token is final.
        classify::decode_response(replay).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api", self.transport.api_url())
            .field("authenticated", &self.store.is_authenticated())
            .field("coordinator", &self.coordinator)
            .finish()
    }
}
