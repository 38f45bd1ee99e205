//! Where the CLI keeps its session and how it reaches the server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use tally_core::{ApiUrl, Error};
use tally_file::FileTokenStore;
use tally_http::ApiClient;

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct SessionContext {
    api: ApiUrl,
    session_file: PathBuf,
}

impl SessionContext {
    pub fn new(api_url: &str, session_file: Option<PathBuf>) -> Result<Self> {
        let api = ApiUrl::new(api_url).context("Invalid API URL")?;
        let session_file = match session_file {
            Some(path) => path,
            None => FileTokenStore::default_location()
                .context("Could not determine session file location")?,
        };

        Ok(Self { api, session_file })
    }

    pub fn api_url(&self) -> &ApiUrl {
        &self.api
    }

    pub fn session_file(&self) -> &Path {
        &self.session_file
    }

    /// Open the session file.
    pub fn store(&self) -> Result<Arc<FileTokenStore>> {
        debug!(path = %self.session_file.display(), "Opening session file");
        let store = FileTokenStore::open(&self.session_file).with_context(|| {
            format!(
                "Failed to open session file {}",
                self.session_file.display()
            )
        })?;
        Ok(Arc::new(store))
    }

    /// Build an API client backed by the session file.
    pub fn client(&self) -> Result<ApiClient> {
        Ok(ApiClient::new(self.api.clone(), self.store()?))
    }

    /// Build a client, failing early when there is no session to use.
    pub fn authenticated_client(&self) -> Result<ApiClient> {
        let client = self.client()?;
        debug!(authenticated = client.is_authenticated(), api = %self.api, "Client ready");
        anyhow::ensure!(
            client.is_authenticated(),
            "No active session. Run 'tally login' first."
        );
        Ok(client)
    }
}

/// Returns true if `error` was caused by an ended session.
pub fn is_auth_expired(error: &anyhow::Error) -> bool {
    error
        .chain()
        .any(|cause| cause.downcast_ref::<Error>().is_some_and(Error::is_auth_expired))
}
