//! HTTP transport: turns a descriptor plus an optional token into a response.

use reqwest::header::{AUTHORIZATION, HeaderValue};
use tracing::{debug, instrument, trace};

use tally_core::{AccessToken, ApiUrl, Error, Result};

use crate::classify;
use crate::request::RequestDescriptor;

/// Sends requests to one API origin.
///
/// The transport knows nothing about sessions. It attaches whatever token
/// it is given and reports the raw response; deciding what a 401 means is
/// the dispatcher's job.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    api: ApiUrl,
}

impl HttpTransport {
    /// Create a transport with a default client.
    pub fn new(api: ApiUrl) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tally/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");

        Self::with_client(api, client)
    }

    /// Create a transport around a caller-configured client (timeouts,
    /// proxies, TLS roots).
    pub fn with_client(api: ApiUrl, client: reqwest::Client) -> Self {
        Self { client, api }
    }

    pub fn api_url(&self) -> &ApiUrl {
        &self.api
    }

    /// Send one request. A transport failure is returned as
    /// [`Error::Connectivity`]; any HTTP status is returned as a response.
    #[instrument(skip_all, fields(method = %request.method(), path = request.path()))]
    pub async fn send(
        &self,
        request: &RequestDescriptor,
        token: Option<&AccessToken>,
    ) -> Result<reqwest::Response> {
        let url = self.api.endpoint(request.path());
        debug!(authenticated = token.is_some(), "Sending request");

        let mut headers = request.headers().clone();
        headers.remove(AUTHORIZATION);
        if let Some(token) = token {
            headers.insert(AUTHORIZATION, auth_header(token)?);
        }

        let mut builder = self
            .client
            .request(request.method().clone(), &url)
            .headers(headers);

        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(classify::transport_error)?;
        trace!(status = %response.status(), "Response received");

        Ok(response)
    }
}

fn auth_header(token: &AccessToken) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&token.bearer()).map_err(|_| Error::Unknown {
        message: "access token contains characters not allowed in a header".to_string(),
    })?;
    value.set_sensitive(true);
    Ok(value)
}
