//! Session lifecycle: login, registration, Google sign-in, logout.

use reqwest::StatusCode;
use tracing::{debug, info, instrument, warn};

use tally_core::{Credentials, Error, Result, SessionError, StoreError};

use crate::classify;
use crate::dispatcher::ApiClient;
use crate::endpoints::{
    GOOGLE_LOGIN, GoogleLoginRequest, LOGIN, LoginRequest, ME, REGISTER, RegisterRequest,
    TokenResponse, User,
};
use crate::refresh::RefreshOutcome;
use crate::request::RequestDescriptor;

type SessionResult = std::result::Result<(), SessionError>;

impl ApiClient {
    /// Log in with email and password and store the new session.
    ///
    /// Wrong credentials come back as [`Error::Validation`] with status 401
    /// and the server's message. There is no session to expire yet. A
    /// session the store cannot save is [`SessionError::Store`].
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    pub async fn login(&self, credentials: &Credentials) -> SessionResult {
        info!("Logging in");
        let request = RequestDescriptor::post(LOGIN).with_json(&LoginRequest {
            email: credentials.email(),
            password: credentials.password(),
        })?;
        self.open_session(request).await
    }

    /// Create an account and store its first session.
    #[instrument(skip(self, credentials, name), fields(email = %credentials.email()))]
    pub async fn register(&self, credentials: &Credentials, name: Option<&str>) -> SessionResult {
        info!("Registering account");
        let request = RequestDescriptor::post(REGISTER).with_json(&RegisterRequest {
            email: credentials.email(),
            password: credentials.password(),
            name,
        })?;
        self.open_session(request).await
    }

    /// Exchange a Google ID token for a session.
    #[instrument(skip_all)]
    pub async fn google_login(&self, id_token: &str) -> SessionResult {
        info!("Logging in with Google");
        let request =
            RequestDescriptor::post(GOOGLE_LOGIN).with_json(&GoogleLoginRequest { token: id_token })?;
        self.open_session(request).await
    }

    /// Fetch the authenticated user.
    pub async fn me(&self) -> Result<User> {
        self.get(ME).await
    }

    /// Forget the stored session. Nothing is sent to the server.
    pub fn logout(&self) -> std::result::Result<(), StoreError> {
        info!("Logging out");
        self.store.clear()
    }

    /// Returns true if a session is stored.
    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    /// Refresh the stored session now.
    ///
    /// Goes through the same single-flight path as a 401, so calling this
    /// while requests are already refreshing joins their exchange.
    pub async fn refresh(&self) -> Result<()> {
        let Some(session) = self.store.get() else {
            return Err(Error::AuthExpired);
        };

        match self
            .coordinator
            .request_refresh(session.access_token())
            .await
        {
            RefreshOutcome::Refreshed(_) => Ok(()),
            RefreshOutcome::Failed => Err(Error::AuthExpired),
        }
    }

    async fn open_session(&self, request: RequestDescriptor) -> SessionResult {
        let response = self.transport.send(&request, None).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.bytes().await.unwrap_or_default();
            let message =
                classify::extract_message(&body).unwrap_or_else(|| "invalid credentials".to_string());
            return Err(Error::Validation {
                status: StatusCode::UNAUTHORIZED.as_u16(),
                message,
            }
            .into());
        }

        let tokens: TokenResponse = classify::decode_response(response).await?;
        debug!(token_type = %tokens.token_type, "Session issued");

        if let Err(e) = self.store.set(tokens.into_session()) {
            warn!(error = %e, "Session could not be persisted");
            return Err(e.into());
        }
        Ok(())
    }
}
