//! Gmail `OAuth2` token lifecycle.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use url::Url;

use mailpass_oauth::{AuthorizationCodeFlow, OAuthClient, Provider, Token, TokenPair};

use crate::auth_config::AuthConfig;
use crate::config::Credentials;
use crate::profile::{GMAIL_API_BASE, Profile, ProfileClient};
use crate::store::TokenStore;
use crate::{Error, Result};

/// Provider and mail API locations used by a [`TokenManager`].
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// `OAuth2` provider (authorization, token, revocation).
    pub provider: Provider,
    /// Base URL of the Gmail API, used for the profile lookup.
    pub api_base: Url,
}

impl Endpoints {
    /// Creates endpoints from parts.
    #[must_use]
    pub const fn new(provider: Provider, api_base: Url) -> Self {
        Self { provider, api_base }
    }

    /// Google's production endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in URL fails to parse.
    pub fn google() -> Result<Self> {
        let provider = Provider::google().map_err(config_error)?;
        let api_base = Url::parse(GMAIL_API_BASE).map_err(|e| config_error(e.into()))?;
        Ok(Self::new(provider, api_base))
    }
}

fn config_error(err: mailpass_oauth::Error) -> Error {
    Error::Configuration(err.to_string())
}

/// Owns the `OAuth2` handshake for one Gmail account.
///
/// Starts unauthenticated. [`exchange_code`](Self::exchange_code) or
/// [`restore_tokens`](Self::restore_tokens) make it authenticated;
/// [`ensure_token_fresh`](Self::ensure_token_fresh) keeps it that way.
/// Nothing clears the tokens except another exchange or restore.
pub struct TokenManager {
    credentials: Credentials,
    flow: AuthorizationCodeFlow,
    profiles: ProfileClient,
    token: Option<Token>,
    profile: Option<Profile>,
}

impl TokenManager {
    /// Creates a manager against Google's endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the credentials are incomplete.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_endpoints(credentials, Endpoints::google()?)
    }

    /// Creates a manager against custom endpoints.
    ///
    /// Every client setting (app name, scopes, offline access, redirect URI,
    /// timeout) is derived here from `credentials` and never changes after.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the credentials or endpoints are
    /// invalid, or the HTTP client cannot be built.
    pub fn with_endpoints(credentials: Credentials, endpoints: Endpoints) -> Result<Self> {
        credentials.validate()?;

        let provider = endpoints
            .provider
            .with_default_scopes(Credentials::scopes());
        provider.validate().map_err(config_error)?;

        let http_client = reqwest::Client::builder()
            .timeout(credentials.request_timeout())
            .user_agent(credentials.app_name.clone())
            .build()
            .map_err(|e| Error::Configuration(format!("HTTP client: {e}")))?;

        let client = OAuthClient::new(credentials.client_id.clone(), provider)
            .with_client_secret(credentials.secret.clone())
            .with_redirect_uri(credentials.redirect_uri.clone())
            .with_http_client(http_client.clone());

        debug!(
            app = %credentials.app_name,
            project = %credentials.project_id,
            "Token manager initialized"
        );

        Ok(Self {
            flow: AuthorizationCodeFlow::new(client).with_offline_access(),
            profiles: ProfileClient::new(http_client, endpoints.api_base),
            credentials,
            token: None,
            profile: None,
        })
    }

    /// The credentials this manager was built from.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Installed-application descriptor for these credentials.
    #[must_use]
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig::from_credentials(&self.credentials)
    }

    /// Consent URL the user must visit.
    ///
    /// Uses `state` when given, otherwise a fresh random value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the URL cannot be built.
    pub fn authorization_url(&self, state: Option<&str>) -> Result<Url> {
        let state = state.map_or_else(mailpass_oauth::generate_state, ToString::to_string);
        self.flow
            .authorization_url(None, Some(&state))
            .map_err(config_error)
    }

    /// Exchanges an authorization code for tokens, then looks up the
    /// mailbox profile.
    ///
    /// A failed profile lookup is logged and leaves the email unset; the
    /// tokens are kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authorization`] if the code is empty or rejected, or
    /// the response lacks a refresh token; [`Error::Transport`] on network
    /// failure. Token state is unchanged on error.
    pub async fn exchange_code(&mut self, code: &str) -> Result<()> {
        let token = self
            .flow
            .exchange_code(code, None)
            .await
            .map_err(|e| Error::from_provider(e, Error::Authorization))?;

        if token.refresh_token.is_none() {
            return Err(Error::Authorization(mailpass_oauth::Error::NoRefreshToken));
        }

        self.profile = None;
        let token = self.token.insert(token);
        info!("Authorization code exchanged for tokens");

        match self.profiles.fetch(token).await {
            Ok(profile) => {
                debug!(email = %profile.email_address, "Discovered mailbox address");
                self.profile = Some(profile);
            }
            Err(e) => warn!("Profile lookup after exchange failed: {e}"),
        }

        Ok(())
    }

    /// Looks up the mailbox profile with the current access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAuthenticated`] without tokens,
    /// [`Error::ProfileFetch`] or [`Error::Transport`] on failure.
    pub async fn refresh_profile(&mut self) -> Result<&Profile> {
        let token = self.token.as_ref().ok_or(Error::NotAuthenticated)?;
        let profile = self.profiles.fetch(token).await?;
        Ok(self.profile.insert(profile))
    }

    /// Revokes the grant with the provider.
    ///
    /// Local tokens are left as they are; clear persisted copies separately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAuthenticated`] without tokens,
    /// [`Error::Revocation`] if the provider refuses, [`Error::Transport`]
    /// on network failure.
    pub async fn revoke_access(&self) -> Result<()> {
        let token = self.token.as_ref().ok_or(Error::NotAuthenticated)?;
        self.flow
            .client()
            .revoke_token(token)
            .await
            .map_err(|e| Error::from_provider(e, Error::Revocation))?;
        info!("Access revoked");
        Ok(())
    }

    /// Refreshes the access token if it has expired, then hands the new pair
    /// to `store`.
    ///
    /// Returns whether a refresh happened. A still-valid token costs no
    /// network call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAuthenticated`] without tokens,
    /// [`Error::TokenRefresh`] if the refresh token is rejected (re-run the
    /// consent flow), [`Error::Transport`] on network failure, and
    /// [`Error::Store`] if saving fails. The new tokens are already in
    /// place when saving fails.
    pub async fn ensure_token_fresh<S>(&mut self, store: &S) -> Result<bool>
    where
        S: TokenStore + ?Sized,
    {
        let token = self.token.as_ref().ok_or(Error::NotAuthenticated)?;
        if token.is_valid() {
            debug!("Access token still valid");
            return Ok(false);
        }

        let refreshed = self
            .flow
            .client()
            .refresh_token(token)
            .await
            .map_err(|e| Error::from_provider(e, Error::TokenRefresh))?;

        let pair = refreshed.to_pair();
        self.token = Some(refreshed);
        store.save(&pair)?;

        info!("Access token refreshed and saved");
        Ok(true)
    }

    /// Restores a previously persisted pair. No network call, no validation.
    ///
    /// The expiry is unknown, so the next
    /// [`ensure_token_fresh`](Self::ensure_token_fresh) refreshes. An empty
    /// pair returns the manager to the unauthenticated state.
    pub fn restore_tokens(
        &mut self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> &mut Self {
        let pair = TokenPair::new(access_token, refresh_token);
        self.profile = None;
        self.token = if pair.is_empty() {
            None
        } else {
            Some(Token::from_pair(pair))
        };
        debug!("Tokens restored");
        self
    }

    /// Restores a persisted pair whose expiry the caller kept.
    pub fn restore_tokens_with_expiry(
        &mut self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> &mut Self {
        self.restore_tokens(access_token, refresh_token);
        self.token = self.token.take().map(|t| t.with_expires_at(expires_at));
        self
    }

    /// Current tokens; both empty when unauthenticated.
    #[must_use]
    pub fn token_pair(&self) -> TokenPair {
        self.token.as_ref().map(Token::to_pair).unwrap_or_default()
    }

    /// Current token with its metadata.
    #[must_use]
    pub const fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Whether tokens are held locally.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Last discovered email address.
    #[must_use]
    pub fn email_address(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.email_address.as_str())
    }

    /// Last fetched profile.
    #[must_use]
    pub const fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("credentials", &self.credentials)
            .field("authenticated", &self.is_authenticated())
            .field("email_address", &self.email_address())
            .finish_non_exhaustive()
    }
}
