//! Authorization Code Flow implementation.

use super::OAuthClient;
use crate::error::{Error, Result};
use crate::token::Token;
use rand::Rng;
use rand::distributions::Alphanumeric;
use url::Url;

/// Length of generated `state` values.
const STATE_LEN: usize = 32;

/// Generates a random `state` value for CSRF protection.
#[must_use]
pub fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LEN)
        .map(char::from)
        .collect()
}

/// Authorization Code Flow for `OAuth2`.
///
/// The user is sent to the authorization URL, consents, and the provider
/// redirects back with a one-time code that is exchanged for tokens.
#[derive(Debug)]
pub struct AuthorizationCodeFlow {
    client: OAuthClient,
    offline_access: bool,
}

impl AuthorizationCodeFlow {
    /// Creates a new authorization code flow.
    #[must_use]
    pub const fn new(client: OAuthClient) -> Self {
        Self {
            client,
            offline_access: false,
        }
    }

    /// Requests offline access on a fresh consent screen
    /// (`access_type=offline`, `prompt=consent`), so the exchange returns a
    /// refresh token.
    #[must_use]
    pub const fn with_offline_access(mut self) -> Self {
        self.offline_access = true;
        self
    }

    /// Returns the underlying client.
    #[must_use]
    pub const fn client(&self) -> &OAuthClient {
        &self.client
    }

    /// Builds the authorization URL for user consent.
    ///
    /// # Arguments
    ///
    /// * `scopes` - Optional scopes to request (uses provider defaults if None)
    /// * `state` - Optional state parameter for CSRF protection
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be constructed.
    pub fn authorization_url(&self, scopes: Option<&[String]>, state: Option<&str>) -> Result<Url> {
        let mut url = self.client.provider.auth_url.clone();

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("client_id", &self.client.client_id)
                .append_pair("response_type", "code");

            if let Some(redirect_uri) = &self.client.redirect_uri {
                pairs.append_pair("redirect_uri", redirect_uri);
            }

            let scope_str = scopes.map_or_else(
                || self.client.provider.default_scopes.join(" "),
                |s| s.join(" "),
            );

            if !scope_str.is_empty() {
                pairs.append_pair("scope", &scope_str);
            }

            if let Some(state_val) = state {
                pairs.append_pair("state", state_val);
            }

            if self.offline_access {
                pairs
                    .append_pair("access_type", "offline")
                    .append_pair("prompt", "consent");
            }
        }

        Ok(url)
    }

    /// Exchanges the authorization code for an access token.
    ///
    /// # Arguments
    ///
    /// * `code` - Authorization code from the redirect
    /// * `redirect_uri` - Optional redirect URI (uses client config if None)
    ///
    /// # Errors
    ///
    /// Returns an error if the code is empty or the token exchange fails.
    #[tracing::instrument(skip_all, fields(provider = %self.client.provider.name))]
    pub async fn exchange_code(&self, code: &str, redirect_uri: Option<&str>) -> Result<Token> {
        if code.trim().is_empty() {
            return Err(Error::oauth_error(
                "invalid_request",
                "authorization code is empty",
            ));
        }
        self.client.exchange_code(code, redirect_uri).await
    }
}
