//! `OAuth2` authorization flows.

mod code;

pub use code::{AuthorizationCodeFlow, generate_state};

use crate::error::{Error, Result};
use crate::provider::Provider;
use crate::token::{ErrorResponse, Token, TokenResponse};
use reqwest::{Client, Response, StatusCode};
use std::collections::HashMap;
use tracing::{debug, info};

/// Common `OAuth2` client configuration.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    /// Client ID from provider.
    pub client_id: String,
    /// Client secret (optional for public clients).
    pub client_secret: Option<String>,
    /// Redirect URI for authorization code flow.
    pub redirect_uri: Option<String>,
    /// Provider configuration.
    pub provider: Provider,
    /// HTTP client.
    http_client: Client,
}

impl OAuthClient {
    /// Creates a new OAuth client.
    #[must_use]
    pub fn new(client_id: impl Into<String>, provider: Provider) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: None,
            provider,
            http_client: Client::new(),
        }
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Uses a preconfigured HTTP client (timeouts, user agent).
    #[must_use]
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Refreshes an access token using a refresh token.
    ///
    /// The returned token keeps the old refresh token when the provider
    /// does not rotate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh fails or if the token has no refresh token.
    #[tracing::instrument(skip_all, fields(provider = %self.provider.name))]
    pub async fn refresh_token(&self, token: &Token) -> Result<Token> {
        let refresh_token = token.refresh_token()?;

        let mut params = HashMap::new();
        params.insert("grant_type", "refresh_token");
        params.insert("refresh_token", refresh_token);
        params.insert("client_id", &self.client_id);

        if let Some(secret) = &self.client_secret {
            params.insert("client_secret", secret);
        }

        let response = self
            .http_client
            .post(self.provider.token_url.clone())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let token_response: TokenResponse = response.json().await?;
        let mut new_token = Token::from_response(token_response)?;

        // Preserve refresh token if not returned
        if new_token.refresh_token.is_none() {
            new_token.refresh_token.clone_from(&token.refresh_token);
        }

        info!("Refreshed access token");
        Ok(new_token)
    }

    /// Revokes a token with the provider.
    ///
    /// Revokes the refresh token when present, since that ends the whole
    /// grant; otherwise revokes the access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider has no revocation endpoint or rejects
    /// the request.
    #[tracing::instrument(skip_all, fields(provider = %self.provider.name))]
    pub async fn revoke_token(&self, token: &Token) -> Result<()> {
        let url = self.provider.revoke_url()?.clone();
        let value = token
            .refresh_token
            .as_deref()
            .unwrap_or(token.access_token.as_str());

        let response = self
            .http_client
            .post(url)
            .form(&[("token", value)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        info!("Revoked token");
        Ok(())
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub(crate) async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
    ) -> Result<Token> {
        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("client_id", &self.client_id);

        if let Some(uri) = redirect_uri.or(self.redirect_uri.as_deref()) {
            params.insert("redirect_uri", uri);
        }

        if let Some(secret) = &self.client_secret {
            params.insert("client_secret", secret);
        }

        let response = self
            .http_client
            .post(self.provider.token_url.clone())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let token_response: TokenResponse = response.json().await?;
        debug!(
            has_refresh_token = token_response.refresh_token.is_some(),
            "Token endpoint accepted authorization code"
        );
        Token::from_response(token_response)
    }
}

/// Decodes a non-success provider response into an error.
///
/// Rate limits and server errors keep their status even when the body
/// carries an `OAuth2` error.
async fn provider_error(response: Response) -> Error {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return e.into(),
    };
    let status_error = |body: String| Error::Status {
        status: status.as_u16(),
        body,
    };

    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return status_error(body);
    }
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(error) => error.into_error(),
        Err(_) => status_error(body),
    }
}
