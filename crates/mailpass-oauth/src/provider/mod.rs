//! `OAuth2` provider configurations.

use crate::error::{Error, Result};
use url::Url;

/// Gmail read-only scope.
pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

/// Gmail send scope.
pub const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

/// `OAuth2` provider configuration.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Provider name (e.g., "Google").
    pub name: String,
    /// Authorization endpoint URL.
    pub auth_url: Url,
    /// Token endpoint URL.
    pub token_url: Url,
    /// Token revocation endpoint (if supported).
    pub revoke_url: Option<Url>,
    /// Default scopes.
    pub default_scopes: Vec<String>,
}

impl Provider {
    /// Creates a new provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if URLs are invalid.
    pub fn new(
        name: impl Into<String>,
        auth_url: impl AsRef<str>,
        token_url: impl AsRef<str>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            auth_url: Url::parse(auth_url.as_ref())?,
            token_url: Url::parse(token_url.as_ref())?,
            revoke_url: None,
            default_scopes: Vec::new(),
        })
    }

    /// Sets the revocation URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn with_revoke_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.revoke_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Sets the default scopes.
    #[must_use]
    pub fn with_default_scopes(mut self, scopes: Vec<String>) -> Self {
        self.default_scopes = scopes;
        self
    }

    /// Google `OAuth2` provider configuration for Gmail.
    ///
    /// Scopes:
    /// - `gmail.readonly` - Read messages and the mailbox profile
    /// - `gmail.send` - Send messages
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn google() -> Result<Self> {
        Ok(Self::new(
            "Google",
            "https://accounts.google.com/o/oauth2/auth",
            "https://oauth2.googleapis.com/token",
        )?
        .with_revoke_url("https://oauth2.googleapis.com/revoke")?
        .with_default_scopes(vec![
            GMAIL_READONLY_SCOPE.to_string(),
            GMAIL_SEND_SCOPE.to_string(),
        ]))
    }

    /// Returns the revocation endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider has no revocation endpoint.
    pub fn revoke_url(&self) -> Result<&Url> {
        self.revoke_url.as_ref().ok_or_else(|| {
            Error::InvalidConfig(format!("{} has no revocation endpoint", self.name))
        })
    }

    /// Validates that scopes are configured.
    ///
    /// # Errors
    ///
    /// Returns an error if no default scopes are set.
    pub fn validate(&self) -> Result<()> {
        if self.default_scopes.is_empty() {
            return Err(Error::InvalidConfig("no scopes configured".into()));
        }
        Ok(())
    }
}
