//! Error types for the token lifecycle.

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur in token lifecycle operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A required credential field is missing or malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The provider rejected the authorization code or issued no refresh
    /// token.
    #[error("Authorization failed: {0}")]
    Authorization(#[source] mailpass_oauth::Error),

    /// The provider refused to refresh the access token.
    #[error("Token refresh failed: {0}")]
    TokenRefresh(#[source] mailpass_oauth::Error),

    /// The profile endpoint could not be read.
    #[error("Profile fetch failed: {0}")]
    ProfileFetch(String),

    /// The provider rejected the revocation.
    #[error("Revocation failed: {0}")]
    Revocation(#[source] mailpass_oauth::Error),

    /// Network failure, timeout, or the provider rate limiting or failing
    /// with a server error.
    #[error("Transport error: {0}")]
    Transport(#[source] mailpass_oauth::Error),

    /// No token has been exchanged or restored yet.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The save hook failed to persist a token pair.
    #[error("Token store error: {0}")]
    Store(#[from] StoreError),
}

impl Error {
    /// Classifies a provider error: transport failures and provider
    /// outages become `Transport` whatever the operation, the rest become
    /// `wrap(err)`.
    pub(crate) fn from_provider(
        err: mailpass_oauth::Error,
        wrap: fn(mailpass_oauth::Error) -> Self,
    ) -> Self {
        if err.is_transport() || err.is_unavailable() {
            Self::Transport(err)
        } else {
            wrap(err)
        }
    }

    /// Whether retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Whether the caller must restart the consent flow.
    ///
    /// True without tokens, and for authorization or refresh failures where
    /// the grant is gone (`invalid_grant`) or no refresh token exists.
    #[must_use]
    pub fn requires_reauthorization(&self) -> bool {
        match self {
            Self::Authorization(err) | Self::TokenRefresh(err) => err.requires_consent(),
            Self::NotAuthenticated => true,
            _ => false,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
