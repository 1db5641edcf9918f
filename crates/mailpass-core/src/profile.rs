//! Mailbox profile lookup, used to discover the account's email address.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use mailpass_oauth::Token;

use crate::{Error, Result};

/// Gmail API base URL.
pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com";

/// Gmail mailbox profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Mailbox email address.
    pub email_address: String,
    /// Total messages in the mailbox.
    #[serde(default)]
    pub messages_total: Option<u64>,
    /// Total threads in the mailbox.
    #[serde(default)]
    pub threads_total: Option<u64>,
    /// Current history record ID, as a decimal string.
    #[serde(default)]
    pub history_id: Option<String>,
}

/// Client for `users/me/profile`.
#[derive(Debug, Clone)]
pub struct ProfileClient {
    http_client: Client,
    base_url: Url,
}

impl ProfileClient {
    /// Creates a client rooted at `base_url` (see [`GMAIL_API_BASE`]).
    #[must_use]
    pub const fn new(http_client: Client, base_url: Url) -> Self {
        Self {
            http_client,
            base_url,
        }
    }

    /// Fetches the profile of the mailbox that owns `token`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProfileFetch`] on a non-success response or bad body,
    /// [`Error::Transport`] when the request never completes.
    #[instrument(skip_all, level = "debug")]
    pub async fn fetch(&self, token: &Token) -> Result<Profile> {
        let url = self
            .base_url
            .join("gmail/v1/users/me/profile")
            .map_err(|e| Error::ProfileFetch(e.to_string()))?;

        let response = self
            .http_client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, token.authorization_header())
            .send()
            .await
            .map_err(|e| Error::from_provider(e.into(), |e| Error::ProfileFetch(e.to_string())))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::ProfileFetch(format!("{status}: {text}")));
        }

        response
            .json::<Profile>()
            .await
            .map_err(|e| Error::ProfileFetch(format!("invalid profile body: {e}")))
    }
}
