//! Application credentials for the Gmail `OAuth2` client.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Environment variable prefix used by [`Credentials::from_env`].
const ENV_PREFIX: &str = "MAILPASS_";

/// Default timeout applied to every provider call.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Scopes requested during consent. Not configurable.
pub const SCOPES: [&str; 2] = [
    mailpass_oauth::GMAIL_READONLY_SCOPE,
    mailpass_oauth::GMAIL_SEND_SCOPE,
];

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// `OAuth2` client registration for one application.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Name shown on the consent screen; also sent as the user agent.
    pub app_name: String,
    /// `OAuth2` client ID.
    pub client_id: String,
    /// Google Cloud project ID.
    pub project_id: String,
    /// `OAuth2` client secret.
    pub secret: String,
    /// Redirect URI registered for this client.
    pub redirect_uri: String,
    /// Timeout in seconds for each provider call.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Credentials {
    /// Creates credentials with the default request timeout.
    #[must_use]
    pub fn new(
        app_name: impl Into<String>,
        client_id: impl Into<String>,
        project_id: impl Into<String>,
        secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            client_id: client_id.into(),
            project_id: project_id.into(),
            secret: secret.into(),
            redirect_uri: redirect_uri.into(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Sets the request timeout in whole seconds.
    #[must_use]
    pub const fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Timeout for each provider call.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The fixed scope list, as owned strings.
    #[must_use]
    pub fn scopes() -> Vec<String> {
        SCOPES.iter().map(ToString::to_string).collect()
    }

    /// Checks that every required field is present and usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("app_name", &self.app_name),
            ("client_id", &self.client_id),
            ("project_id", &self.project_id),
            ("secret", &self.secret),
            ("redirect_uri", &self.redirect_uri),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(Error::Configuration(format!("{field} is required")));
        }

        Url::parse(&self.redirect_uri)
            .map_err(|e| Error::Configuration(format!("redirect_uri is not a URL: {e}")))?;

        if self.request_timeout_secs == 0 {
            return Err(Error::Configuration(
                "request_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Loads credentials from `MAILPASS_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a variable is missing or invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key).ok_or_else(|| Error::Configuration(format!("{key} is not set")))
        };

        let request_timeout_secs = match lookup(&format!("{ENV_PREFIX}REQUEST_TIMEOUT_SECS")) {
            Some(raw) => raw.parse().map_err(|e| {
                Error::Configuration(format!("{ENV_PREFIX}REQUEST_TIMEOUT_SECS: {e}"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let credentials = Self {
            app_name: var("APP_NAME")?,
            client_id: var("CLIENT_ID")?,
            project_id: var("PROJECT_ID")?,
            secret: var("SECRET")?,
            redirect_uri: var("REDIRECT_URI")?,
            request_timeout_secs,
        };
        credentials.validate()?;
        Ok(credentials)
    }

    /// Loads credentials from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the file cannot be read, parsed or validated.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Configuration(format!("{}: {e}", path.display())))?;

        let credentials: Self = serde_json::from_str(&contents)
            .map_err(|e| Error::Configuration(format!("{}: {e}", path.display())))?;
        credentials.validate()?;

        tracing::debug!("Loaded credentials from {:?}", path);
        Ok(credentials)
    }

    /// Conventional location of the credentials file.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mailpass")
            .join("credentials.json")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_name", &self.app_name)
            .field("client_id", &self.client_id)
            .field("project_id", &self.project_id)
            .field("secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}
