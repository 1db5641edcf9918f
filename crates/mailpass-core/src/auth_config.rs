//! Installed-application client descriptor.
//!
//! Mirrors the `client_secret.json` document Google issues for installed
//! applications, so it can be written out or handed to other tooling.

use serde::{Deserialize, Serialize};

use crate::config::Credentials;

/// Authorization endpoint listed in the descriptor.
pub const AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Token endpoint listed in the descriptor.
pub const TOKEN_URI: &str = "https://accounts.google.com/o/oauth2/token";

/// Certificate endpoint listed in the descriptor.
pub const CERT_URL: &str = "https://www.googleapis.com/oauth2/v1/certs";

/// Out-of-band redirect URIs that precede the configured one.
pub const OOB_REDIRECT_URIS: [&str; 2] = ["urn:ietf:wg:oauth:2.0:oob", "http://localhost"];

/// Top-level descriptor: `{"installed": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Installed-application client entry.
    pub installed: InstalledApp,
}

/// Client entry of an installed-application descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledApp {
    /// `OAuth2` client ID.
    pub client_id: String,
    /// Google Cloud project ID.
    pub project_id: String,
    /// Authorization endpoint.
    pub auth_uri: String,
    /// Token endpoint.
    pub token_uri: String,
    /// Provider certificate endpoint.
    pub auth_provider_x509_cert_url: String,
    /// `OAuth2` client secret.
    pub client_secret: String,
    /// Allowed redirect URIs.
    pub redirect_uris: Vec<String>,
}

impl AuthConfig {
    /// Derives the descriptor from credentials. Pure.
    #[must_use]
    pub fn from_credentials(credentials: &Credentials) -> Self {
        let redirect_uris = OOB_REDIRECT_URIS
            .iter()
            .map(ToString::to_string)
            .chain(std::iter::once(credentials.redirect_uri.clone()))
            .collect();

        Self {
            installed: InstalledApp {
                client_id: credentials.client_id.clone(),
                project_id: credentials.project_id.clone(),
                auth_uri: AUTH_URI.to_string(),
                token_uri: TOKEN_URI.to_string(),
                auth_provider_x509_cert_url: CERT_URL.to_string(),
                client_secret: credentials.secret.clone(),
                redirect_uris,
            },
        }
    }
}
