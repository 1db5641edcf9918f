//! Persistence hook for refreshed token pairs.
//!
//! [`TokenStore`] is called after every successful refresh. Closures
//! implement it directly; [`KeyringStore`] keeps pairs in the platform's
//! native credential storage:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager

use keyring::Entry;
use tracing::{debug, warn};

use mailpass_oauth::TokenPair;

/// Default keyring service name.
const SERVICE_NAME: &str = "mailpass";

/// Credential type identifier for token pairs.
const TOKEN_CREDENTIAL: &str = "oauth_token";

/// Error type for token persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to access keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// Stored token pair could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Any other persistence backend failure.
    #[error("{0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Save hook invoked with the new pair after a refresh.
pub trait TokenStore {
    /// Persists `tokens`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    fn save(&self, tokens: &TokenPair) -> StoreResult<()>;
}

impl<F> TokenStore for F
where
    F: Fn(&TokenPair) -> StoreResult<()>,
{
    fn save(&self, tokens: &TokenPair) -> StoreResult<()> {
        self(tokens)
    }
}

/// Token pairs stored in the system keyring, one entry per user.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
    user: String,
}

impl KeyringStore {
    /// Creates a store for `user` under the default service name.
    #[must_use]
    pub fn new(user: impl Into<String>) -> Self {
        Self::with_service(SERVICE_NAME, user)
    }

    /// Creates a store under a custom service name.
    #[must_use]
    pub fn with_service(service: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            user: user.into(),
        }
    }

    /// Keyring entry key for this user.
    fn key(&self) -> String {
        format!("{}_{TOKEN_CREDENTIAL}_{}", self.service, self.user)
    }

    fn entry(&self) -> StoreResult<Entry> {
        Ok(Entry::new(&self.service, &self.key())?)
    }

    /// Loads the stored pair, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyring operation or deserialization fails.
    pub fn load(&self) -> StoreResult<Option<TokenPair>> {
        match self.entry()?.get_password() {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(keyring::Error::NoEntry) => {
                debug!("No token pair found for {}", self.user);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes the stored pair. Missing entries are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyring operation fails.
    pub fn delete(&self) -> StoreResult<()> {
        match self.entry()?.delete_credential() {
            Ok(()) => {
                debug!("Deleted token pair for {}", self.user);
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No token pair to delete for {}", self.user);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to delete token pair: {e}");
                Err(e.into())
            }
        }
    }
}

impl TokenStore for KeyringStore {
    fn save(&self, tokens: &TokenPair) -> StoreResult<()> {
        let json = serde_json::to_string(tokens)?;
        self.entry()?.set_password(&json)?;
        debug!("Stored token pair for {}", self.user);
        Ok(())
    }
}
