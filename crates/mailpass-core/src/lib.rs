//! # mailpass-core
//!
//! Gmail `OAuth2` token lifecycle for host applications.
//!
//! This crate provides:
//! - **Token manager** - consent URL, code exchange, silent refresh, revocation
//! - **Credentials** - validated client registration, from env or JSON file
//! - **Auth config** - the installed-application descriptor
//! - **Profile lookup** - mailbox email discovery after an exchange
//! - **Token stores** - save hook after refresh, system keyring backend
//! - **Refresh locks** - per-user serialisation of refreshes
//!
//! ```ignore
//! use mailpass_core::{Credentials, KeyringStore, TokenManager};
//!
//! let mut manager = TokenManager::new(Credentials::from_env()?)?;
//! println!("Visit: {}", manager.authorization_url(None)?);
//!
//! manager.exchange_code(&code).await?;
//! let store = KeyringStore::new(manager.email_address().unwrap_or("default"));
//! manager.ensure_token_fresh(&store).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod auth_config;
pub mod config;
mod error;
mod locks;
mod manager;
pub mod profile;
mod property;
pub mod store;

pub use auth_config::{AuthConfig, InstalledApp};
pub use config::{Credentials, SCOPES};
pub use error::{Error, Result};
pub use locks::RefreshLocks;
pub use manager::{Endpoints, TokenManager};
pub use profile::{Profile, ProfileClient};
pub use property::{NamedValue, Property, find_property};
pub use store::{KeyringStore, StoreError, StoreResult, TokenStore};

pub use mailpass_oauth::{Token, TokenPair};
