//! # mailpass-oauth
//!
//! `OAuth2` client for Gmail access.
//!
//! ## Features
//!
//! - **Authorization code flow**: consent URL with offline access, code exchange
//! - **Token management**: refresh with rotation handling, expiration checking
//! - **Revocation**: ends the grant on the provider side
//! - **Provider configuration**: Google endpoints and Gmail read/send scopes
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailpass_oauth::{AuthorizationCodeFlow, OAuthClient, Provider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = Provider::google()?;
//!     let client = OAuthClient::new("your_client_id", provider)
//!         .with_client_secret("your_secret")
//!         .with_redirect_uri("https://example.com/oauth/callback");
//!
//!     let flow = AuthorizationCodeFlow::new(client).with_offline_access();
//!     let auth_url = flow.authorization_url(None, Some("random_state"))?;
//!     println!("Visit: {}", auth_url);
//!
//!     let token = flow.exchange_code("code_from_redirect", None).await?;
//!
//!     if token.is_expired() {
//!         let token = flow.client().refresh_token(&token).await?;
//!         println!("Refreshed: {}", token.access_token);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod flow;
pub mod provider;
pub mod token;

pub use error::{Error, Result};
pub use flow::{AuthorizationCodeFlow, OAuthClient, generate_state};
pub use provider::{GMAIL_READONLY_SCOPE, GMAIL_SEND_SCOPE, Provider};
pub use token::{Token, TokenPair};
