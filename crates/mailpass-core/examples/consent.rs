//! Example: authorize a Gmail account and keep its tokens fresh.
//!
//! This example demonstrates how to:
//! 1. Load client credentials from the environment
//! 2. Send the user to the consent screen
//! 3. Exchange the authorization code for tokens
//! 4. Store the pair in the system keyring and refresh it when needed
//!
//! ## Prerequisites
//!
//! 1. Create an OAuth client in the Google Cloud console with the Gmail API
//!    enabled, and register your redirect URI.
//! 2. Set environment variables:
//!    ```bash
//!    export MAILPASS_APP_NAME="Mailpass"
//!    export MAILPASS_CLIENT_ID="...apps.googleusercontent.com"
//!    export MAILPASS_PROJECT_ID="my-project"
//!    export MAILPASS_SECRET="..."
//!    export MAILPASS_REDIRECT_URI="http://localhost:8080"
//!    ```
//!
//! ## Running
//!
//! ```bash
//! cargo run -p mailpass-core --example consent
//! ```

use std::io::{self, Write};

use anyhow::Context;
use mailpass_core::{Credentials, KeyringStore, RefreshLocks, TokenManager};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailpass_core=debug,mailpass_oauth=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let credentials = match Credentials::from_env() {
        Ok(credentials) => credentials,
        Err(_) => Credentials::from_json_file(Credentials::default_path())
            .await
            .context("no MAILPASS_* variables and no credentials file")?,
    };
    let mut manager = TokenManager::new(credentials)?;

    // Step 1: consent
    let auth_url = manager.authorization_url(None)?;
    println!("\nVisit this URL to authorize the application:\n\n{auth_url}\n");
    if let Err(e) = opener::open(auth_url.as_str()) {
        info!("Could not open a browser: {e}");
    }

    // Step 2: code from the redirect
    print!("Enter the authorization code from the redirect URL: ");
    io::stdout().flush()?;
    let mut code = String::new();
    io::stdin().read_line(&mut code)?;

    manager.exchange_code(code.trim()).await?;
    let user = manager.email_address().unwrap_or("default").to_string();
    println!("Authorized as {user}");

    // Step 3: persist and keep fresh
    let store = KeyringStore::new(&user);
    mailpass_core::TokenStore::save(&store, &manager.token_pair())?;

    let locks = RefreshLocks::new();
    let _guard = locks.lock(&user).await;
    if manager.ensure_token_fresh(&store).await? {
        println!("Token refreshed");
    } else {
        println!("Token still valid");
    }

    Ok(())
}
