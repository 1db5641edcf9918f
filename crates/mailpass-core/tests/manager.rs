//! Integration tests for `TokenManager` using wiremock.
//!
//! A mock server stands in for Google's token, revocation and Gmail
//! profile endpoints.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use mailpass_core::{
    Credentials, Endpoints, Error, StoreError, StoreResult, TokenManager, TokenPair,
};
use mailpass_oauth::Provider;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials() -> Credentials {
    Credentials::new(
        "Mailpass",
        "client-id",
        "mailpass-dev",
        "client-secret",
        "https://app.example.com/oauth/callback",
    )
}

fn manager_for(server: &MockServer, credentials: Credentials) -> TokenManager {
    manager_named(server, "Google", credentials)
}

fn manager_named(server: &MockServer, name: &str, credentials: Credentials) -> TokenManager {
    let provider = Provider::new(
        name,
        format!("{}/o/oauth2/auth", server.uri()),
        format!("{}/token", server.uri()),
    )
    .unwrap()
    .with_revoke_url(format!("{}/revoke", server.uri()))
    .unwrap();
    let endpoints = Endpoints::new(provider, Url::parse(&server.uri()).unwrap());
    TokenManager::with_endpoints(credentials, endpoints).unwrap()
}

fn token_body(access: &str, refresh: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "access_token": access,
        "token_type": "Bearer",
        "expires_in": 3599,
        "scope": "https://www.googleapis.com/auth/gmail.readonly https://www.googleapis.com/auth/gmail.send"
    });
    if let Some(refresh) = refresh {
        body["refresh_token"] = refresh.into();
    }
    body
}

async fn mount_profile(server: &MockServer, status: u16, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/profile"))
        .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
            "emailAddress": "someone@gmail.com",
            "messagesTotal": 42,
            "threadsTotal": 17,
            "historyId": "9001"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Save hook recording every pair it receives.
struct Recorder(Mutex<Vec<TokenPair>>);

impl Recorder {
    const fn new() -> Self {
        Self(Mutex::new(Vec::new()))
    }

    fn saved(&self) -> Vec<TokenPair> {
        self.0.lock().unwrap().clone()
    }
}

impl mailpass_core::TokenStore for Recorder {
    fn save(&self, tokens: &TokenPair) -> StoreResult<()> {
        self.0.lock().unwrap().push(tokens.clone());
        Ok(())
    }
}

#[tokio::test]
async fn test_authorization_url_is_stable_apart_from_state() {
    let server = MockServer::start().await;
    let manager = manager_for(&server, credentials());

    let first = manager.authorization_url(None).unwrap();
    let second = manager.authorization_url(None).unwrap();

    assert_eq!(first.origin(), second.origin());
    assert_eq!(first.path(), "/o/oauth2/auth");
    assert_eq!(first.path(), second.path());

    let param = |url: &Url, key: &str| {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    };
    assert_eq!(param(&first, "client_id").as_deref(), Some("client-id"));
    assert_eq!(param(&first, "client_id"), param(&second, "client_id"));
    assert_eq!(param(&first, "scope"), param(&second, "scope"));
    assert_eq!(param(&first, "access_type").as_deref(), Some("offline"));
    assert_ne!(param(&first, "state"), param(&second, "state"));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_authorization_url_requests_offline_access_for_any_provider() {
    let server = MockServer::start().await;
    let manager = manager_named(&server, "Staging", credentials());

    let url = manager.authorization_url(Some("s")).unwrap();
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

    assert!(pairs.contains(&("access_type".into(), "offline".into())));
    assert!(pairs.contains(&("prompt".into(), "consent".into())));
}

#[tokio::test]
async fn test_exchange_code_populates_tokens_and_email() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("user-agent", "Mailpass"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=4%2F0Acode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("ya29.a", Some("1//r"))))
        .expect(1)
        .mount(&server)
        .await;
    mount_profile(&server, 200, 1).await;

    let mut manager = manager_for(&server, credentials());
    manager.exchange_code("4/0Acode").await.unwrap();

    assert_eq!(manager.token_pair(), TokenPair::new("ya29.a", "1//r"));
    assert_eq!(manager.email_address(), Some("someone@gmail.com"));
    assert_eq!(manager.profile().unwrap().messages_total, Some(42));
    assert!(manager.token().unwrap().is_valid());
}

#[tokio::test]
async fn test_invalid_code_leaves_state_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Malformed auth code."
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_profile(&server, 200, 0).await;

    let mut manager = manager_for(&server, credentials());
    let err = manager.exchange_code("bogus").await.unwrap_err();

    assert!(matches!(err, Error::Authorization(_)));
    assert!(err.requires_reauthorization());
    assert!(manager.token_pair().is_empty());
    assert!(!manager.is_authenticated());
}

#[tokio::test]
async fn test_empty_code_is_rejected_without_network() {
    let server = MockServer::start().await;
    let mut manager = manager_for(&server, credentials());

    let err = manager.exchange_code("").await.unwrap_err();

    assert!(matches!(err, Error::Authorization(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_exchange_without_refresh_token_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("ya29.a", None)))
        .mount(&server)
        .await;
    mount_profile(&server, 200, 0).await;

    let mut manager = manager_for(&server, credentials());
    let err = manager.exchange_code("code").await.unwrap_err();

    assert!(matches!(err, Error::Authorization(_)));
    assert!(err.requires_reauthorization());
    assert!(manager.token_pair().is_empty());
}

#[tokio::test]
async fn test_profile_failure_keeps_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("ya29.a", Some("1//r"))))
        .mount(&server)
        .await;
    mount_profile(&server, 500, 1).await;

    let mut manager = manager_for(&server, credentials());
    manager.exchange_code("code").await.unwrap();

    assert_eq!(manager.token_pair(), TokenPair::new("ya29.a", "1//r"));
    assert_eq!(manager.email_address(), None);
}

#[tokio::test]
async fn test_refresh_profile_after_restore() {
    let server = MockServer::start().await;
    mount_profile(&server, 200, 1).await;

    let mut manager = manager_for(&server, credentials());
    manager.restore_tokens("a", "r");
    assert_eq!(manager.email_address(), None);

    let profile = manager.refresh_profile().await.unwrap();
    assert_eq!(profile.email_address, "someone@gmail.com");
    assert_eq!(manager.email_address(), Some("someone@gmail.com"));
}

#[tokio::test]
async fn test_fresh_token_makes_no_calls() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("x", Some("y"))))
        .expect(0)
        .mount(&server)
        .await;

    let mut manager = manager_for(&server, credentials());
    manager.restore_tokens_with_expiry("a", "r", Utc::now() + chrono::Duration::hours(1));

    let store = Recorder::new();
    let refreshed = manager.ensure_token_fresh(&store).await.unwrap();

    assert!(!refreshed);
    assert_eq!(manager.token_pair(), TokenPair::new("a", "r"));
    assert!(store.saved().is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_saved_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=old-r"))
        .and(body_string_contains("client_secret=client-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("new-a", Some("new-r"))))
        .expect(1)
        .mount(&server)
        .await;

    let mut manager = manager_for(&server, credentials());
    manager.restore_tokens_with_expiry("old-a", "old-r", Utc::now() - chrono::Duration::minutes(5));

    let store = Recorder::new();
    let refreshed = manager.ensure_token_fresh(&store).await.unwrap();

    assert!(refreshed);
    let expected = TokenPair::new("new-a", "new-r");
    assert_eq!(manager.token_pair(), expected);
    assert_eq!(store.saved(), vec![expected]);

    // The new token carries a real lifetime, so a second check is a no-op.
    assert!(!manager.ensure_token_fresh(&store).await.unwrap());
    assert_eq!(store.saved().len(), 1);
}

#[tokio::test]
async fn test_closure_store_receives_refreshed_pair() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("new-a", None)))
        .mount(&server)
        .await;

    let mut manager = manager_for(&server, credentials());
    manager.restore_tokens("old-a", "old-r");

    let saved = Mutex::new(None);
    let store = |pair: &TokenPair| -> StoreResult<()> {
        *saved.lock().unwrap() = Some(pair.clone());
        Ok(())
    };
    assert!(manager.ensure_token_fresh(&store).await.unwrap());

    // Refresh token was not rotated, so the old one is kept.
    assert_eq!(
        saved.lock().unwrap().clone(),
        Some(TokenPair::new("new-a", "old-r"))
    );
}

#[tokio::test]
async fn test_rejected_refresh_requires_reauthorization() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Token has been expired or revoked."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut manager = manager_for(&server, credentials());
    manager.restore_tokens("old-a", "old-r");

    let store = Recorder::new();
    let err = manager.ensure_token_fresh(&store).await.unwrap_err();

    assert!(matches!(err, Error::TokenRefresh(_)));
    assert!(err.requires_reauthorization());
    assert!(!err.is_retryable());
    assert_eq!(manager.token_pair(), TokenPair::new("old-a", "old-r"));
    assert!(store.saved().is_empty());
}

#[tokio::test]
async fn test_refresh_during_outage_is_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(503).set_body_string("<html>Service Unavailable</html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut manager = manager_for(&server, credentials());
    manager.restore_tokens("old-a", "old-r");

    let store = Recorder::new();
    let err = manager.ensure_token_fresh(&store).await.unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert!(err.is_retryable());
    assert!(!err.requires_reauthorization());
    assert_eq!(manager.token_pair(), TokenPair::new("old-a", "old-r"));
    assert!(store.saved().is_empty());
}

#[tokio::test]
async fn test_rate_limited_refresh_is_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": "rate_limit_exceeded",
            "error_description": "Too many requests."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut manager = manager_for(&server, credentials());
    manager.restore_tokens("old-a", "old-r");

    let err = manager.ensure_token_fresh(&Recorder::new()).await.unwrap_err();

    assert!(err.is_retryable());
    assert!(!err.requires_reauthorization());
}

#[tokio::test]
async fn test_rejected_client_does_not_require_reauthorization() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": "invalid_client",
            "error_description": "The OAuth client was not found."
        })))
        .mount(&server)
        .await;

    let mut manager = manager_for(&server, credentials());
    manager.restore_tokens("old-a", "old-r");

    let err = manager.ensure_token_fresh(&Recorder::new()).await.unwrap_err();

    assert!(matches!(err, Error::TokenRefresh(_)));
    assert!(!err.requires_reauthorization());
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_store_failure_surfaces_after_update() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("new-a", Some("new-r"))))
        .mount(&server)
        .await;

    let mut manager = manager_for(&server, credentials());
    manager.restore_tokens("old-a", "old-r");

    let failing =
        |_: &TokenPair| -> StoreResult<()> { Err(StoreError::Backend("database is locked".into())) };
    let err = manager.ensure_token_fresh(&failing).await.unwrap_err();

    assert!(matches!(err, Error::Store(_)));
    assert_eq!(manager.token_pair(), TokenPair::new("new-a", "new-r"));
}

#[tokio::test]
async fn test_unauthenticated_operations() {
    let server = MockServer::start().await;
    let mut manager = manager_for(&server, credentials());

    let store = Recorder::new();
    assert!(matches!(
        manager.ensure_token_fresh(&store).await,
        Err(Error::NotAuthenticated)
    ));
    assert!(matches!(
        manager.revoke_access().await,
        Err(Error::NotAuthenticated)
    ));
    assert!(matches!(
        manager.refresh_profile().await,
        Err(Error::NotAuthenticated)
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_restore_makes_no_network_calls() {
    let server = MockServer::start().await;
    let mut manager = manager_for(&server, credentials());

    let pair = manager.restore_tokens("a", "r").token_pair();

    assert_eq!(pair, TokenPair::new("a", "r"));
    assert!(manager.is_authenticated());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_revoke_keeps_local_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/revoke"))
        .and(body_string_contains("token=r"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut manager = manager_for(&server, credentials());
    manager.restore_tokens("a", "r");
    manager.revoke_access().await.unwrap();

    assert_eq!(manager.token_pair(), TokenPair::new("a", "r"));
}

#[tokio::test]
async fn test_revoke_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/revoke"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_token",
            "error_description": "Token expired or revoked"
        })))
        .mount(&server)
        .await;

    let mut manager = manager_for(&server, credentials());
    manager.restore_tokens("a", "r");
    let err = manager.revoke_access().await.unwrap_err();

    assert!(matches!(err, Error::Revocation(_)));
    assert_eq!(manager.token_pair(), TokenPair::new("a", "r"));
}

#[tokio::test]
async fn test_slow_provider_times_out_as_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("late", Some("late")))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let creds = credentials().with_request_timeout_secs(1);
    let mut manager = manager_for(&server, creds);
    manager.restore_tokens("a", "r");

    let err = manager.ensure_token_fresh(&Recorder::new()).await.unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert!(err.is_retryable());
    assert_eq!(manager.token_pair(), TokenPair::new("a", "r"));
}
