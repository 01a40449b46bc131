//! Integration tests for the session manager against a mock user center.
//!
//! Covers the cached-session fast path, expiry renewal, invalid-grant
//! recovery, email-domain migration, and single-flight behavior under
//! concurrent callers.

use std::sync::Arc;

use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docside_auth::{
    CredentialsStore, MemoryCredentialsStore, SessionConfig, SessionManager, UserCenterClient,
    UserCenterConfig,
};
use docside_core::{Error, UserCredentials};

fn token_body(token: &str, expires_in: i64) -> serde_json::Value {
    serde_json::json!({
        "access_token": token,
        "token_type": "bearer",
        "expires_in": expires_in,
    })
}

fn manager_for(server: &MockServer, store: Arc<MemoryCredentialsStore>) -> SessionManager {
    let config = UserCenterConfig::new("client-id", "client-secret")
        .with_base_url(server.uri())
        .with_timeout(5);
    let user_center = Arc::new(UserCenterClient::new(config).expect("gateway"));
    SessionManager::new(user_center, store, SessionConfig::default())
}

/// Mount the client grant and user creation mocks used by the
/// anonymous-user creation path.
async fn mount_user_creation(server: &MockServer, expected_creations: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(query_param("grant_type", "client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("client-token", 3600)))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/users"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Location", format!("{}/api/users/uid-1", server.uri())),
        )
        .expect(expected_creations)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sequential_calls_reuse_cached_session() {
    let server = MockServer::start().await;
    mount_user_creation(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("user-token", 3600)))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialsStore::new());
    let manager = manager_for(&server, store);

    let first = manager.get_session().await.expect("first session");
    let second = manager.get_session().await.expect("second session");

    // Identical cached session, and the expect(1) above proves no second login
    assert_eq!(first, second);
    assert_eq!(first.access_token(), "user-token");
}

#[tokio::test]
async fn test_expired_session_triggers_fresh_login() {
    let server = MockServer::start().await;

    // expires_in of 0 is already inside the expiry slack window
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("short-lived", 0)))
        .expect(2)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialsStore::with_credentials(
        UserCredentials::new("existing@docside.io", "pw"),
    ));
    let manager = manager_for(&server, store);

    manager.get_session().await.expect("first session");
    manager.get_session().await.expect("renewed session");
}

#[tokio::test]
async fn test_invalid_grant_recreates_user_and_retries_once() {
    let server = MockServer::start().await;
    mount_user_creation(&server, 1).await;

    // Mounted first: the stale username is rejected with invalid_grant.
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(query_param("grant_type", "password"))
        .and(body_string_contains("stale%40docside.io"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({"error": "invalid_grant"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    // Any other (freshly generated) username logs in fine.
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("fresh-token", 3600)))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialsStore::with_credentials(
        UserCredentials::new("stale@docside.io", "old-pw"),
    ));
    let manager = manager_for(&server, store.clone());

    let session = manager.get_session().await.expect("recovered session");
    assert_eq!(session.access_token(), "fresh-token");

    let replaced = store.get().await.unwrap().expect("credentials present");
    assert_ne!(replaced.username, "stale@docside.io");
    assert_eq!(replaced.email_domain(), Some("docside.io"));
}

#[tokio::test]
async fn test_second_invalid_grant_is_fatal() {
    let server = MockServer::start().await;
    // Recovery creates exactly one new user, then gives up.
    mount_user_creation(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({"error": "invalid_grant"})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialsStore::with_credentials(
        UserCredentials::new("doomed@docside.io", "pw"),
    ));
    let manager = manager_for(&server, store);

    let err = manager.get_session().await.expect_err("must fail");
    assert!(matches!(err, Error::InvalidGrant(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_transient_login_failure_keeps_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    // No user creation mocks: a transient failure must not touch the account.
    let store = Arc::new(MemoryCredentialsStore::with_credentials(
        UserCredentials::new("keep-me@docside.io", "pw"),
    ));
    let manager = manager_for(&server, store.clone());

    let err = manager.get_session().await.expect_err("must fail");
    assert!(matches!(err, Error::Request(_)), "got {:?}", err);

    let kept = store.get().await.unwrap().expect("credentials kept");
    assert_eq!(kept.username, "keep-me@docside.io");
}

#[tokio::test]
async fn test_email_domain_migration_renames_account_before_login() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(query_param("grant_type", "client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("client-token", 3600)))
        .expect(1)
        .mount(&server)
        .await;

    // Two user logins: the legacy account (to reach its id), then the
    // migrated account.
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("user-token", 3600)))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "uid-9",
            "email": "local-id@legacy.example",
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/users/uid-9"))
        .and(body_string_contains("local-id@docside.io"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialsStore::with_credentials(
        UserCredentials::new("local-id@legacy.example", "pw"),
    ));
    let manager = manager_for(&server, store.clone());

    manager.get_session().await.expect("migrated session");

    let migrated = store.get().await.unwrap().expect("credentials present");
    assert_eq!(migrated.username, "local-id@docside.io");
    assert_eq!(migrated.password, "pw");
}

#[tokio::test]
async fn test_concurrent_callers_share_one_login() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("shared-token", 3600)))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialsStore::with_credentials(
        UserCredentials::new("existing@docside.io", "pw"),
    ));
    let manager = Arc::new(manager_for(&server, store));

    let a = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.get_session().await })
    };
    let b = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.get_session().await })
    };

    let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());
    assert_eq!(a, b);
}
