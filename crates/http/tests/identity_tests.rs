//! Integration tests for the GoTrue identity provider

use serde_json::json;
use unidash_core::{AuthError, IdentityProvider, UserRole, ValidationError};
use unidash_http::SupabaseIdentity;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ANON_KEY: &str = "anon-key";

fn token_body(access: &str, refresh: &str) -> serde_json::Value {
    json!({
        "access_token": access,
        "token_type": "bearer",
        "expires_in": 3600,
        "expires_at": 1_900_000_000,
        "refresh_token": refresh,
        "user": {
            "id": "8d1c",
            "email": "lee@univ.ac.kr",
            "user_metadata": {"full_name": "Lee Jiwoo", "role": "admin"}
        }
    })
}

async fn signed_in(server: &MockServer) -> SupabaseIdentity {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", ANON_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-1", "refresh-1")))
        .expect(1)
        .mount(server)
        .await;

    let identity = SupabaseIdentity::new(server.uri(), ANON_KEY).unwrap();
    identity
        .sign_in("lee@univ.ac.kr", "correct horse")
        .await
        .unwrap();
    identity
}

#[tokio::test]
async fn test_sign_in_stores_session() {
    let server = MockServer::start().await;
    let identity = signed_in(&server).await;

    let session = identity.session().unwrap();
    assert_eq!(session.access_token, "access-1");
    assert_eq!(session.expires_at, Some(1_900_000_000));
    assert_eq!(session.user.role, UserRole::Admin);
    assert_eq!(session.user.full_name, "Lee Jiwoo");
    assert_eq!(
        identity.access_token().await.unwrap().as_deref(),
        Some("access-1")
    );
}

#[tokio::test]
async fn test_sign_in_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let identity = SupabaseIdentity::new(server.uri(), ANON_KEY).unwrap();
    let err = identity
        .sign_in("lee@univ.ac.kr", "wrong")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AuthError::InvalidCredentials("Invalid login credentials".to_string())
    );
    assert!(identity.session().is_none());
}

#[tokio::test]
async fn test_invalid_email_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let identity = SupabaseIdentity::new(server.uri(), ANON_KEY).unwrap();
    let err = identity.sign_in("lee at univ", "pw").await.unwrap_err();
    assert_eq!(err, AuthError::Validation(ValidationError::InvalidEmail));
}

#[tokio::test]
async fn test_sign_out_twice_calls_server_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let identity = signed_in(&server).await;

    identity.sign_out().await.unwrap();
    identity.sign_out().await.unwrap();
    assert!(identity.session().is_none());
    assert_eq!(identity.access_token().await.unwrap(), None);
}

#[tokio::test]
async fn test_refresh_replaces_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_json(json!({"refresh_token": "refresh-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-2", "refresh-2")))
        .expect(1)
        .mount(&server)
        .await;
    let identity = signed_in(&server).await;

    let session = identity.refresh_session().await.unwrap().unwrap();
    assert_eq!(session.access_token, "access-2");
    assert_eq!(
        identity.access_token().await.unwrap().as_deref(),
        Some("access-2")
    );
}

#[tokio::test]
async fn test_rejected_refresh_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Refresh Token Not Found"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let identity = signed_in(&server).await;

    assert_eq!(identity.refresh_session().await.unwrap(), None);
    assert!(identity.session().is_none());
}

#[tokio::test]
async fn test_subscribers_follow_refresh_and_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_json(json!({"refresh_token": "refresh-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-2", "refresh-2")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_json(json!({"refresh_token": "refresh-2"})))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Refresh Token Not Found"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let identity = signed_in(&server).await;
    let mut changes = identity.subscribe();
    assert_eq!(
        changes.borrow_and_update().as_ref().map(|s| s.access_token.as_str()),
        Some("access-1")
    );

    // A rotated refresh token must reach whoever persists the session
    identity.refresh_session().await.unwrap();
    assert!(changes.has_changed().unwrap());
    let rotated = changes.borrow_and_update().clone().unwrap();
    assert_eq!(rotated.refresh_token.as_deref(), Some("refresh-2"));

    assert_eq!(identity.refresh_session().await.unwrap(), None);
    assert!(changes.has_changed().unwrap());
    assert!(changes.borrow_and_update().is_none());

    // Signing out an already cleared session is not a change
    identity.sign_out().await.unwrap();
    assert!(!changes.has_changed().unwrap());
}

#[tokio::test]
async fn test_refresh_without_session_is_none() {
    let identity = SupabaseIdentity::new("http://127.0.0.1:9", ANON_KEY).unwrap();
    assert_eq!(identity.refresh_session().await.unwrap(), None);
    assert_eq!(identity.current_user().await.unwrap(), None);
}

#[tokio::test]
async fn test_sign_up_pending_confirmation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .and(body_json(json!({
            "email": "new@univ.ac.kr",
            "password": "secret1",
            "data": {"full_name": "Choi"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "41aa",
            "email": "new@univ.ac.kr",
            "confirmation_sent_at": "2024-11-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let identity = SupabaseIdentity::new(server.uri(), ANON_KEY).unwrap();
    let session = identity
        .sign_up("new@univ.ac.kr", "secret1", Some(" Choi "))
        .await
        .unwrap();
    assert!(session.is_none());
    assert!(identity.session().is_none());
}

#[tokio::test]
async fn test_current_user_falls_back_to_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-2", "refresh-2")))
        .expect(1)
        .mount(&server)
        .await;
    let identity = signed_in(&server).await;

    let user = identity.current_user().await.unwrap().unwrap();
    assert_eq!(user.email, "lee@univ.ac.kr");
    assert_eq!(identity.session().unwrap().access_token, "access-2");
}

#[tokio::test]
async fn test_update_password() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer access-1"))
        .and(body_json(json!({"password": "longer-secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "8d1c"})))
        .expect(1)
        .mount(&server)
        .await;
    let identity = signed_in(&server).await;

    let err = identity.update_password("short").await.unwrap_err();
    assert_eq!(
        err,
        AuthError::Validation(ValidationError::PasswordTooShort { min: 8 })
    );
    identity.update_password("longer-secret").await.unwrap();
}

#[tokio::test]
async fn test_update_password_requires_session() {
    let identity = SupabaseIdentity::new("http://127.0.0.1:9", ANON_KEY).unwrap();
    assert_eq!(
        identity.update_password("longer-secret").await.unwrap_err(),
        AuthError::SessionExpired
    );
}
