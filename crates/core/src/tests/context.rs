use super::FakeIdentity;
use crate::error::AuthError;
use crate::identity::UserRole;
use crate::session::SessionContext;
use crate::validation::ValidationError;
use std::sync::Arc;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_login_remembers_user() {
    let context = SessionContext::new(Arc::new(FakeIdentity::default()));
    assert!(!context.is_authenticated());

    let user = context.login("kim@univ.ac.kr", "hunter22").await.unwrap();
    assert_eq!(user.email, "kim@univ.ac.kr");
    assert!(context.is_authenticated());
    assert_eq!(context.user(), Some(user));
    assert!(!context.is_admin());
}

#[tokio::test]
async fn test_login_validates_before_calling_provider() {
    let provider = Arc::new(FakeIdentity::default());
    let context = SessionContext::new(provider.clone());

    let err = context.login("not-an-email", "hunter22").await.unwrap_err();
    assert_eq!(err, AuthError::Validation(ValidationError::InvalidEmail));

    let err = context.login("kim@univ.ac.kr", "").await.unwrap_err();
    assert_eq!(err, AuthError::Validation(ValidationError::MissingPassword));

    assert_eq!(provider.sign_in_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_wrong_password_keeps_signed_out() {
    let context = SessionContext::new(Arc::new(FakeIdentity::default()));
    let err = context.login("kim@univ.ac.kr", "wrong-pass").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials(_)));
    assert!(!context.is_authenticated());
}

#[tokio::test]
async fn test_admin_role_is_reported() {
    let provider = FakeIdentity {
        role: UserRole::Admin,
        ..FakeIdentity::default()
    };
    let context = SessionContext::new(Arc::new(provider));
    context.login("kim@univ.ac.kr", "hunter22").await.unwrap();
    assert!(context.is_admin());
}

#[tokio::test]
async fn test_load_picks_up_existing_session() {
    let context = SessionContext::new(Arc::new(FakeIdentity::signed_in()));
    assert!(!context.is_authenticated());

    let user = context.load().await.unwrap();
    assert!(user.is_some());
    assert!(context.is_authenticated());
}

#[tokio::test]
async fn test_logout_twice_is_harmless() {
    let provider = Arc::new(FakeIdentity::signed_in());
    let context = SessionContext::new(provider.clone());
    context.load().await.unwrap();

    context.logout().await.unwrap();
    context.logout().await.unwrap();
    assert!(!context.is_authenticated());
    assert!(provider.session.lock().unwrap().is_none());
    assert_eq!(provider.sign_out_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_logout_forgets_user_when_provider_fails() {
    let provider = FakeIdentity {
        fail_sign_out: true,
        ..FakeIdentity::signed_in()
    };
    let context = SessionContext::new(Arc::new(provider));
    context.load().await.unwrap();

    let err = context.logout().await.unwrap_err();
    assert!(err.is_transient());
    assert!(!context.is_authenticated());
}

#[tokio::test]
async fn test_signup_pending_confirmation() {
    let context = SessionContext::new(Arc::new(FakeIdentity::default()));

    let user = context
        .signup("new@univ.ac.kr", "secret1", Some("Lee"))
        .await
        .unwrap();
    assert!(user.is_none());
    assert!(!context.is_authenticated());

    let err = context
        .signup("new@univ.ac.kr", "short", None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AuthError::Validation(ValidationError::PasswordTooShort { min: 6 })
    );
}
