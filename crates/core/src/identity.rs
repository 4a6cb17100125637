//! Identity provider contract
//!
//! The provider owns the credential. Everything else only asks it for the
//! current access token or for a refresh; nobody caches or mutates tokens.

use crate::error::AuthError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role attached to a user account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

impl UserRole {
    /// Whether admin-only views (upload) should be reachable
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Authenticated user as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub role: UserRole,
}

/// Credential set issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl Session {
    /// Whether the access token is past its expiry at `now` (unix seconds)
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// Remote identity provider operations
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait IdentityProvider {
    /// Sign in with email and password
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Create an account; `None` when the provider requires email confirmation
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Option<Session>, AuthError>;

    /// Sign out; safe to call when already signed out
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Currently signed-in user, if any
    async fn current_user(&self) -> Result<Option<AuthUser>, AuthError>;

    /// Current access token, if any
    async fn access_token(&self) -> Result<Option<String>, AuthError>;

    /// Refresh the session; `Ok(None)` for ordinary expiry or rejection
    async fn refresh_session(&self) -> Result<Option<Session>, AuthError>;

    /// Replace the signed-in user's password
    async fn update_password(&self, new_password: &str) -> Result<(), AuthError>;
}

/// Hard navigation to another location of the hosting client
pub trait Navigator: Send + Sync {
    fn navigate(&self, location: &str);
}
