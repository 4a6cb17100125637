//! Owned session context
//!
//! Wraps an [`IdentityProvider`] and remembers who is signed in. Holders get
//! this as an explicitly constructed value; there is no process-wide
//! singleton.

use crate::error::AuthError;
use crate::identity::{AuthUser, IdentityProvider};
use crate::validation;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Signed-in user bookkeeping on top of an identity provider
#[derive(Debug)]
pub struct SessionContext<P> {
    provider: Arc<P>,
    user: RwLock<Option<AuthUser>>,
}

impl<P> SessionContext<P>
where
    P: IdentityProvider,
{
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            user: RwLock::new(None),
        }
    }

    /// The underlying identity provider
    pub const fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Last known signed-in user
    pub fn user(&self) -> Option<AuthUser> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Whether admin-only actions should be offered
    pub fn is_admin(&self) -> bool {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|user| user.role.is_admin())
    }

    /// Ask the provider who is signed in and remember the answer
    pub async fn load(&self) -> Result<Option<AuthUser>, AuthError> {
        let user = self.provider.current_user().await?;
        debug!(signed_in = user.is_some(), "session loaded");
        self.set_user(user.clone());
        Ok(user)
    }

    /// Validate credentials locally, then sign in
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        validation::validate_sign_in(email, password)?;
        let session = self.provider.sign_in(email, password).await?;
        info!(user_id = %session.user.id, "signed in");
        self.set_user(Some(session.user.clone()));
        Ok(session.user)
    }

    /// Validate sign-up input, then create the account
    ///
    /// Returns `None` when the provider wants the address confirmed first.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Option<AuthUser>, AuthError> {
        validation::validate_sign_up(email, password, display_name)?;
        let session = self
            .provider
            .sign_up(email, password, display_name)
            .await?;
        let user = session.map(|session| session.user);
        if user.is_none() {
            info!("sign-up pending email confirmation");
        }
        self.set_user(user.clone());
        Ok(user)
    }

    /// Sign out
    ///
    /// The local user is forgotten even when the provider call fails.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.set_user(None);
        self.provider.sign_out().await.inspect_err(|err| {
            warn!(error = %err, "sign-out request failed");
        })
    }

    /// Re-read the user after a profile change
    pub async fn refresh_user(&self) -> Result<Option<AuthUser>, AuthError> {
        self.load().await
    }

    fn set_user(&self, user: Option<AuthUser>) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = user;
    }
}
