//! GoTrue (Supabase Auth) identity provider
//!
//! Talks to the `/auth/v1` REST API with the project's anonymous key. The
//! current session lives in memory; hosts that keep it across restarts use
//! [`SupabaseIdentity::session`] and [`SupabaseIdentity::restore`], and follow
//! refreshes and sign-outs through [`SupabaseIdentity::subscribe`].

use crate::client::ClientError;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use unidash_core::validation;
use unidash_core::{AuthError, AuthUser, IdentityConfig, IdentityProvider, Session, UserRole};

/// Identity provider backed by a GoTrue server
pub struct SupabaseIdentity {
    client: Client,
    auth_url: String,
    anon_key: String,
    session: ArcSwapOption<Session>,
    changes: watch::Sender<Option<Session>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: GoTrueUser,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    role: Option<UserRole>,
}

impl From<GoTrueUser> for AuthUser {
    fn from(user: GoTrueUser) -> Self {
        Self {
            id: user.id,
            email: user.email.unwrap_or_default(),
            full_name: user.user_metadata.full_name.unwrap_or_default(),
            role: user.user_metadata.role.unwrap_or_default(),
        }
    }
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: token.expires_at,
            user: token.user.into(),
        }
    }
}

impl SupabaseIdentity {
    /// Create a provider for the project at `project_url`
    pub fn new(project_url: impl AsRef<str>, anon_key: impl Into<String>) -> Result<Self, ClientError> {
        let base = project_url.as_ref().trim_end_matches('/');
        url::Url::parse(base)
            .map_err(|e| ClientError::Configuration(format!("invalid identity url: {e}")))?;

        let client = ClientBuilder::new().build()?;
        Ok(Self {
            client,
            auth_url: format!("{base}/auth/v1"),
            anon_key: anon_key.into(),
            session: ArcSwapOption::empty(),
            changes: watch::Sender::new(None),
        })
    }

    pub fn from_config(config: &IdentityConfig) -> Result<Self, ClientError> {
        Self::new(&config.url, config.anon_key.clone())
    }

    /// Current session, if signed in
    pub fn session(&self) -> Option<Session> {
        self.session.load_full().map(|session| (*session).clone())
    }

    /// Adopt a previously saved session
    pub fn restore(&self, session: Session) {
        debug!(user_id = %session.user.id, "session restored");
        self.replace(Some(session));
    }

    /// Every session change, including refreshes made on a gateway's behalf
    ///
    /// The receiver sees `None` once the session is gone, whether signed out
    /// or dropped after a rejected refresh.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.changes.subscribe()
    }

    fn replace(&self, session: Option<Session>) -> Option<Arc<Session>> {
        let previous = self.session.swap(session.clone().map(Arc::new));
        self.changes.send_if_modified(|current| {
            if *current == session {
                return false;
            }
            *current = session;
            true
        });
        previous
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.auth_url))
            .header("apikey", &self.anon_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, AuthError> {
        request
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> Result<Response, AuthError> {
        let request = self
            .request(Method::POST, "/token")
            .query(&[("grant_type", grant_type)])
            .json(&body);
        self.send(request).await
    }

    fn store(&self, session: Session) -> Session {
        self.replace(Some(session.clone()));
        session
    }
}

/// Pull the human-readable message out of a GoTrue error body
fn provider_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| status.to_string())
}

async fn rejection(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    (status, provider_message(status, &body))
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, AuthError> {
    response
        .json()
        .await
        .map_err(|e| AuthError::Provider(format!("unexpected identity response: {e}")))
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl IdentityProvider for SupabaseIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        validation::validate_sign_in(email, password)?;

        let response = self
            .token_grant("password", json!({ "email": email, "password": password }))
            .await?;
        if !response.status().is_success() {
            let (status, message) = rejection(response).await;
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                    AuthError::InvalidCredentials(message)
                }
                _ => AuthError::Provider(message),
            });
        }

        let session: Session = decode::<TokenResponse>(response).await?.into();
        info!(user_id = %session.user.id, "signed in");
        Ok(self.store(session))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Option<Session>, AuthError> {
        validation::validate_sign_up(email, password, display_name)?;

        let mut body = json!({ "email": email, "password": password });
        if let Some(name) = display_name {
            body["data"] = json!({ "full_name": name.trim() });
        }
        let response = self
            .send(self.request(Method::POST, "/signup").json(&body))
            .await?;
        if !response.status().is_success() {
            let (_, message) = rejection(response).await;
            return Err(AuthError::Provider(message));
        }

        // Without a token the account waits for email confirmation
        let value: serde_json::Value = decode(response).await?;
        if value.get("access_token").is_none() {
            info!("sign-up accepted, confirmation pending");
            return Ok(None);
        }
        let token: TokenResponse = serde_json::from_value(value)
            .map_err(|e| AuthError::Provider(format!("unexpected identity response: {e}")))?;
        Ok(Some(self.store(token.into())))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(session) = self.replace(None) else {
            debug!("sign-out without a session, nothing to do");
            return Ok(());
        };

        let response = self
            .send(
                self.request(Method::POST, "/logout")
                    .bearer_auth(&session.access_token),
            )
            .await?;
        let status = response.status();
        if status.is_success()
            || matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND)
        {
            info!(user_id = %session.user.id, "signed out");
            return Ok(());
        }

        let (_, message) = rejection(response).await;
        Err(AuthError::Provider(message))
    }

    async fn current_user(&self) -> Result<Option<AuthUser>, AuthError> {
        let Some(session) = self.session.load_full() else {
            return Ok(None);
        };

        let response = self
            .send(
                self.request(Method::GET, "/user")
                    .bearer_auth(&session.access_token),
            )
            .await?;
        match response.status() {
            status if status.is_success() => {
                let user: AuthUser = decode::<GoTrueUser>(response).await?.into();
                Ok(Some(user))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("stored access token rejected, trying refresh");
                Ok(self.refresh_session().await?.map(|session| session.user))
            }
            _ => {
                let (_, message) = rejection(response).await;
                Err(AuthError::Provider(message))
            }
        }
    }

    async fn access_token(&self) -> Result<Option<String>, AuthError> {
        Ok(self
            .session
            .load_full()
            .map(|session| session.access_token.clone()))
    }

    async fn refresh_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(refresh_token) = self
            .session
            .load_full()
            .and_then(|session| session.refresh_token.clone())
        else {
            self.replace(None);
            return Ok(None);
        };

        let response = self
            .token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await?;
        if !response.status().is_success() {
            let (status, message) = rejection(response).await;
            warn!(%status, %message, "refresh token rejected");
            self.replace(None);
            return Ok(None);
        }

        let session: Session = decode::<TokenResponse>(response).await?.into();
        debug!(user_id = %session.user.id, "session refreshed");
        Ok(Some(self.store(session)))
    }

    async fn update_password(&self, new_password: &str) -> Result<(), AuthError> {
        validation::validate_new_password(new_password)?;
        let Some(session) = self.session.load_full() else {
            return Err(AuthError::SessionExpired);
        };

        let response = self
            .send(
                self.request(Method::PUT, "/user")
                    .bearer_auth(&session.access_token)
                    .json(&json!({ "password": new_password })),
            )
            .await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => Err(AuthError::SessionExpired),
            _ => {
                let (_, message) = rejection(response).await;
                Err(AuthError::Provider(message))
            }
        }
    }
}
