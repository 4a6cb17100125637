//! Authenticated request gateway
//!
//! Every request is described by an [`OutboundRequest`] value and rebuilt into
//! a fresh reqwest request per attempt. A 401 triggers one session refresh and
//! one re-dispatch; the `retried` marker on the request stops a second round.

use super::error::{ClientError, error_message};
use reqwest::{Client, Method, Response, StatusCode, multipart};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use unidash_core::{AuthError, IdentityProvider, Navigator, RefreshFailurePolicy, Session};

/// Replayable request body
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<FormField>),
}

/// One multipart form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

/// An API call together with its retry marker
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: Method,
    /// Path below the base URL, starting with `/`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Set once the request has been re-sent after a refresh
    pub retried: bool,
}

impl OutboundRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn query(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Attach a JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    #[must_use]
    pub fn multipart(mut self, fields: Vec<FormField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }
}

/// Client for endpoints that need the signed-in user's credential
pub struct AuthenticatedGateway<P> {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) identity: Arc<P>,
    pub(crate) policy: RefreshFailurePolicy,
    pub(crate) refresh_timeout: Option<Duration>,
    pub(crate) navigator: Option<Arc<dyn Navigator>>,
}

impl<P> Clone for AuthenticatedGateway<P> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            identity: self.identity.clone(),
            policy: self.policy.clone(),
            refresh_timeout: self.refresh_timeout,
            navigator: self.navigator.clone(),
        }
    }
}

impl<P> AuthenticatedGateway<P>
where
    P: IdentityProvider,
{
    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The identity provider credentials are read from
    pub const fn identity(&self) -> &Arc<P> {
        &self.identity
    }

    /// Send a request, recovering once from a 401 by refreshing the session
    ///
    /// Non-401 responses, including other error statuses, are returned as is.
    pub async fn dispatch(&self, mut request: OutboundRequest) -> Result<Response, ClientError> {
        let mut token = self.identity.access_token().await?;

        loop {
            let response = self.send(&request, token.as_deref()).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            let body = response.text().await.unwrap_or_default();
            let message = error_message(StatusCode::UNAUTHORIZED, &body);
            if request.retried {
                debug!(path = %request.path, "401 after retry, giving up");
                return Err(ClientError::Unauthenticated(message));
            }

            debug!(path = %request.path, "401 received, refreshing session");
            request.retried = true;
            match self.refresh().await {
                Some(fresh) => token = Some(fresh),
                None => {
                    self.end_session().await;
                    return Err(ClientError::Unauthenticated(message));
                }
            }
        }
    }

    /// Send a request and decode a JSON response
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: OutboundRequest,
    ) -> Result<T, ClientError> {
        let response = self.dispatch(request).await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(ClientError::from_response(response).await)
        }
    }

    /// Send a request whose response body is ignored
    pub async fn execute_empty(&self, request: OutboundRequest) -> Result<(), ClientError> {
        let response = self.dispatch(request).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::from_response(response).await)
        }
    }

    async fn send(
        &self,
        request: &OutboundRequest,
        token: Option<&str>,
    ) -> Result<Response, ClientError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method.clone(), url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(fields) => builder.multipart(build_form(fields)?),
        };

        Ok(builder.send().await?)
    }

    async fn refresh(&self) -> Option<String> {
        match self.refresh_bounded().await {
            Ok(Some(session)) if !session.access_token.is_empty() => {
                info!("session refreshed, retrying request");
                Some(session.access_token)
            }
            Ok(_) => {
                warn!("session refresh returned no token");
                None
            }
            Err(err) => {
                warn!(error = %err, "session refresh failed");
                None
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    async fn refresh_bounded(&self) -> Result<Option<Session>, AuthError> {
        let Some(limit) = self.refresh_timeout else {
            return self.identity.refresh_session().await;
        };
        tokio::time::timeout(limit, self.identity.refresh_session())
            .await
            .unwrap_or_else(|_| {
                Err(AuthError::Network(format!(
                    "session refresh timed out after {}s",
                    limit.as_secs()
                )))
            })
    }

    #[cfg(target_arch = "wasm32")]
    async fn refresh_bounded(&self) -> Result<Option<Session>, AuthError> {
        self.identity.refresh_session().await
    }

    async fn end_session(&self) {
        match &self.policy {
            RefreshFailurePolicy::SignOut => {
                warn!("signing out after failed session refresh");
                if let Err(err) = self.identity.sign_out().await {
                    warn!(error = %err, "sign-out after failed refresh also failed");
                }
            }
            RefreshFailurePolicy::Redirect { location } => {
                warn!(%location, "redirecting after failed session refresh");
                if let Some(navigator) = &self.navigator {
                    navigator.navigate(location);
                }
            }
        }
    }
}

fn build_form(fields: &[FormField]) -> Result<multipart::Form, ClientError> {
    let mut form = multipart::Form::new();
    for field in fields {
        form = match field {
            FormField::Text { name, value } => form.text(name.clone(), value.clone()),
            FormField::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                let part = multipart::Part::bytes(bytes.clone())
                    .file_name(file_name.clone())
                    .mime_str(content_type)?;
                form.part(name.clone(), part)
            }
        };
    }
    Ok(form)
}
