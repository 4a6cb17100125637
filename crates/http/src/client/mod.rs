//! Unidash data API clients
//!
//! [`PublicClient`] reaches the endpoints that need no credential.
//! [`AuthenticatedGateway`] is everything else; its endpoint groups live in
//! the submodules as `impl` blocks.

pub mod account;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod gateway;
pub mod records;
pub mod upload;

pub use error::ClientError;
pub use export::CsvExport;
pub use gateway::{AuthenticatedGateway, FormField, OutboundRequest, RequestBody};
pub use upload::UploadFile;

use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use unidash_core::{IdentityProvider, Navigator, RefreshFailurePolicy, UnidashConfig};

const DEFAULT_USER_AGENT: &str = concat!("unidash-client/", env!("CARGO_PKG_VERSION"));
const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for endpoints that don't require authentication
#[derive(Clone)]
pub struct PublicClient {
    client: Client,
    base_url: String,
}

/// `/health/` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl PublicClient {
    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the API is up
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let url = format!("{}/health/", self.base_url);
        let response = self.client.get(url).send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(ClientError::from_response(response).await)
        }
    }
}

/// Builder for the public client and the authenticated gateway
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    refresh_policy: RefreshFailurePolicy,
    refresh_timeout: Option<Duration>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl ApiClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: None,
            user_agent: None,
            refresh_policy: RefreshFailurePolicy::default(),
            refresh_timeout: Some(DEFAULT_REFRESH_TIMEOUT),
            navigator: None,
        }
    }

    /// Builder preloaded from configuration
    pub fn from_config(config: &UnidashConfig) -> Self {
        Self::new()
            .base_url(config.api.base_url.clone())
            .timeout(config.api.timeout())
            .refresh_policy(config.session.refresh_failure.clone())
            .refresh_timeout(config.identity.refresh_timeout())
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout (ignored in the browser)
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// What to do when a 401 cannot be recovered
    pub fn refresh_policy(mut self, policy: RefreshFailurePolicy) -> Self {
        self.refresh_policy = policy;
        self
    }

    /// Upper bound on the refresh call (ignored in the browser)
    pub const fn refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = Some(timeout);
        self
    }

    /// Navigator used by [`RefreshFailurePolicy::Redirect`]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Build a public client
    pub fn build_public(self) -> Result<PublicClient, ClientError> {
        let (client, base_url) = self.http_client()?;
        Ok(PublicClient { client, base_url })
    }

    /// Build an authenticated gateway reading credentials from `identity`
    pub fn build_gateway<P: IdentityProvider>(
        self,
        identity: Arc<P>,
    ) -> Result<AuthenticatedGateway<P>, ClientError> {
        if matches!(self.refresh_policy, RefreshFailurePolicy::Redirect { .. })
            && self.navigator.is_none()
        {
            return Err(ClientError::Configuration(
                "redirect refresh policy requires a navigator".into(),
            ));
        }

        let policy = self.refresh_policy.clone();
        let refresh_timeout = self.refresh_timeout;
        let navigator = self.navigator.clone();
        let (client, base_url) = self.http_client()?;

        Ok(AuthenticatedGateway {
            client,
            base_url,
            identity,
            policy,
            refresh_timeout,
            navigator,
        })
    }

    fn http_client(self) -> Result<(Client, String), ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid base_url: {e}")))?;

        let mut client_builder = ClientBuilder::new();

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        #[cfg(target_arch = "wasm32")]
        let _ = self.timeout; // Timeouts not supported on WASM

        client_builder = client_builder
            .user_agent(self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()));

        Ok((client_builder.build()?, base_url))
    }
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
