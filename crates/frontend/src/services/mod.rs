//! Browser-side service wiring

mod config;

pub use config::app_config;

use crate::navigation::BrowserNavigator;
use std::rc::Rc;
use std::sync::Arc;
use unidash_core::UnidashConfig;
use unidash_http::{ApiClientBuilder, AuthenticatedGateway, ClientError, SupabaseIdentity};

/// Identity provider and data API gateway shared by every view
#[derive(Clone)]
pub struct Services {
    pub config: Rc<UnidashConfig>,
    pub identity: Arc<SupabaseIdentity>,
    pub gateway: AuthenticatedGateway<SupabaseIdentity>,
}

impl PartialEq for Services {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.identity, &other.identity)
    }
}

impl Services {
    /// Build the services from compile-time configuration
    pub fn from_config(config: UnidashConfig) -> Result<Self, ClientError> {
        let identity = Arc::new(SupabaseIdentity::from_config(&config.identity)?);
        let gateway = ApiClientBuilder::from_config(&config)
            .navigator(Arc::new(BrowserNavigator))
            .build_gateway(identity.clone())?;

        Ok(Self {
            config: Rc::new(config),
            identity,
            gateway,
        })
    }
}
