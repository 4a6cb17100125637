//! Dashboard summary

use super::error::ClientError;
use super::gateway::{AuthenticatedGateway, OutboundRequest};
use unidash_core::IdentityProvider;
use unidash_core::models::{DashboardQuery, DashboardSummary};

impl<P: IdentityProvider> AuthenticatedGateway<P> {
    pub async fn dashboard_summary(
        &self,
        query: &DashboardQuery,
    ) -> Result<DashboardSummary, ClientError> {
        let request = OutboundRequest::get("/dashboard/").query(query.query_pairs());
        self.execute(request).await
    }
}
