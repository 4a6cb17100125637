//! Unified data listing

use super::error::ClientError;
use super::gateway::{AuthenticatedGateway, OutboundRequest};
use unidash_core::IdentityProvider;
use unidash_core::models::{Page, RecordItem, RecordQuery, RecordType};

impl<P: IdentityProvider> AuthenticatedGateway<P> {
    /// List records matching `query`
    pub async fn list_records(&self, query: &RecordQuery) -> Result<Page<RecordItem>, ClientError> {
        let request = OutboundRequest::get("/data/").query(query.query_pairs());
        self.execute(request).await
    }

    /// Fetch one record by type and id
    pub async fn get_record(
        &self,
        record_type: RecordType,
        id: i64,
    ) -> Result<RecordItem, ClientError> {
        self.execute(OutboundRequest::get(format!("/data/{record_type}/{id}/")))
            .await
    }
}
