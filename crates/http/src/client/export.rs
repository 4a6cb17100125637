//! CSV export

use super::error::ClientError;
use super::gateway::{AuthenticatedGateway, OutboundRequest};
use bytes::Bytes;
use reqwest::header::CONTENT_DISPOSITION;
use unidash_core::IdentityProvider;
use unidash_core::models::RecordFilter;

const DEFAULT_EXPORT_NAME: &str = "export.csv";

/// Downloaded CSV file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub bytes: Bytes,
}

impl<P: IdentityProvider> AuthenticatedGateway<P> {
    /// Export the records matching `filter` as CSV
    ///
    /// Ordering is not sent; the export endpoint ignores it.
    pub async fn export_csv(&self, filter: &RecordFilter) -> Result<CsvExport, ClientError> {
        let request = OutboundRequest::get("/data/export/").query(filter.export_pairs());
        let response = self.dispatch(request).await?;
        if !response.status().is_success() {
            return Err(ClientError::from_response(response).await);
        }

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(attachment_filename)
            .unwrap_or_else(|| DEFAULT_EXPORT_NAME.to_string());
        let bytes = response.bytes().await?;

        Ok(CsvExport { filename, bytes })
    }
}

/// `attachment; filename="data_2024.csv"` → `data_2024.csv`
fn attachment_filename(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}
