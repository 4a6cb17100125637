//! Spreadsheet upload

use super::error::{ClientError, error_message};
use super::gateway::{AuthenticatedGateway, FormField, OutboundRequest};
use reqwest::StatusCode;
use unidash_core::IdentityProvider;
use unidash_core::models::{Page, UploadDataType, UploadRecord, UploadResult};
use unidash_core::validation;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const XLS_MIME: &str = "application/vnd.ms-excel";

/// Spreadsheet selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    fn content_type(&self) -> &'static str {
        if self.file_name.to_ascii_lowercase().ends_with(".xls") {
            XLS_MIME
        } else {
            XLSX_MIME
        }
    }
}

impl<P: IdentityProvider> AuthenticatedGateway<P> {
    /// Upload a spreadsheet into the `data_type` dataset
    ///
    /// A rejection that still carries an upload result (status `failed`) is
    /// returned as `Ok` so callers can show the server's reason.
    pub async fn upload_spreadsheet(
        &self,
        file: UploadFile,
        data_type: UploadDataType,
    ) -> Result<UploadResult, ClientError> {
        validation::validate_upload_file(&file.file_name, file.bytes.len() as u64)?;

        let fields = vec![
            FormField::File {
                name: "file".to_string(),
                content_type: file.content_type().to_string(),
                file_name: file.file_name,
                bytes: file.bytes,
            },
            FormField::Text {
                name: "data_type".to_string(),
                value: data_type.to_string(),
            },
        ];
        let response = self
            .dispatch(OutboundRequest::post("/upload/upload/excel/").multipart(fields))
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::BAD_REQUEST {
            if let Ok(result) = serde_json::from_str::<UploadResult>(&body) {
                return Ok(result);
            }
        }
        Err(ClientError::from_status(status, error_message(status, &body)))
    }

    /// Past uploads, newest first
    pub async fn upload_history(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<UploadRecord>, ClientError> {
        let request = OutboundRequest::get("/upload/upload/history/").query([
            ("page".to_string(), page.to_string()),
            ("page_size".to_string(), page_size.to_string()),
        ]);
        self.execute(request).await
    }
}
